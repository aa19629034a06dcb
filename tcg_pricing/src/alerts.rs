use std::{fmt::Display, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PricingError;

/// Which price moves a watch-list alert cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertDirection {
    Up,
    Down,
    #[default]
    Both,
}

impl Display for AlertDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
            Self::Both => write!(f, "both"),
        }
    }
}

impl FromStr for AlertDirection {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "both" => Ok(Self::Both),
            _ => Err(PricingError::UnknownDirection(s.to_string())),
        }
    }
}

impl TryFrom<String> for AlertDirection {
    type Error = PricingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Returns true if the move from `old_price` to `new_price` crosses `threshold_pct` percent in `direction`.
///
/// An unchanged price never triggers. Any rise from zero counts as infinite growth, so it triggers `Up` and `Both`
/// alerts but never `Down`. A move too large to represent as a percentage is treated the same way, in whichever
/// direction the price went.
pub fn evaluate_alert(
    old_price: Decimal,
    new_price: Decimal,
    threshold_pct: Decimal,
    direction: AlertDirection,
) -> bool {
    if old_price == new_price {
        return false;
    }
    let rising = new_price > old_price;
    if old_price.is_zero() {
        return unbounded_move(rising, direction);
    }
    let pct_change = new_price
        .checked_sub(old_price)
        .and_then(|diff| diff.checked_div(old_price))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED));
    let Some(pct_change) = pct_change else {
        return unbounded_move(rising, direction);
    };
    match direction {
        AlertDirection::Up => pct_change >= threshold_pct,
        AlertDirection::Down => pct_change <= -threshold_pct,
        AlertDirection::Both => pct_change.abs() >= threshold_pct,
    }
}

fn unbounded_move(rising: bool, direction: AlertDirection) -> bool {
    match direction {
        AlertDirection::Up => rising,
        AlertDirection::Down => !rising,
        AlertDirection::Both => true,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn rise_triggers_upward_alert_only() {
        assert!(evaluate_alert(d("10.00"), d("12.00"), d("15"), AlertDirection::Up));
        assert!(!evaluate_alert(d("10.00"), d("12.00"), d("15"), AlertDirection::Down));
        assert!(!evaluate_alert(d("10.00"), d("12.00"), d("25"), AlertDirection::Up));
    }

    #[test]
    fn both_triggers_on_a_drop() {
        assert!(evaluate_alert(d("10.00"), d("8.00"), d("15"), AlertDirection::Both));
        assert!(evaluate_alert(d("10.00"), d("8.00"), d("20"), AlertDirection::Down));
        assert!(!evaluate_alert(d("10.00"), d("8.00"), d("20"), AlertDirection::Up));
    }

    #[test]
    fn small_changes_do_not_trigger() {
        assert!(!evaluate_alert(d("10.00"), d("10.50"), d("10"), AlertDirection::Both));
    }

    #[test]
    fn zero_old_price() {
        assert!(evaluate_alert(d("0.00"), d("5.00"), d("10"), AlertDirection::Up));
        assert!(evaluate_alert(d("0.00"), d("5.00"), d("10"), AlertDirection::Both));
        assert!(!evaluate_alert(d("0.00"), d("5.00"), d("10"), AlertDirection::Down));
    }

    #[test]
    fn huge_moves_do_not_overflow() {
        assert!(evaluate_alert(d("0.01"), Decimal::MAX, d("10"), AlertDirection::Up));
        assert!(evaluate_alert(d("0.01"), Decimal::MAX, d("10"), AlertDirection::Both));
        assert!(!evaluate_alert(d("0.01"), Decimal::MAX, d("10"), AlertDirection::Down));
        assert!(evaluate_alert(Decimal::MAX, Decimal::MIN, d("10"), AlertDirection::Down));
        assert!(!evaluate_alert(Decimal::MAX, Decimal::MIN, d("10"), AlertDirection::Up));
    }

    #[test]
    fn equal_prices_never_trigger() {
        assert!(!evaluate_alert(d("10.00"), d("10.00"), d("5"), AlertDirection::Both));
        assert!(!evaluate_alert(d("0"), d("0.00"), d("0"), AlertDirection::Up));
    }

    #[test]
    fn direction_names() {
        assert_eq!("UP".parse::<AlertDirection>().unwrap(), AlertDirection::Up);
        assert_eq!(" both ".parse::<AlertDirection>().unwrap(), AlertDirection::Both);
        assert!("sideways".parse::<AlertDirection>().is_err());
        assert_eq!(AlertDirection::Down.to_string(), "down");
    }
}
