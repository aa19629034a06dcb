use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use tcg_pricing::AlertDirection;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The customer has submitted the decklist and no-one has started pulling it yet.
    Submitted,
    /// A staff member is pulling the cards.
    InProgress,
    /// The order has been pulled and is waiting for the customer to collect it.
    Ready,
    /// The customer has collected the order.
    PickedUp,
    /// The order was cancelled by staff or the customer.
    Cancelled,
}

impl OrderStatusType {
    /// Statuses that still need staff attention, in the order of the happy path.
    pub const ACTIVE: [OrderStatusType; 3] = [Self::Submitted, Self::InProgress, Self::Ready];

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PickedUp | Self::Cancelled)
    }

    /// Any non-terminal order may move to any other status. Terminal orders never change.
    pub fn can_transition_to(&self, new_status: OrderStatusType) -> bool {
        !self.is_terminal() && *self != new_status
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submitted => write!(f, "submitted"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Ready => write!(f, "ready"),
            Self::PickedUp => write!(f, "picked_up"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "submitted" => Ok(Self::Submitted),
            "in_progress" => Ok(Self::InProgress),
            "ready" => Ok(Self::Ready),
            "picked_up" => Ok(Self::PickedUp),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------     OrderNumber       ---------------------------------------------------------
/// The human-readable order reference given to customers, e.g. `LP-240517-7K3Q`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

/// No 0/O or 1/I, so numbers read out over the counter are unambiguous.
const ORDER_NUMBER_ALPHABET: [char; 32] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y',
    'Z', '2', '3', '4', '5', '6', '7', '8', '9',
];
const ORDER_NUMBER_SUFFIX_LEN: usize = 4;

impl OrderNumber {
    pub fn generate(now: DateTime<Utc>) -> Self {
        let mut rng = rand::thread_rng();
        let suffix = (0..ORDER_NUMBER_SUFFIX_LEN)
            .map(|_| ORDER_NUMBER_ALPHABET[rng.gen_range(0..ORDER_NUMBER_ALPHABET.len())])
            .collect::<String>();
        Self(format!("LP-{}-{suffix}", now.format("%y%m%d")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderNumber {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConversionError("Order number cannot be empty".to_string()));
        }
        Ok(Self(s.to_ascii_uppercase()))
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    /// The game the decklist is for, e.g. "Magic: The Gathering"
    pub game: String,
    pub notes: Option<String>,
    pub status: OrderStatusType,
    /// Set once the stale-order alert has been posted for the current stall episode.
    pub stale_alert_sent: bool,
    /// Set once the uncollected-pickup alert has been posted for the current stall episode.
    pub pickup_alert_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub game: String,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
    /// When the order was placed. The order flow stamps the current time if this is left empty.
    pub created_at: Option<DateTime<Utc>>,
}

impl NewOrder {
    pub fn new<S: Into<String>>(customer_name: S, customer_email: S, game: S) -> Self {
        Self {
            customer_name: customer_name.into(),
            customer_email: customer_email.into(),
            customer_phone: None,
            game: game.into(),
            notes: None,
            items: Vec::new(),
            created_at: None,
        }
    }

    pub fn with_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.customer_phone = Some(phone.into());
        self
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_items(mut self, items: Vec<NewOrderItem>) -> Self {
        self.items = items;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

//--------------------------------------      OrderItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub quantity: i64,
    pub card_name: String,
    pub set_code: Option<String>,
    pub collector_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub quantity: i64,
    pub card_name: String,
    pub set_code: Option<String>,
    pub collector_number: Option<String>,
}

impl NewOrderItem {
    pub fn new<S: Into<String>>(quantity: i64, card_name: S) -> Self {
        Self { quantity, card_name: card_name.into(), set_code: None, collector_number: None }
    }
}

//--------------------------------------    EmailTemplate     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplate {
    /// Sent when an order is submitted.
    Confirmation,
    /// Sent when an order is ready for pickup.
    Ready,
}

impl Display for EmailTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirmation => write!(f, "confirmation"),
            Self::Ready => write!(f, "ready"),
        }
    }
}

impl FromStr for EmailTemplate {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmation" => Ok(Self::Confirmation),
            "ready" => Ok(Self::Ready),
            s => Err(ConversionError(format!("Invalid email template: {s}"))),
        }
    }
}

//--------------------------------------     EmailStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    Pending,
    Sent,
    Failed,
}

impl Display for EmailStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Sent => write!(f, "sent"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for EmailStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid email status: {s}"))),
        }
    }
}

//--------------------------------------       EmailJob       ---------------------------------------------------------
/// A row in the email queue.
///
/// The `order_id` is a weak reference: jobs are not deleted with their order, and a job whose order has gone missing
/// simply fails delivery until it runs out of attempts.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct EmailJob {
    pub id: i64,
    pub order_id: i64,
    pub recipient: String,
    pub template: EmailTemplate,
    pub status: EmailStatus,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmailJob {
    pub order_id: i64,
    pub recipient: String,
    pub template: EmailTemplate,
    pub created_at: DateTime<Utc>,
}

impl NewEmailJob {
    pub fn new<S: Into<String>>(order_id: i64, recipient: S, template: EmailTemplate) -> Self {
        Self { order_id, recipient: recipient.into(), template, created_at: Utc::now() }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

//--------------------------------------      StaffUser       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Admin,
    Staff,
}

impl Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Staff => write!(f, "staff"),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StaffUser {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: StaffRole,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
}

impl StaffUser {
    pub fn identity(&self) -> StaffIdentity {
        StaffIdentity { id: self.id, role: self.role }
    }
}

/// The slice of a staff account that the order flow cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffIdentity {
    pub id: i64,
    pub role: StaffRole,
}

//--------------------------------------      AuditActor      ---------------------------------------------------------
/// Who made a change to an order, as recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditActor {
    Staff(StaffIdentity),
    System,
}

impl Display for AuditActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Staff(s) => write!(f, "staff:{}", s.id),
            Self::System => write!(f, "system"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub order_id: i64,
    pub actor: String,
    pub old_status: OrderStatusType,
    pub new_status: OrderStatusType,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        Cents         ---------------------------------------------------------
fn to_hundredths(value: Decimal) -> Result<i64, ConversionError> {
    value
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|v| v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero).to_i64())
        .ok_or_else(|| ConversionError(format!("{value} is out of range")))
}

/// A price in whole cents. Prices are stored as integers so that SQLite never rounds them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Cents(pub i64);

impl Cents {
    pub fn from_decimal(value: Decimal) -> Result<Self, ConversionError> {
        to_hundredths(value).map(Self)
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.to_decimal())
    }
}

/// Hundredths of a percent. `1250` is 12.5%.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct BasisPoints(pub i64);

impl BasisPoints {
    pub fn from_percent(pct: Decimal) -> Result<Self, ConversionError> {
        to_hundredths(pct).map(Self)
    }

    pub fn to_percent(self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl Display for BasisPoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.to_percent())
    }
}

//--------------------------------------    Price tracking    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub product_id: i64,
    pub category_id: i64,
    pub name: String,
    pub clean_name: String,
    pub image_url: Option<String>,
    pub number: Option<String>,
    pub rarity: Option<String>,
    pub product_type: String,
}

/// The latest market data for one variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CurrentPrice {
    pub product_id: i64,
    pub variant: String,
    pub market_price: Option<Cents>,
    pub low_price: Option<Cents>,
    pub mid_price: Option<Cents>,
    pub direct_low: Option<Cents>,
    pub updated_at: DateTime<Utc>,
    pub source: String,
}

/// The market price of a variant on one day.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    pub id: i64,
    pub product_id: i64,
    pub variant: String,
    pub date: NaiveDate,
    pub market_price: Option<Cents>,
    pub low_price: Option<Cents>,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct WatchlistItem {
    pub id: i64,
    pub product_id: i64,
    pub variant: String,
    pub notes: Option<String>,
    pub added_at: DateTime<Utc>,
    /// Removing an item from the watch list clears this flag. Its alerts stop firing but are kept.
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PriceAlert {
    pub id: i64,
    pub watchlist_id: i64,
    pub threshold_bps: BasisPoints,
    pub time_window: String,
    #[sqlx(try_from = "String")]
    pub direction: AlertDirection,
    /// Set the first time the alert fires. An alert never fires twice.
    pub triggered_at: Option<DateTime<Utc>>,
    pub acknowledged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPriceAlert {
    pub watchlist_id: i64,
    pub threshold: BasisPoints,
    pub time_window: String,
    pub direction: AlertDirection,
}

impl NewPriceAlert {
    pub fn new(watchlist_id: i64, threshold: BasisPoints, direction: AlertDirection) -> Self {
        Self { watchlist_id, threshold, time_window: "24h".to_string(), direction }
    }

    pub fn with_time_window<S: Into<String>>(mut self, time_window: S) -> Self {
        self.time_window = time_window.into();
        self
    }
}

/// A price alert together with the product variant it watches.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct WatchedAlert {
    #[sqlx(flatten)]
    pub alert: PriceAlert,
    pub product_id: i64,
    pub variant: String,
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            OrderStatusType::Submitted,
            OrderStatusType::InProgress,
            OrderStatusType::Ready,
            OrderStatusType::PickedUp,
            OrderStatusType::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<OrderStatusType>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatusType>().is_err());
    }

    #[test]
    fn terminal_statuses_cannot_change() {
        use OrderStatusType::*;
        assert!(Submitted.can_transition_to(InProgress));
        assert!(Submitted.can_transition_to(Cancelled));
        assert!(Ready.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Cancelled));
        assert!(!Submitted.can_transition_to(Submitted));
        assert!(!PickedUp.can_transition_to(Ready));
        assert!(!Cancelled.can_transition_to(Submitted));
    }

    #[test]
    fn generated_order_numbers_have_the_expected_shape() {
        let now = Utc.with_ymd_and_hms(2024, 5, 17, 10, 0, 0).unwrap();
        let number = OrderNumber::generate(now);
        assert!(number.as_str().starts_with("LP-240517-"));
        let suffix = number.as_str().trim_start_matches("LP-240517-");
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| ORDER_NUMBER_ALPHABET.contains(&c)));
    }

    #[test]
    fn cents_and_basis_points() {
        let price = Decimal::from_str("12.505").unwrap();
        assert_eq!(Cents::from_decimal(price).unwrap(), Cents(1251));
        assert_eq!(Cents(1250).to_decimal().to_string(), "12.50");
        assert_eq!(Cents(99).to_string(), "$0.99");
        assert!(Cents::from_decimal(Decimal::MAX).is_err());
        let pct = BasisPoints::from_percent(Decimal::from_str("12.5").unwrap()).unwrap();
        assert_eq!(pct, BasisPoints(1250));
        assert_eq!(pct.to_string(), "12.50%");
    }

    #[test]
    fn audit_actor_labels() {
        let actor = AuditActor::Staff(StaffIdentity { id: 7, role: StaffRole::Admin });
        assert_eq!(actor.to_string(), "staff:7");
        assert_eq!(AuditActor::System.to_string(), "system");
    }
}
