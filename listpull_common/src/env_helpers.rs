use std::{env, fmt::Display, str::FromStr};

use log::*;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum EnvParseError {
    #[error("{0} is not set")]
    NotSet(String),
    #[error("Invalid value for {name}: {value}. {reason}")]
    InvalidValue { name: String, value: String, reason: String },
}

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Reads `name` from the environment and parses it into `T`.
pub fn parse_env_value<T>(name: &str) -> Result<T, EnvParseError>
where
    T: FromStr,
    T::Err: Display,
{
    let value = env::var(name).map_err(|_| EnvParseError::NotSet(name.to_string()))?;
    value.trim().parse::<T>().map_err(|e| EnvParseError::InvalidValue {
        name: name.to_string(),
        value: value.clone(),
        reason: e.to_string(),
    })
}

/// Reads and parses `name` from the environment, logging and falling back to `default` if it is missing or invalid.
pub fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match parse_env_value::<T>(name) {
        Ok(v) => v,
        Err(EnvParseError::NotSet(_)) => {
            info!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
        Err(e) => {
            warn!("🪛️ {e} Using the default value of {default} instead.");
            default
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn boolean_flags() {
        assert!(parse_boolean_flag(Some("yes".into()), false));
        assert!(parse_boolean_flag(Some(" TRUE ".into()), false));
        assert!(!parse_boolean_flag(Some("0".into()), true));
        assert!(parse_boolean_flag(Some("maybe".into()), true));
        assert!(!parse_boolean_flag(None, false));
    }

    #[test]
    fn env_values_fall_back_to_defaults() {
        env::set_var("LP_TEST_ENV_HELPER_HOUR", "17");
        assert_eq!(env_or_default::<u32>("LP_TEST_ENV_HELPER_HOUR", 9), 17);
        env::set_var("LP_TEST_ENV_HELPER_BAD", "seventeen");
        assert_eq!(env_or_default::<u32>("LP_TEST_ENV_HELPER_BAD", 9), 9);
        assert_eq!(env_or_default::<u32>("LP_TEST_ENV_HELPER_MISSING", 9), 9);
        assert!(matches!(parse_env_value::<u32>("LP_TEST_ENV_HELPER_MISSING"), Err(EnvParseError::NotSet(_))));
    }
}
