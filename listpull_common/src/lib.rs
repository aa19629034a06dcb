//! Small building blocks shared by every ListPull crate: a [`Secret`] wrapper that keeps credentials out of logs,
//! and helpers for reading typed configuration values out of the environment.
mod env_helpers;
mod secret;

pub use env_helpers::{env_or_default, parse_boolean_flag, parse_env_value, EnvParseError};
pub use secret::Secret;
