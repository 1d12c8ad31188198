//! Configuration utilities.

/// `taskgate.toml` loading and validation.
pub mod toml_config;
