//! Shared utilities: logging setup, environment overrides, validation helpers

pub mod env;
pub mod logging;
pub mod validation;

pub use env::{env_int, env_opt};
#[cfg(feature = "json-logging")]
pub use logging::init_json_logging;
pub use logging::{init_logging, init_logging_from_config};
pub use validation::{ensure_fmt, ensure_not_blank, ensure_range};
