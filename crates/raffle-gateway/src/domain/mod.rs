//! Gateway domain: configuration and error mapping.

pub mod config;
pub mod error;

pub use config::{ConfigError, GatewayConfig};
pub use error::{ApiError, ApiResult, GatewayError};
