//! Runtime server and configuration.

mod config;
mod metrics;
mod server;

pub use config::{ConfigError, RuntimeConfig, ENV_PREFIX};
pub use metrics::init_metrics;
pub use server::{BoundServer, Router, Server, ServerError};
