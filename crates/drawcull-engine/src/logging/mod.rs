//! Logging setup over the `log` facade with an `env_logger` backend.

mod init;

pub use init::{init_logging, LoggingConfig};
