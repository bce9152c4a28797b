//! Logger bootstrap.
//!
//! The library only speaks the `log` facade. Hosts that embed the C ABI call
//! `afferent_init_logging` once to get the `env_logger` backend.

mod init;

pub use init::{init_logging, LoggingConfig, LOG_ENV};
