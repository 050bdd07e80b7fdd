//! Logging utilities.
//!
//! The crate logs through the `log` facade only; this module wires the
//! `env_logger` backend for binaries and tests that want output.

mod init;

pub use init::{DEFAULT_FILTER, LoggingConfig, init_logging};
