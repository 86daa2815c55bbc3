//! DIPTO Daemon library
//!
//! This module provides the pieces the `diptod` binary wires together:
//! - Configuration loading
//! - Backend construction and replica host lifecycle
//! - The REST API over the replica host
//! - Signal handling

pub mod api;
pub mod config;
pub mod error;
pub mod server;

pub use self::config::DaemonConfig;
pub use error::{ApiError, ApiResult, DaemonError, DaemonResult};
pub use server::Server;
