//! banter-utils: Common utilities for banter
//!
//! Unified error type, logging setup, and XDG path helpers shared by the
//! banter crates.

pub mod error;
pub mod logging;
pub mod paths;

pub use error::{BanterError, Result};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogOutput};
pub use paths::{config_dir, config_file, log_dir};
