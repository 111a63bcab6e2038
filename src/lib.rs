#![warn(rust_2018_idioms)]
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned
)]
#![allow(
    clippy::missing_errors_doc, // Construction errors are documented on LoggerError
    clippy::module_name_repetitions
)]

//! Console + file logger factory on top of `tracing`.
//!
//! ```no_run
//! use rask_logger::{LogLevel, LoggerFactory};
//!
//! let logger = LoggerFactory::global().create("/var/log/rask/app.log", LogLevel::Info)?;
//! logger.info("started");
//! logger.close()?;
//! # Ok::<(), rask_logger::LoggerError>(())
//! ```

pub mod config;
pub mod error;
pub mod json;
pub mod level;
pub mod logger;
pub mod sink;
pub mod stack;
pub mod state;

pub use config::{LogFormat, LoggerConfig, OutputTarget};
pub use error::LoggerError;
pub use level::LogLevel;
pub use logger::{Logger, LoggerFactory};
pub use state::SharedLogState;
