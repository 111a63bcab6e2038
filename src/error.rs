use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Failed to create log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open log file {}: {source}", path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to close log file {}: {source}", path.display())]
    Close {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid log level '{input}'. Valid levels: {valid_levels:?}")]
    InvalidLogLevel {
        input: String,
        valid_levels: Vec<String>,
    },

    #[error("Invalid log format '{input}'. Expected 'json' or 'text'")]
    InvalidFormat { input: String },

    #[error("Invalid logger configuration: {0}")]
    Config(String),
}

impl LoggerError {
    /// Filesystem failures during construction. Everything else is a caller
    /// mistake in configuration.
    pub fn is_file_error(&self) -> bool {
        matches!(
            self,
            LoggerError::CreateDir { .. } | LoggerError::OpenFile { .. } | LoggerError::Close { .. }
        )
    }
}
