use crate::error::LoggerError;
use crate::level::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output value that redirects logging to the process's standard output.
pub const STDOUT_SENTINEL: &str = "stdout";

/// Where a logger writes besides the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OutputTarget {
    /// Standard output only; the logger owns no file.
    Stdout,
    /// Append-mode log file, mirrored to the console.
    File(PathBuf),
}

impl OutputTarget {
    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            OutputTarget::Stdout => None,
            OutputTarget::File(path) => Some(path),
        }
    }
}

impl From<&str> for OutputTarget {
    fn from(value: &str) -> Self {
        if value == STDOUT_SENTINEL {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(PathBuf::from(value))
        }
    }
}

impl From<String> for OutputTarget {
    fn from(value: String) -> Self {
        OutputTarget::from(value.as_str())
    }
}

impl From<PathBuf> for OutputTarget {
    fn from(value: PathBuf) -> Self {
        OutputTarget::File(value)
    }
}

impl From<&Path> for OutputTarget {
    fn from(value: &Path) -> Self {
        OutputTarget::File(value.to_path_buf())
    }
}

impl From<OutputTarget> for String {
    fn from(value: OutputTarget) -> Self {
        value.to_string()
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::Stdout => f.write_str(STDOUT_SENTINEL),
            OutputTarget::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Console rendering. The file sink always receives JSON lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogFormat {
    /// Human-readable, colourised.
    #[default]
    Text,
    /// JSON lines without colour.
    Json,
}

impl LogFormat {
    /// Only `"json"` selects JSON; every other value means text.
    pub fn parse_lenient(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }
}

impl FromStr for LogFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "plain" => Ok(LogFormat::Text),
            _ => Err(LoggerError::InvalidFormat {
                input: s.to_string(),
            }),
        }
    }
}

impl From<String> for LogFormat {
    fn from(value: String) -> Self {
        LogFormat::parse_lenient(&value)
    }
}

impl From<LogFormat> for String {
    fn from(value: LogFormat) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Log file path, or `"stdout"`
    pub output: OutputTarget,
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            output: OutputTarget::Stdout,
            level: LogLevel::Info,
            format: LogFormat::Text,
        }
    }
}

impl LoggerConfig {
    pub fn new(output: impl Into<OutputTarget>, level: LogLevel) -> Self {
        Self {
            output: output.into(),
            level,
            format: LogFormat::Text,
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Reads `LOG_OUTPUT`, `LOG_LEVEL` and `LOG_FORMAT`, falling back to the
    /// defaults for unset variables.
    pub fn from_env() -> Result<Self, LoggerError> {
        let output = env::var("LOG_OUTPUT").unwrap_or_else(|_| STDOUT_SENTINEL.to_string());
        let level = env::var("LOG_LEVEL")
            .map(|v| LogLevel::from_str(&v))
            .unwrap_or(Ok(LogLevel::Info))?;
        let format = env::var("LOG_FORMAT")
            .map(|v| LogFormat::parse_lenient(&v))
            .unwrap_or_default();

        let config = Self {
            output: OutputTarget::from(output),
            level,
            format,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, LoggerError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| LoggerError::Config(format!("Failed to parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LoggerError> {
        if let OutputTarget::File(path) = &self.output {
            if path.as_os_str().is_empty() {
                return Err(LoggerError::Config("Output path cannot be empty".into()));
            }
        }
        Ok(())
    }
}
