//! Logger factory and the facade it hands out.
//!
//! Every [`Logger`] owns its own `tracing` dispatcher: a console layer, a
//! JSON-lines file layer when the output is a file, and a level gate. The
//! gate admits a record only when its level passes both the logger's own
//! minimum and the minimum held in the factory's [`SharedLogState`].

use crate::config::{LogFormat, LoggerConfig, OutputTarget};
use crate::error::LoggerError;
use crate::json::JsonLines;
use crate::level::LogLevel;
use crate::sink::FileSink;
use crate::stack::{ErrorChain, capture_stack};
use crate::state::SharedLogState;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::subscriber::Interest;
use tracing::{Dispatch, Metadata, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::{Layer, Registry, fmt as tracing_fmt, prelude::*};

type ConsoleWriter = Arc<dyn Fn() -> BoxMakeWriter + Send + Sync>;

/// Builds [`Logger`]s that share one [`SharedLogState`].
#[derive(Clone)]
pub struct LoggerFactory {
    state: Arc<SharedLogState>,
    console: ConsoleWriter,
    ansi: bool,
}

impl LoggerFactory {
    pub fn new() -> Self {
        Self::with_state(Arc::new(SharedLogState::default()))
    }

    pub fn with_state(state: Arc<SharedLogState>) -> Self {
        Self {
            state,
            console: Arc::new(|| BoxMakeWriter::new(std::io::stdout)),
            ansi: true,
        }
    }

    /// Process-wide factory. Loggers created through it all share one
    /// minimum severity.
    pub fn global() -> &'static LoggerFactory {
        static GLOBAL: OnceLock<LoggerFactory> = OnceLock::new();
        GLOBAL.get_or_init(LoggerFactory::new)
    }

    /// Replaces the console sink (stdout by default).
    pub fn with_console_writer<W>(mut self, writer: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Clone + Send + Sync + 'static,
    {
        self.console = Arc::new(move || BoxMakeWriter::new(writer.clone()));
        self
    }

    /// Colourised text console output. JSON console output is never coloured.
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    pub fn state(&self) -> &Arc<SharedLogState> {
        &self.state
    }

    /// Logger writing text to the console and JSON lines to `output`.
    pub fn create(
        &self,
        output: impl Into<OutputTarget>,
        level: LogLevel,
    ) -> Result<Logger, LoggerError> {
        self.build(output.into(), level, LogFormat::Text)
    }

    pub fn create_with_config(&self, config: &LoggerConfig) -> Result<Logger, LoggerError> {
        config.validate()?;
        self.build(config.output.clone(), config.level, config.format)
    }

    fn build(
        &self,
        output: OutputTarget,
        level: LogLevel,
        format: LogFormat,
    ) -> Result<Logger, LoggerError> {
        let file = match &output {
            OutputTarget::Stdout => None,
            OutputTarget::File(path) => Some(FileSink::open(path)?),
        };

        self.state.set_min_level(level);
        self.state.set_capture_stacks(true);

        let instance_level = Arc::new(AtomicU8::new(level.as_u8()));
        let dispatch = self.dispatch(instance_level.clone(), format, file.as_ref());

        tracing::debug!(
            output = %output,
            level = %level,
            format = format.as_str(),
            "Logger created"
        );

        Ok(Logger {
            dispatch,
            level: instance_level,
            state: self.state.clone(),
            file,
            output,
            format,
            closed: AtomicBool::new(false),
        })
    }

    fn dispatch(
        &self,
        instance_level: Arc<AtomicU8>,
        format: LogFormat,
        file: Option<&FileSink>,
    ) -> Dispatch {
        let console: Box<dyn Layer<Registry> + Send + Sync> = match format {
            LogFormat::Text => tracing_fmt::layer()
                .with_writer((self.console)())
                .with_ansi(self.ansi)
                .with_target(false)
                .with_timer(ChronoUtc::rfc_3339())
                .boxed(),
            LogFormat::Json => tracing_fmt::layer()
                .event_format(JsonLines)
                .with_writer((self.console)())
                .with_ansi(false)
                .boxed(),
        };

        let file_layer = file.map(|sink| {
            tracing_fmt::layer()
                .event_format(JsonLines)
                .with_writer(sink.clone())
                .with_ansi(false)
        });

        let gate = LevelGate {
            state: self.state.clone(),
            instance_level,
        };

        let subscriber = tracing_subscriber::registry()
            .with(console)
            .with(file_layer)
            .with(gate);

        Dispatch::new(subscriber)
    }
}

/// Admits a record only when it passes both the shared and the instance
/// minimum. Both can change after construction, so no callsite is ever
/// cached as always or never enabled.
struct LevelGate {
    state: Arc<SharedLogState>,
    instance_level: Arc<AtomicU8>,
}

impl<S: Subscriber> Layer<S> for LevelGate {
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        let record = LogLevel::from_tracing(metadata.level());
        self.state.allows(record)
            && record >= LogLevel::from_ordinal(self.instance_level.load(Ordering::Acquire))
    }
}

impl Default for LoggerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoggerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerFactory")
            .field("state", &self.state)
            .field("ansi", &self.ansi)
            .finish_non_exhaustive()
    }
}

/// Live logging handle. Owns the log file, if any, until [`Logger::close`].
///
/// Logging never fails from the caller's point of view. After `close()` the
/// file no longer receives records; console output continues.
pub struct Logger {
    dispatch: Dispatch,
    level: Arc<AtomicU8>,
    state: Arc<SharedLogState>,
    file: Option<FileSink>,
    output: OutputTarget,
    format: LogFormat,
    closed: AtomicBool,
}

impl Logger {
    pub fn output(&self) -> &OutputTarget {
        &self.output
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// This logger's own minimum severity.
    pub fn level(&self) -> LogLevel {
        LogLevel::from_ordinal(self.level.load(Ordering::Acquire))
    }

    /// Sets the minimum severity of this logger AND of every other logger
    /// sharing its factory state.
    pub fn set_level(&self, level: LogLevel) {
        self.state.set_min_level(level);
        self.level.store(level.as_u8(), Ordering::Release);
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        self.state.allows(level) && level >= self.level()
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => self.emit(|| tracing::debug!("{message}")),
            LogLevel::Info => self.emit(|| tracing::info!("{message}")),
            LogLevel::Warning => self.emit(|| tracing::warn!("{message}")),
            LogLevel::Error => match self.stack() {
                Some(stack) => self.emit(|| tracing::error!(stack = %stack, "{message}")),
                None => self.emit(|| tracing::error!("{message}")),
            },
        }
    }

    /// Emits one INFO record carrying every pair. JSON sinks write each pair
    /// as its own top-level key; a key already used by the record (such as
    /// `level` or `message`) stays nested under `data`. Values that fail to
    /// serialize are replaced by a description of the failure.
    pub fn log_structured_data<I, K, V>(&self, data: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize,
    {
        if !self.enabled(LogLevel::Info) {
            return;
        }

        let fields: Map<String, Value> = data
            .into_iter()
            .map(|(key, value)| {
                let value = serde_json::to_value(value)
                    .unwrap_or_else(|e| Value::String(format!("<unserializable: {e}>")));
                (key.into(), value)
            })
            .collect();
        let data = Value::Object(fields);

        self.emit(|| tracing::info!(data = %data, "Structured data"));
    }

    /// Emits one ERROR record with the error, its source chain and, while
    /// stack capture is enabled, the call stack at this point.
    pub fn log_error_with_stack(&self, err: &dyn Error) {
        if !self.enabled(LogLevel::Error) {
            return;
        }

        let error = ErrorChain(err);
        match self.stack() {
            Some(stack) => self.emit(|| {
                tracing::error!(error = %error, stack = %stack, "An error occurred");
            }),
            None => self.emit(|| tracing::error!(error = %error, "An error occurred")),
        }
    }

    /// Releases the log file. Stdout loggers own nothing and return `Ok`.
    /// A second call is a no-op.
    pub fn close(&self) -> Result<(), LoggerError> {
        self.closed.store(true, Ordering::Release);
        let Some(file) = &self.file else {
            return Ok(());
        };

        file.close().inspect_err(|e| {
            tracing::warn!(path = %file.path().display(), error = %e, "Failed to close log file");
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn stack(&self) -> Option<String> {
        (self.enabled(LogLevel::Error) && self.state.capture_stacks()).then(capture_stack)
    }

    fn emit(&self, f: impl FnOnce()) {
        tracing::dispatcher::with_default(&self.dispatch, f);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("output", &self.output)
            .field("format", &self.format)
            .field("level", &self.level())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
