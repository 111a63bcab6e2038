//! Shared helpers for logger integration tests
#![allow(dead_code)]

use rask_logger::LoggerFactory;
use serde_json::Value;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// In-memory console sink.
#[derive(Clone, Debug, Default)]
pub struct CapturedConsole {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> String {
        let buffer = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buffer).to_string()
    }

    pub fn lines(&self) -> Vec<String> {
        self.output().lines().map(str::to_string).collect()
    }
}

impl Write for CapturedConsole {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .map_err(|_| io::Error::other("Mutex poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedConsole {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Factory with a fresh shared state whose console output is captured
/// without colours.
pub fn captured_factory() -> (LoggerFactory, CapturedConsole) {
    let console = CapturedConsole::new();
    let factory = LoggerFactory::new()
        .with_console_writer(console.clone())
        .with_ansi(false);
    (factory, console)
}

/// Parses every line of a JSON-lines log file.
pub fn read_records(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).expect("log line is not JSON"))
        .collect()
}
