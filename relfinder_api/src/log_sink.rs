//! Append-only, timestamped attempt log.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};

/// Cloneable handle to a text destination for the verbose attempt log.
///
/// A disabled sink drops every line, which is how non-verbose runs are
/// configured.
#[derive(Clone, Default)]
pub struct LogSink {
    writer: Option<Arc<Mutex<Box<dyn Write + Send>>>>,
}

impl LogSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Some(Arc::new(Mutex::new(Box::new(writer)))),
        }
    }

    pub fn disabled() -> Self {
        Self { writer: None }
    }

    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Appends `[YYYY-MM-DD HH:MM:SS]: message` and flushes.
    pub fn record(&self, at: DateTime<Local>, message: &str) {
        let Some(writer) = &self.writer else {
            return;
        };
        let mut writer = writer.lock().unwrap_or_else(|e| e.into_inner());
        let line = format!("[{}]: {}\n", at.format("%Y-%m-%d %H:%M:%S"), message);
        let written = writer.write_all(line.as_bytes());
        if let Err(e) = written.and_then(|_| writer.flush()) {
            tracing::warn!("Failed to write to log sink: {}", e);
        }
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
