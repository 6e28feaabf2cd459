//! Tracing setup
//!
//! Events go to an append-mode log file (stdout belongs to the terminal
//! interface) and to an in-memory [`LogBuffer`] that backs the debug-log
//! panel. Headless commands additionally print warnings to stderr.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "tagpane=info";
const VERBOSE_LOG_FILTER: &str = "tagpane=debug";

/// Lines kept for the debug-log panel
pub const LOG_BUFFER_LINES: usize = 500;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Could not determine data directory")]
    NoDataDir,
    #[error("Failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to install log subscriber: {0}")]
    Init(String),
}

/// Logging options
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub verbose: bool,
    /// Suppress the stderr layer while the terminal interface owns the screen
    pub tui_mode: bool,
    /// Log file; defaults to [`default_log_path`]
    pub file: Option<PathBuf>,
}

/// `<data dir>/tagpane/tagpane.log`
///
/// # Errors
///
/// Returns `LoggingError::NoDataDir` if the platform data directory is unknown.
pub fn default_log_path() -> Result<PathBuf, LoggingError> {
    dirs::data_local_dir()
        .map(|dir| dir.join("tagpane").join("tagpane.log"))
        .ok_or(LoggingError::NoDataDir)
}

/// Install the global subscriber and return the debug-panel buffer
///
/// `RUST_LOG` overrides the default filter.
///
/// # Errors
///
/// Returns `LoggingError` if the log file cannot be opened or a global
/// subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<LogBuffer, LoggingError> {
    let path = match &config.file {
        Some(path) => path.clone(),
        None => default_log_path()?,
    };
    let file = SharedFile::open(&path)?;
    let buffer = LogBuffer::new(LOG_BUFFER_LINES);

    let console = (!config.tui_mode).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_filter(EnvFilter::new(if config.verbose {
                VERBOSE_LOG_FILTER
            } else {
                "warn"
            }))
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_filter(log_filter(config.verbose)),
        )
        .with(buffer_layer(&buffer, config.verbose))
        .with(console)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(buffer)
}

/// Install a subscriber that feeds only the debug-panel buffer
///
/// Used when the log file cannot be opened. If a global subscriber is
/// already installed the returned buffer stays empty.
pub fn init_buffer_only(verbose: bool) -> LogBuffer {
    let buffer = LogBuffer::new(LOG_BUFFER_LINES);
    let _ = tracing_subscriber::registry()
        .with(buffer_layer(&buffer, verbose))
        .try_init();
    buffer
}

fn log_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            VERBOSE_LOG_FILTER
        } else {
            DEFAULT_LOG_FILTER
        })
    })
}

fn buffer_layer<S>(buffer: &LogBuffer, verbose: bool) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .with_filter(log_filter(verbose))
}

#[derive(Clone)]
struct SharedFile {
    inner: Arc<Mutex<File>>,
}

impl SharedFile {
    fn open(path: &Path) -> Result<Self, LoggingError> {
        let open = || -> io::Result<File> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            OpenOptions::new().create(true).append(true).open(path)
        };
        let file = open().map_err(|source| LoggingError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            inner: Arc::new(Mutex::new(file)),
        })
    }
}

struct SharedFileGuard {
    inner: Arc<Mutex<File>>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedFile {
    type Writer = SharedFileGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedFileGuard {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Write for SharedFileGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }
}

/// Bounded buffer of recent log lines
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl LogBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, line: impl Into<String>) {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line.into());
    }

    /// Copy of the buffered lines, oldest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collects one formatted event and pushes its lines on drop
pub struct LogBufferWriter {
    buffer: LogBuffer,
    pending: Vec<u8>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
    type Writer = LogBufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogBufferWriter {
            buffer: self.clone(),
            pending: Vec::new(),
        }
    }
}

impl Write for LogBufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            self.buffer.push(line);
        }
        Ok(())
    }
}

impl Drop for LogBufferWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::fmt::MakeWriter;

    #[test]
    fn test_buffer_is_bounded() {
        let buffer = LogBuffer::new(3);
        for i in 0..5 {
            buffer.push(format!("line {i}"));
        }
        assert_eq!(buffer.snapshot(), vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_writer_splits_lines_on_drop() {
        let buffer = LogBuffer::new(10);
        {
            let mut writer = buffer.make_writer();
            writer.write_all(b"first\nsec").unwrap();
            writer.write_all(b"ond\n\n").unwrap();
            assert!(buffer.is_empty());
        }
        assert_eq!(buffer.snapshot(), vec!["first", "second"]);
    }

    #[test]
    fn test_buffer_layer_captures_events() {
        let buffer = LogBuffer::new(10);
        let subscriber = tracing_subscriber::registry().with(buffer_layer(&buffer, false));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "tagpane::gateway", "tool discovered");
            tracing::debug!(target: "tagpane::gateway", "spawn details");
        });

        let lines = buffer.snapshot();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("tool discovered"));
    }

    #[test]
    fn test_shared_file_appends() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logs").join("tagpane.log");
        let file = SharedFile::open(&path).unwrap();
        file.make_writer().write_all(b"hello\n").unwrap();
        let again = SharedFile::open(&path).unwrap();
        again.make_writer().write_all(b"world\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\nworld\n");
    }
}
