//! Outcome values for external command invocations
//!
//! Every call through the gateway produces a [`CommandResult`]. Failures are
//! carried in [`CommandStatus`] instead of being raised, so callers always
//! receive a value they can inspect, annotate, and render.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Classification of a gateway invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandStatus {
    /// The command ran and its output was understood
    Success,
    /// No executable is configured for the tool, or it could not be launched
    ToolMissing,
    /// The command exited non-zero and the exit policy did not accept it
    NonzeroExit,
    /// The command ran longer than its timeout and was killed
    Timeout,
    /// The command succeeded but its output did not match the expected shape
    ParseError,
}

impl CommandStatus {
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Short machine-style name, used in logs and diagnostics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ToolMissing => "tool_missing",
            Self::NonzeroExit => "nonzero_exit",
            Self::Timeout => "timeout",
            Self::ParseError => "parse_error",
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed form of a command's standard output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Nothing to parse (mutations, or an accepted empty result)
    Empty,
    /// One trimmed, non-empty entry per output line
    Lines(Vec<String>),
    /// Tags per file, in output order
    FileTags(Vec<(PathBuf, Vec<String>)>),
    /// Ordered key/value pairs
    Pairs(Vec<(String, String)>),
}

impl Payload {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Lines(lines) => lines.is_empty(),
            Self::FileTags(entries) => entries.is_empty(),
            Self::Pairs(pairs) => pairs.is_empty(),
        }
    }
}

/// Result of one gateway invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub status: CommandStatus,
    /// Raw standard output (lossily decoded)
    pub stdout: String,
    /// Raw standard error (lossily decoded)
    pub stderr: String,
    /// Process exit code, when the process exited on its own
    pub exit_code: Option<i32>,
    /// Parsed output; present only on success
    pub payload: Option<Payload>,
    /// Wall-clock time spent, zero when nothing was spawned
    pub elapsed: Duration,
}

impl CommandResult {
    /// A successful result carrying a parsed payload
    #[must_use]
    pub fn success(payload: Payload) -> Self {
        Self {
            status: CommandStatus::Success,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(0),
            payload: Some(payload),
            elapsed: Duration::ZERO,
        }
    }

    /// A failed result with the given status and diagnostic text on stderr
    #[must_use]
    pub fn failure(status: CommandStatus, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: None,
            payload: None,
            elapsed: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn tool_missing(tool: impl fmt::Display) -> Self {
        Self::failure(
            CommandStatus::ToolMissing,
            format!("{tool} is not configured"),
        )
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Parsed lines, or an empty slice for any other payload
    #[must_use]
    pub fn lines(&self) -> &[String] {
        match &self.payload {
            Some(Payload::Lines(lines)) => lines,
            _ => &[],
        }
    }

    /// Parsed file/tag entries, or an empty slice for any other payload
    #[must_use]
    pub fn file_tags(&self) -> &[(PathBuf, Vec<String>)] {
        match &self.payload {
            Some(Payload::FileTags(entries)) => entries,
            _ => &[],
        }
    }

    /// Parsed key/value pairs, or an empty slice for any other payload
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        match &self.payload {
            Some(Payload::Pairs(pairs)) => pairs,
            _ => &[],
        }
    }

    /// One-line human readable summary for status bars and logs
    #[must_use]
    pub fn describe(&self) -> String {
        let detail = self
            .stderr
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default();

        match (self.status, self.exit_code) {
            (CommandStatus::Success, _) => "ok".to_string(),
            (CommandStatus::NonzeroExit, Some(code)) if detail.is_empty() => {
                format!("exited with status {code}")
            }
            (CommandStatus::NonzeroExit, Some(code)) => {
                format!("exited with status {code}: {detail}")
            }
            (CommandStatus::Timeout, _) => {
                format!("timed out after {:.1}s", self.elapsed.as_secs_f64())
            }
            (status, _) if detail.is_empty() => status.to_string(),
            (status, _) => format!("{status}: {detail}"),
        }
    }
}
