//! Tag mutation service
//!
//! Applies add/remove tag edits through the tag backend and reports the
//! result per file. Successes are never rolled back when other files fail;
//! the controller re-resolves afterwards so the display follows the backend.

use crate::gateway::{Backend, BackendCommand, Bindings, CommandResult, CommandStatus, Payload};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Edit rejected before reaching the backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("No files specified")]
    NoFiles,
    #[error("No tags specified")]
    NoTags,
    #[error("Invalid tag name: '{0}'")]
    InvalidTag(String),
}

/// Direction of a tag edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagOp {
    Add,
    Remove,
}

impl TagOp {
    const fn command(self) -> BackendCommand {
        match self {
            Self::Add => BackendCommand::AddTags,
            Self::Remove => BackendCommand::RemoveTags,
        }
    }

    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Add => "Added",
            Self::Remove => "Removed",
        }
    }
}

impl fmt::Display for TagOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => f.write_str("add"),
            Self::Remove => f.write_str("remove"),
        }
    }
}

/// Summary of a mutation for presentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Success {
        affected_count: usize,
        details: String,
    },
    /// Some but not all files failed
    PartialFailure {
        succeeded: usize,
        failed: usize,
        errors: Vec<String>,
    },
    Failed(String),
}

/// Per-file results of one tag edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationReport {
    pub op: TagOp,
    pub tags: Vec<String>,
    pub results: Vec<(PathBuf, CommandResult)>,
}

impl MutationReport {
    #[must_use]
    pub fn succeeded(&self) -> Vec<&Path> {
        self.results
            .iter()
            .filter(|(_, r)| r.is_success())
            .map(|(p, _)| p.as_path())
            .collect()
    }

    #[must_use]
    pub fn failed(&self) -> Vec<(&Path, &CommandResult)> {
        self.results
            .iter()
            .filter(|(_, r)| !r.is_success())
            .map(|(p, r)| (p.as_path(), r))
            .collect()
    }

    /// Whether any file failed because the tool is not configured
    #[must_use]
    pub fn tool_missing(&self) -> bool {
        self.results
            .iter()
            .any(|(_, r)| r.status == CommandStatus::ToolMissing)
    }

    #[must_use]
    pub fn outcome(&self) -> MutationOutcome {
        let succeeded = self.succeeded().len();
        let errors: Vec<String> = self
            .failed()
            .into_iter()
            .map(|(path, result)| format!("{}: {}", path.display(), result.describe()))
            .collect();

        if errors.is_empty() {
            MutationOutcome::Success {
                affected_count: succeeded,
                details: format!("{} tags: {}", self.op.verb(), self.tags.join(", ")),
            }
        } else if succeeded > 0 {
            MutationOutcome::PartialFailure {
                succeeded,
                failed: errors.len(),
                errors,
            }
        } else {
            MutationOutcome::Failed(format!(
                "Failed to {} tags:\n{}",
                self.op,
                errors.join("\n")
            ))
        }
    }
}

/// Normalise user-entered tag names
///
/// Names are trimmed and interior whitespace becomes `_`. Duplicates are
/// dropped, keeping first occurrence order.
///
/// # Errors
///
/// Returns `MutationError::NoTags` for an empty list and
/// `MutationError::InvalidTag` for a name that is blank after trimming.
pub fn sanitize_tags(raw: &[String]) -> Result<Vec<String>, MutationError> {
    if raw.is_empty() {
        return Err(MutationError::NoTags);
    }

    let mut tags: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw {
        let clean = name.split_whitespace().collect::<Vec<_>>().join("_");
        if clean.is_empty() {
            return Err(MutationError::InvalidTag(name.clone()));
        }
        if !tags.contains(&clean) {
            tags.push(clean);
        }
    }
    Ok(tags)
}

/// Split free-form tag input on commas
#[must_use]
pub fn split_tag_input(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone)]
pub struct TagMutator {
    backend: Backend,
}

impl TagMutator {
    #[must_use]
    pub const fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// # Errors
    ///
    /// See [`TagMutator::apply`].
    pub fn add_tags(
        &self,
        paths: &[PathBuf],
        tags: &[String],
        cwd: &Path,
    ) -> Result<MutationReport, MutationError> {
        self.apply(TagOp::Add, paths, tags, cwd)
    }

    /// # Errors
    ///
    /// See [`TagMutator::apply`].
    pub fn remove_tags(
        &self,
        paths: &[PathBuf],
        tags: &[String],
        cwd: &Path,
    ) -> Result<MutationReport, MutationError> {
        self.apply(TagOp::Remove, paths, tags, cwd)
    }

    /// Apply `op` with one batched backend call
    ///
    /// When the call fails, files named in the backend's error output are
    /// marked failed and the rest succeeded; if no file is named, every file
    /// carries the failure.
    ///
    /// # Errors
    ///
    /// Returns `MutationError` when there are no files, no tags, or a tag
    /// name is blank. Backend failures are reported inside the report.
    pub fn apply(
        &self,
        op: TagOp,
        paths: &[PathBuf],
        tags: &[String],
        cwd: &Path,
    ) -> Result<MutationReport, MutationError> {
        if paths.is_empty() {
            return Err(MutationError::NoFiles);
        }
        let tags = sanitize_tags(tags)?;

        let bindings = Bindings::new().files(paths).tags(&tags);
        let result = self.backend.call_in(op.command(), &bindings, cwd);

        let results = if result.is_success() {
            info!(%op, tags = ?tags, files = paths.len(), "tags updated");
            paths.iter().map(|p| (p.clone(), result.clone())).collect()
        } else {
            warn!(%op, tags = ?tags, status = %result.status, "tag update failed");
            attribute_failure(paths, &result)
        };

        Ok(MutationReport { op, tags, results })
    }
}

fn attribute_failure(paths: &[PathBuf], result: &CommandResult) -> Vec<(PathBuf, CommandResult)> {
    let complaints: Vec<Vec<&str>> = paths
        .iter()
        .map(|p| {
            let path = p.to_string_lossy();
            result
                .stderr
                .lines()
                .filter(|line| names_path(line, &path))
                .collect()
        })
        .collect();

    if complaints.iter().all(Vec::is_empty) {
        return paths.iter().map(|p| (p.clone(), result.clone())).collect();
    }

    let ok = CommandResult {
        status: CommandStatus::Success,
        stdout: String::new(),
        stderr: String::new(),
        exit_code: result.exit_code,
        payload: Some(Payload::Empty),
        elapsed: result.elapsed,
    };

    paths
        .iter()
        .zip(complaints)
        .map(|(path, lines)| {
            let per_file = if lines.is_empty() {
                ok.clone()
            } else {
                let mut failure = result.clone();
                failure.stderr = lines.join("\n");
                failure
            };
            (path.clone(), per_file)
        })
        .collect()
}

/// Whether a backend error line names `path` as `<path>: <reason>`
///
/// The path must start the line or follow a space, and be followed by a
/// colon, so `/a.pdf` does not match a complaint about `/a.pdf.bak`.
fn names_path(line: &str, path: &str) -> bool {
    if path.is_empty() {
        return false;
    }
    line.match_indices(path).any(|(start, _)| {
        let before = &line[..start];
        let after = &line[start + path.len()..];
        (before.is_empty() || before.ends_with(' ')) && after.starts_with(':')
    })
}
