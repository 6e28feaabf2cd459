//! Tag query resolver
//!
//! Turns a [`NavigationNode`] into an ordered list of [`FileRecord`]s.
//! Directories are listed from the filesystem; queries are evaluated by the
//! tag backend. Either way, current tags are fetched in batched calls rather
//! than one call per file.

use super::models::{FileRecord, NavigationNode, QueryExpression, TagSet};
use crate::gateway::{Backend, BackendCommand, Bindings, CommandResult, CommandStatus};
use chrono::{DateTime, Local};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Files per tag-listing invocation, keeping argv well under system limits
const FILE_TAGS_BATCH: usize = 256;

/// How a resolution ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveStatus {
    /// Status of the last backend call made for this resolution
    Backend(CommandStatus),
    /// The directory itself could not be listed
    Unreadable(String),
}

impl ResolveStatus {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Backend(CommandStatus::Success))
    }

    #[must_use]
    pub const fn command_status(&self) -> Option<CommandStatus> {
        match self {
            Self::Backend(status) => Some(*status),
            Self::Unreadable(_) => None,
        }
    }
}

impl fmt::Display for ResolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(status) => write!(f, "{status}"),
            Self::Unreadable(reason) => write!(f, "unreadable: {reason}"),
        }
    }
}

/// File list produced for one navigation node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub node: NavigationNode,
    /// Empty whenever `status` is not a success
    pub records: Vec<FileRecord>,
    pub status: ResolveStatus,
    /// Diagnostic for a failed resolution
    pub message: Option<String>,
}

impl Resolution {
    fn ok(node: NavigationNode, records: Vec<FileRecord>) -> Self {
        Self {
            node,
            records,
            status: ResolveStatus::Backend(CommandStatus::Success),
            message: None,
        }
    }

    fn failed(node: NavigationNode, result: &CommandResult) -> Self {
        Self {
            node,
            records: Vec::new(),
            status: ResolveStatus::Backend(result.status),
            message: Some(result.describe()),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.records.iter().map(|r| r.path.clone()).collect()
    }
}

/// All tag names known to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagListing {
    pub tags: TagSet,
    pub status: CommandStatus,
    pub message: Option<String>,
}

/// Resolves navigation nodes through the tag backend
#[derive(Debug, Clone)]
pub struct Resolver {
    backend: Backend,
    show_hidden: bool,
}

impl Resolver {
    #[must_use]
    pub const fn new(backend: Backend) -> Self {
        Self {
            backend,
            show_hidden: false,
        }
    }

    #[must_use]
    pub const fn with_hidden(mut self, show_hidden: bool) -> Self {
        self.show_hidden = show_hidden;
        self
    }

    /// Resolve `node` into file records
    ///
    /// Queries run from `cwd` and their relative output is joined onto it;
    /// directories run the backend from the directory itself.
    #[must_use]
    pub fn resolve(&self, node: &NavigationNode, cwd: &Path) -> Resolution {
        debug!(%node, "resolving");
        let resolution = match node {
            NavigationNode::FilesystemPath(dir) => self.resolve_directory(node, dir),
            NavigationNode::SavedQuery(query) => self.resolve_query(node, &query.expression, cwd),
        };
        debug!(
            %node,
            status = %resolution.status,
            files = resolution.records.len(),
            "resolved"
        );
        resolution
    }

    /// List every tag name known to the backend
    #[must_use]
    pub fn load_tags(&self, cwd: &Path) -> TagListing {
        let result = self
            .backend
            .call_in(BackendCommand::AllTags, &Bindings::new(), cwd);
        if result.is_success() {
            TagListing {
                tags: result.lines().iter().cloned().collect(),
                status: result.status,
                message: None,
            }
        } else {
            TagListing {
                tags: TagSet::new(),
                status: result.status,
                message: Some(result.describe()),
            }
        }
    }

    fn resolve_directory(&self, node: &NavigationNode, dir: &Path) -> Resolution {
        let paths = match list_files(dir, self.show_hidden) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot list directory");
                return Resolution {
                    node: node.clone(),
                    records: Vec::new(),
                    status: ResolveStatus::Unreadable(e.kind().to_string()),
                    message: Some(format!("{}: {e}", dir.display())),
                };
            }
        };
        self.attach_tags(node, paths, dir)
    }

    fn resolve_query(
        &self,
        node: &NavigationNode,
        expression: &QueryExpression,
        cwd: &Path,
    ) -> Resolution {
        let (command, bindings) = expression.command();
        let result = self.backend.call_in(command, &bindings, cwd);
        if !result.is_success() {
            return Resolution::failed(node.clone(), &result);
        }

        let mut seen = HashSet::new();
        let paths: Vec<PathBuf> = result
            .lines()
            .iter()
            .map(|line| normalize(&cwd.join(line)))
            .filter(|path| {
                let exists = path.exists();
                if !exists {
                    debug!(path = %path.display(), "query result no longer on disk");
                }
                exists
            })
            .filter(|path| seen.insert(path.clone()))
            .collect();

        self.attach_tags(node, paths, cwd)
    }

    /// Stat each path and fill in its tags with batched backend calls
    fn attach_tags(&self, node: &NavigationNode, paths: Vec<PathBuf>, cwd: &Path) -> Resolution {
        if paths.is_empty() {
            return Resolution::ok(node.clone(), Vec::new());
        }

        let mut tags_by_path: HashMap<PathBuf, Vec<String>> = HashMap::new();
        for chunk in paths.chunks(FILE_TAGS_BATCH) {
            let result = self
                .backend
                .call_in(BackendCommand::FileTags, &Bindings::new().files(chunk), cwd);
            if !result.is_success() {
                return Resolution::failed(node.clone(), &result);
            }
            for (path, tags) in result.file_tags() {
                tags_by_path.insert(normalize(&cwd.join(path)), tags.clone());
            }
        }

        let mut records = stat_files(paths);
        for record in &mut records {
            if let Some(tags) = tags_by_path.remove(&record.path) {
                record.tags = tags;
            }
        }
        Resolution::ok(node.clone(), records)
    }
}

/// Drop `.` components so the same file always has the same path
fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}

/// Regular files directly inside `dir`, sorted case-insensitively
///
/// # Errors
///
/// Returns the I/O error if the directory cannot be read.
pub fn list_files(dir: &Path, show_hidden: bool) -> io::Result<Vec<PathBuf>> {
    list_entries(dir, show_hidden, |path| path.is_file())
}

/// Subdirectories of `dir`, sorted case-insensitively
///
/// # Errors
///
/// Returns the I/O error if the directory cannot be read.
pub fn list_subdirectories(dir: &Path, show_hidden: bool) -> io::Result<Vec<PathBuf>> {
    list_entries(dir, show_hidden, |path| path.is_dir())
}

fn list_entries(
    dir: &Path,
    show_hidden: bool,
    keep: impl Fn(&Path) -> bool,
) -> io::Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .filter(|entry| show_hidden || !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.path())
        .filter(|path| keep(path))
        .collect();

    entries.sort_by_cached_key(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });
    Ok(entries)
}

/// Build records with size and modification time, preserving order
///
/// A failed stat keeps the file with size 0 and no timestamp.
fn stat_files(paths: Vec<PathBuf>) -> Vec<FileRecord> {
    use rayon::prelude::*;

    paths
        .into_par_iter()
        .map(|path| {
            let mut record = FileRecord::new(path);
            if let Ok(meta) = fs::metadata(&record.path) {
                record.size = meta.len();
                record.modified = meta.modified().ok().map(DateTime::<Local>::from);
            }
            record
        })
        .collect()
}
