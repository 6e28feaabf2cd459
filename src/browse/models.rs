//! Data models for the browse engine
//!
//! These are plain data structures with little logic. The controller owns the
//! only mutable instance of [`Selection`]; everything else is rebuilt
//! wholesale from backend output.

use crate::gateway::table::escape_tag;
use crate::gateway::{BackendCommand, Bindings, CommandStatus};
use chrono::{DateTime, Local};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Navigation
// ============================================================================

/// Expression evaluated by the tag backend
///
/// Query text is passed through verbatim; its grammar belongs to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryExpression {
    /// A tag-boolean expression such as `report and 2023`
    Expression(String),
    /// Every file that has at least one tag
    AllTagged,
    /// Files the backend tracks but that carry no tags
    Untagged,
}

impl QueryExpression {
    /// Table command and bindings that evaluate this expression
    #[must_use]
    pub fn command(&self) -> (BackendCommand, Bindings) {
        match self {
            Self::Expression(expr) => (BackendCommand::Query, Bindings::new().query(expr.clone())),
            Self::AllTagged => (BackendCommand::AllFiles, Bindings::new()),
            Self::Untagged => (BackendCommand::Untagged, Bindings::new()),
        }
    }
}

impl fmt::Display for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(expr) => f.write_str(expr),
            Self::AllTagged => f.write_str("<all tagged>"),
            Self::Untagged => f.write_str("<untagged>"),
        }
    }
}

/// A labelled query shown in the navigation tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SavedQuery {
    pub label: String,
    pub expression: QueryExpression,
}

impl SavedQuery {
    #[must_use]
    pub fn new(label: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            expression: QueryExpression::Expression(expression.into()),
        }
    }

    /// An ad-hoc query labelled by its own text
    #[must_use]
    pub fn adhoc(expression: impl Into<String>) -> Self {
        let expression = expression.into();
        Self::new(expression.clone(), expression)
    }

    /// Query for every file carrying `tag`
    #[must_use]
    pub fn for_tag(tag: &str) -> Self {
        Self::new(format!("tag: {tag}"), escape_tag(tag))
    }

    #[must_use]
    pub fn all_tagged() -> Self {
        Self {
            label: "All Tagged Files".to_string(),
            expression: QueryExpression::AllTagged,
        }
    }

    #[must_use]
    pub fn untagged() -> Self {
        Self {
            label: "Untagged Files".to_string(),
            expression: QueryExpression::Untagged,
        }
    }
}

/// A selectable entry in the navigation pane
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NavigationNode {
    FilesystemPath(PathBuf),
    SavedQuery(SavedQuery),
}

impl NavigationNode {
    #[must_use]
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::FilesystemPath(path.into())
    }

    #[must_use]
    pub fn query(label: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::SavedQuery(SavedQuery::new(label, expression))
    }

    /// Text shown for this node in titles and the status bar
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::FilesystemPath(path) => path.display().to_string(),
            Self::SavedQuery(query) => query.label.clone(),
        }
    }
}

impl fmt::Display for NavigationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FilesystemPath(path) => write!(f, "path {}", path.display()),
            Self::SavedQuery(query) => write!(f, "query '{}' ({})", query.label, query.expression),
        }
    }
}

// ============================================================================
// Resolution results
// ============================================================================

/// One file as known to the current resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute path, unique within a resolution
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
    /// Tags known at resolution time
    pub tags: Vec<String>,
}

impl FileRecord {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: 0,
            modified: None,
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Size in binary units, e.g. `1.5 KiB`
    #[must_use]
    pub fn size_display(&self) -> String {
        use byte_unit::{Byte, UnitType};

        Byte::from_u64(self.size)
            .get_appropriate_unit(UnitType::Binary)
            .to_string()
    }

    #[must_use]
    pub fn modified_display(&self) -> String {
        self.modified
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default()
    }
}

/// All distinct tag names known to the backend
///
/// Always rebuilt from a backend listing; never patched locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(Into::into)
                .filter(|tag: &String| !tag.is_empty())
                .collect(),
        )
    }
}

// ============================================================================
// Metadata
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataStatus {
    Ok,
    /// The tool ran but has nothing to say about this file type
    Unavailable,
    Error,
}

/// Ordered metadata pairs for exactly one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataSnapshot {
    pub path: PathBuf,
    pub entries: Vec<(String, String)>,
    pub status: MetadataStatus,
    /// Gateway status behind this snapshot, if the tool was invoked
    pub command: Option<CommandStatus>,
    /// Diagnostic text for non-ok snapshots
    pub message: Option<String>,
}

impl MetadataSnapshot {
    #[must_use]
    pub fn ok(path: impl Into<PathBuf>, entries: Vec<(String, String)>) -> Self {
        Self {
            path: path.into(),
            entries,
            status: MetadataStatus::Ok,
            command: Some(CommandStatus::Success),
            message: None,
        }
    }

    #[must_use]
    pub fn unavailable(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
            status: MetadataStatus::Unavailable,
            command: Some(CommandStatus::Success),
            message: Some(message.into()),
        }
    }

    #[must_use]
    pub fn error(
        path: impl Into<PathBuf>,
        command: Option<CommandStatus>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
            status: MetadataStatus::Error,
            command,
            message: Some(message.into()),
        }
    }

    /// Value for `key`, matching either the full `Group:Key` or the bare key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key || strip_group(k) == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the tool was missing, so the user should be asked to configure it
    #[must_use]
    pub fn is_tool_missing(&self) -> bool {
        self.command == Some(CommandStatus::ToolMissing)
    }
}

/// Key without its `Group:` prefix
#[must_use]
pub fn strip_group(key: &str) -> &str {
    key.rsplit_once(':').map_or(key, |(_, bare)| bare)
}

// ============================================================================
// Selection
// ============================================================================

/// The controller's authoritative selection state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub node: Option<NavigationNode>,
    /// Selected paths in selection order, without duplicates
    pub files: Vec<PathBuf>,
    /// Present only while exactly one file is selected
    pub metadata: Option<MetadataSnapshot>,
}

impl Selection {
    /// The single selected file, if exactly one is selected
    #[must_use]
    pub fn single(&self) -> Option<&Path> {
        match self.files.as_slice() {
            [only] => Some(only.as_path()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_selected(&self, path: &Path) -> bool {
        self.files.iter().any(|p| p == path)
    }

    /// Replace the file selection with the subset of `paths` found in `records`
    ///
    /// Unknown paths and duplicates are dropped. Returns the number dropped.
    pub fn set_files(&mut self, paths: &[PathBuf], records: &[FileRecord]) -> usize {
        let mut kept: Vec<PathBuf> = Vec::with_capacity(paths.len());
        for path in paths {
            if records.iter().any(|r| &r.path == path) && !kept.contains(path) {
                kept.push(path.clone());
            }
        }
        let dropped = paths.len() - kept.len();
        self.files = kept;
        self.sync_metadata();
        dropped
    }

    /// Clear the file selection and metadata
    pub fn clear_files(&mut self) {
        self.files.clear();
        self.metadata = None;
    }

    /// Drop metadata that no longer matches the single selected file
    fn sync_metadata(&mut self) {
        let keep = match (self.single(), &self.metadata) {
            (Some(path), Some(snapshot)) => snapshot.path == path,
            _ => false,
        };
        if !keep {
            self.metadata = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(paths: &[&str]) -> Vec<FileRecord> {
        paths.iter().map(|p| FileRecord::new(*p)).collect()
    }

    #[test]
    fn test_set_files_drops_unknown_and_duplicates() {
        let mut selection = Selection::default();
        let list = records(&["/docs/a.pdf", "/docs/b.pdf"]);
        let dropped = selection.set_files(
            &[
                PathBuf::from("/docs/a.pdf"),
                PathBuf::from("/gone.pdf"),
                PathBuf::from("/docs/a.pdf"),
            ],
            &list,
        );
        assert_eq!(dropped, 2);
        assert_eq!(selection.files, vec![PathBuf::from("/docs/a.pdf")]);
    }

    #[test]
    fn test_metadata_cleared_when_cardinality_changes() {
        let mut selection = Selection::default();
        let list = records(&["/docs/a.pdf", "/docs/b.pdf"]);
        selection.set_files(&[PathBuf::from("/docs/a.pdf")], &list);
        selection.metadata = Some(MetadataSnapshot::ok("/docs/a.pdf", vec![]));

        selection.set_files(&[PathBuf::from("/docs/a.pdf")], &list);
        assert!(selection.metadata.is_some());

        selection.set_files(
            &[PathBuf::from("/docs/a.pdf"), PathBuf::from("/docs/b.pdf")],
            &list,
        );
        assert!(selection.metadata.is_none());
    }

    #[test]
    fn test_metadata_for_other_file_is_dropped() {
        let mut selection = Selection::default();
        let list = records(&["/docs/a.pdf", "/docs/b.pdf"]);
        selection.set_files(&[PathBuf::from("/docs/a.pdf")], &list);
        selection.metadata = Some(MetadataSnapshot::ok("/docs/a.pdf", vec![]));
        selection.set_files(&[PathBuf::from("/docs/b.pdf")], &list);
        assert!(selection.metadata.is_none());
    }

    #[test]
    fn test_query_expression_commands() {
        let (command, bindings) = QueryExpression::Expression("a and b".into()).command();
        assert_eq!(command, BackendCommand::Query);
        assert_eq!(bindings.query.as_deref(), Some("a and b"));
        assert_eq!(QueryExpression::AllTagged.command().0, BackendCommand::AllFiles);
        assert_eq!(QueryExpression::Untagged.command().0, BackendCommand::Untagged);
    }

    #[test]
    fn test_tag_set_dedups_and_sorts() {
        let tags: TagSet = ["report", "2023", "report", ""].into_iter().collect();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.iter().collect::<Vec<_>>(), ["2023", "report"]);
    }

    #[test]
    fn test_snapshot_lookup_ignores_group() {
        let snapshot = MetadataSnapshot::ok(
            "/a.jpg",
            vec![("EXIF:Make".to_string(), "Canon".to_string())],
        );
        assert_eq!(snapshot.get("Make"), Some("Canon"));
        assert_eq!(snapshot.get("EXIF:Make"), Some("Canon"));
        assert_eq!(strip_group("File:FileName"), "FileName");
    }

    #[test]
    fn test_file_record_display() {
        let mut record = FileRecord::new("/docs/a.pdf");
        record.size = 2048;
        assert_eq!(record.name(), "a.pdf");
        assert_eq!(record.size_display(), "2 KiB");
        assert_eq!(record.modified_display(), "");
    }
}
