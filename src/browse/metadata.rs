//! Metadata fetcher
//!
//! Retrieves a [`MetadataSnapshot`] for one file through the metadata tool,
//! and orders snapshot entries for display.

use super::models::{MetadataSnapshot, strip_group};
use crate::gateway::{Backend, BackendCommand, Bindings, CommandStatus};
use std::path::Path;
use tracing::debug;

/// Keys shown first in the inspector when no configuration overrides them
pub const DEFAULT_PRIORITY_KEYS: &[&str] = &[
    "FileName",
    "FileSize",
    "MIMEType",
    "FileModifyDate",
    "Make",
    "Model",
    "DateTimeOriginal",
    "ImageSize",
    "Megapixels",
];

/// Keys never shown in the inspector
const HIDDEN_KEYS: &[&str] = &["SourceFile"];

#[derive(Debug, Clone)]
pub struct MetadataFetcher {
    backend: Backend,
}

impl MetadataFetcher {
    #[must_use]
    pub const fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Extract metadata for `path` with one tool invocation
    ///
    /// A missing file short-circuits with an error snapshot. The tool
    /// reporting nothing, or rejecting the file type, yields `Unavailable`;
    /// the tool itself failing yields `Error`.
    #[must_use]
    pub fn fetch(&self, path: &Path) -> MetadataSnapshot {
        if !path.exists() {
            debug!(path = %path.display(), "metadata requested for missing file");
            return MetadataSnapshot::error(path, None, "file not found");
        }

        let result = self
            .backend
            .call(BackendCommand::Extract, &Bindings::new().file(path));

        match result.status {
            CommandStatus::Success if result.pairs().is_empty() => {
                MetadataSnapshot::unavailable(path, "no metadata available for this file type")
            }
            CommandStatus::Success => MetadataSnapshot::ok(path, result.pairs().to_vec()),
            status => MetadataSnapshot::error(path, Some(status), result.describe()),
        }
    }
}

/// Entries in display order: priority keys first, then the rest as emitted
///
/// Group prefixes are stripped from keys, hidden keys are skipped, and values
/// longer than `max_width` characters are truncated with an ellipsis.
#[must_use]
pub fn display_entries(
    snapshot: &MetadataSnapshot,
    priority: &[String],
    max_width: usize,
) -> Vec<(String, String)> {
    let visible: Vec<(&str, &str)> = snapshot
        .entries
        .iter()
        .map(|(key, value)| (strip_group(key), value.as_str()))
        .filter(|(key, _)| !HIDDEN_KEYS.contains(key))
        .collect();

    let mut used = vec![false; visible.len()];
    let mut ordered = Vec::with_capacity(visible.len());

    for wanted in priority {
        if let Some(index) = visible
            .iter()
            .enumerate()
            .position(|(i, (key, _))| !used[i] && *key == wanted.as_str())
        {
            used[index] = true;
            ordered.push(visible[index]);
        }
    }
    ordered.extend(
        visible
            .iter()
            .enumerate()
            .filter(|(i, _)| !used[*i])
            .map(|(_, entry)| *entry),
    );

    ordered
        .into_iter()
        .map(|(key, value)| (key.to_string(), truncate(value, max_width)))
        .collect()
}

fn truncate(value: &str, max_width: usize) -> String {
    if max_width == 0 || value.chars().count() <= max_width {
        return value.to_string();
    }
    let keep = max_width.saturating_sub(3);
    let mut out: String = value.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browse::models::MetadataStatus;
    use crate::gateway::{CommandResult, CommandTable, Payload};
    use crate::testing::{FakeGateway, TempTree};
    use std::sync::Arc;

    fn fetcher(fake: &Arc<FakeGateway>) -> MetadataFetcher {
        MetadataFetcher::new(Backend::new(fake.clone(), CommandTable::default()))
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_fetch_ok() {
        let tree = TempTree::new(&["a.jpg"]);
        let fake = Arc::new(FakeGateway::new());
        fake.respond(
            BackendCommand::Extract,
            CommandResult::success(Payload::Pairs(pairs(&[("EXIF:Make", "Canon")]))),
        );

        let snapshot = fetcher(&fake).fetch(&tree.path("a.jpg"));
        assert_eq!(snapshot.status, MetadataStatus::Ok);
        assert_eq!(snapshot.get("Make"), Some("Canon"));
        assert_eq!(fake.requests()[0].args, ["-G", "-S", tree.path("a.jpg").to_string_lossy().as_ref()]);
    }

    #[test]
    fn test_fetch_empty_is_unavailable() {
        let tree = TempTree::new(&["a.bin"]);
        let fake = Arc::new(FakeGateway::new());
        fake.respond(
            BackendCommand::Extract,
            CommandResult::success(Payload::Pairs(vec![])),
        );
        let snapshot = fetcher(&fake).fetch(&tree.path("a.bin"));
        assert_eq!(snapshot.status, MetadataStatus::Unavailable);
        assert!(snapshot.entries.is_empty());
    }

    #[test]
    fn test_fetch_tool_missing_is_error() {
        let tree = TempTree::new(&["a.jpg"]);
        let fake = Arc::new(FakeGateway::new());
        fake.respond(
            BackendCommand::Extract,
            CommandResult::tool_missing("metadata tool (exiftool)"),
        );
        let snapshot = fetcher(&fake).fetch(&tree.path("a.jpg"));
        assert_eq!(snapshot.status, MetadataStatus::Error);
        assert!(snapshot.is_tool_missing());
    }

    #[test]
    fn test_missing_file_skips_tool() {
        let fake = Arc::new(FakeGateway::new());
        let snapshot = fetcher(&fake).fetch(Path::new("/no/such/file.jpg"));
        assert_eq!(snapshot.status, MetadataStatus::Error);
        assert_eq!(snapshot.message.as_deref(), Some("file not found"));
        assert!(fake.requests().is_empty());
    }

    #[test]
    fn test_display_entries_priority_and_hidden() {
        let snapshot = MetadataSnapshot::ok(
            "/a.jpg",
            pairs(&[
                ("SourceFile", "/a.jpg"),
                ("EXIF:ISO", "100"),
                ("EXIF:Make", "Canon"),
                ("File:FileName", "a.jpg"),
            ]),
        );
        let priority = vec!["FileName".to_string(), "Make".to_string()];
        let entries = display_entries(&snapshot, &priority, 50);
        assert_eq!(
            entries,
            pairs(&[("FileName", "a.jpg"), ("Make", "Canon"), ("ISO", "100")])
        );
    }

    #[test]
    fn test_long_values_truncated() {
        let snapshot = MetadataSnapshot::ok("/a.jpg", pairs(&[("Comment", "abcdefghijkl")]));
        let entries = display_entries(&snapshot, &[], 8);
        assert_eq!(entries[0].1, "abcde...");
    }
}
