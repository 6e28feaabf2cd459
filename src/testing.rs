//! Testing utilities for tagpane
//!
//! This module provides gateways that never spawn processes and a temporary
//! directory tree helper:
//!
//! - [`FakeGateway`] replays scripted [`CommandResult`]s per command and
//!   records every request it receives.
//! - [`FakeTagStore`] keeps an in-memory tag database and answers the default
//!   command table the way the real tag backend would, so mutations show up
//!   in later resolutions.
//! - [`TempTree`] creates files under a temporary directory that is removed
//!   on drop.
//!
//! Only available when compiled with `cfg(test)`.

use crate::gateway::parse::{empty_payload, split_tags};
use crate::gateway::{BackendCommand, CommandRequest, CommandResult, Payload, ProcessGateway};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::TempDir;

/// Gateway that replays canned results
///
/// One-shot responses queued with [`FakeGateway::respond_once`] are used
/// first, then the sticky response set with [`FakeGateway::respond`]. A
/// command with neither succeeds with an empty payload.
#[derive(Debug, Default)]
pub struct FakeGateway {
    once: Mutex<HashMap<BackendCommand, VecDeque<CommandResult>>>,
    sticky: Mutex<HashMap<BackendCommand, CommandResult>>,
    requests: Mutex<Vec<CommandRequest>>,
}

impl FakeGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every future `command` with `result`
    pub fn respond(&self, command: BackendCommand, result: CommandResult) {
        self.sticky
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(command, result);
    }

    /// Answer the next `command` with `result`
    pub fn respond_once(&self, command: BackendCommand, result: CommandResult) {
        self.once
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(command)
            .or_default()
            .push_back(result);
    }

    /// Every request received so far, in order
    #[must_use]
    pub fn requests(&self) -> Vec<CommandRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received for `command`
    #[must_use]
    pub fn count(&self, command: BackendCommand) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.command == command)
            .count()
    }
}

impl ProcessGateway for FakeGateway {
    fn run(&self, request: &CommandRequest) -> CommandResult {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let queued = self
            .once
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&request.command)
            .and_then(VecDeque::pop_front);
        if let Some(result) = queued {
            return result;
        }

        self.sticky
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&request.command)
            .cloned()
            .unwrap_or_else(|| CommandResult::success(empty_payload(request.format)))
    }
}

/// In-memory tag database speaking the default command table
///
/// Queries support tag names joined with `and`; paths are reported as
/// absolute paths. Metadata for `extract` comes from
/// [`FakeTagStore::set_metadata`].
#[derive(Debug, Default)]
pub struct FakeTagStore {
    files: Mutex<BTreeMap<PathBuf, BTreeSet<String>>>,
    metadata: Mutex<HashMap<PathBuf, Vec<(String, String)>>>,
    requests: Mutex<Vec<CommandRequest>>,
}

impl FakeTagStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(&self, path: impl AsRef<Path>, tags: &[&str]) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(path.as_ref().to_path_buf())
            .or_default()
            .extend(tags.iter().map(|t| (*t).to_string()));
    }

    #[must_use]
    pub fn tags_of(&self, path: impl AsRef<Path>) -> Vec<String> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path.as_ref())
            .map(|tags| tags.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn set_metadata(&self, path: impl AsRef<Path>, pairs: &[(&str, &str)]) {
        self.metadata
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                path.as_ref().to_path_buf(),
                pairs
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            );
    }

    #[must_use]
    pub fn count(&self, command: BackendCommand) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.command == command)
            .count()
    }

    fn file_args(request: &CommandRequest) -> Vec<PathBuf> {
        request
            .args
            .iter()
            .skip(1)
            .filter(|arg| !arg.starts_with("--"))
            .map(PathBuf::from)
            .collect()
    }

    fn tag_args(request: &CommandRequest) -> Vec<String> {
        request
            .args
            .iter()
            .find_map(|arg| arg.strip_prefix("--tags="))
            .map(split_tags)
            .unwrap_or_default()
    }
}

impl ProcessGateway for FakeTagStore {
    fn run(&self, request: &CommandRequest) -> CommandResult {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);

        let payload = match request.command {
            BackendCommand::AllTags => Payload::Lines(
                files
                    .values()
                    .flatten()
                    .cloned()
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect(),
            ),
            BackendCommand::FileTags => Payload::FileTags(
                Self::file_args(request)
                    .into_iter()
                    .map(|path| {
                        let tags = files
                            .get(&path)
                            .map(|t| t.iter().cloned().collect())
                            .unwrap_or_default();
                        (path, tags)
                    })
                    .collect(),
            ),
            BackendCommand::Query => {
                let wanted: Vec<&str> = request
                    .args
                    .get(1)
                    .map(|q| q.split_whitespace().filter(|w| *w != "and").collect())
                    .unwrap_or_default();
                Payload::Lines(
                    files
                        .iter()
                        .filter(|(_, tags)| wanted.iter().all(|w| tags.contains(*w)))
                        .map(|(path, _)| path.to_string_lossy().into_owned())
                        .collect(),
                )
            }
            BackendCommand::AllFiles => Payload::Lines(
                files
                    .iter()
                    .filter(|(_, tags)| !tags.is_empty())
                    .map(|(path, _)| path.to_string_lossy().into_owned())
                    .collect(),
            ),
            BackendCommand::Untagged => Payload::Lines(
                files
                    .iter()
                    .filter(|(_, tags)| tags.is_empty())
                    .map(|(path, _)| path.to_string_lossy().into_owned())
                    .collect(),
            ),
            BackendCommand::AddTags => {
                let tags = Self::tag_args(request);
                for path in Self::file_args(request) {
                    files.entry(path).or_default().extend(tags.iter().cloned());
                }
                Payload::Empty
            }
            BackendCommand::RemoveTags => {
                let tags = Self::tag_args(request);
                for path in Self::file_args(request) {
                    if let Some(existing) = files.get_mut(&path) {
                        existing.retain(|t| !tags.contains(t));
                    }
                }
                Payload::Empty
            }
            BackendCommand::Extract => {
                let path = request.args.last().map(PathBuf::from).unwrap_or_default();
                Payload::Pairs(
                    self.metadata
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .get(&path)
                        .cloned()
                        .unwrap_or_default(),
                )
            }
        };

        CommandResult::success(payload)
    }
}

/// Temporary directory populated with empty files
///
/// Entries ending in `/` create directories; other entries create files
/// (and any missing parent directories).
pub struct TempTree {
    dir: TempDir,
}

impl TempTree {
    /// # Panics
    /// Panics if the temporary directory or a file cannot be created.
    #[must_use]
    pub fn new(entries: &[&str]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        for entry in entries {
            let path = dir.path().join(entry.trim_end_matches('/'));
            if entry.ends_with('/') {
                fs::create_dir_all(&path).expect("Failed to create test dir");
            } else {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).expect("Failed to create test dir");
                }
                fs::write(&path, b"test content").expect("Failed to create test file");
            }
        }
        Self { dir }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    #[must_use]
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Bindings, CommandStatus, CommandTable};
    use std::time::Duration;

    fn request(command: BackendCommand, bindings: &Bindings) -> CommandRequest {
        CommandTable::default().request(command, bindings, Duration::from_secs(1), None)
    }

    #[test]
    fn test_fake_gateway_once_then_sticky() {
        let fake = FakeGateway::new();
        fake.respond(BackendCommand::AllTags, CommandResult::success(Payload::Lines(vec!["a".into()])));
        fake.respond_once(
            BackendCommand::AllTags,
            CommandResult::failure(CommandStatus::Timeout, ""),
        );

        let req = request(BackendCommand::AllTags, &Bindings::new());
        assert_eq!(fake.run(&req).status, CommandStatus::Timeout);
        assert_eq!(fake.run(&req).lines(), ["a".to_string()]);
        assert_eq!(fake.count(BackendCommand::AllTags), 2);
    }

    #[test]
    fn test_fake_gateway_default_is_empty_success() {
        let fake = FakeGateway::new();
        let result = fake.run(&request(BackendCommand::FileTags, &Bindings::new().file("/a")));
        assert!(result.is_success());
        assert_eq!(result.payload, Some(Payload::FileTags(vec![])));
    }

    #[test]
    fn test_tag_store_roundtrip() {
        let store = FakeTagStore::new();
        store.tag("/docs/a.pdf", &["report"]);
        let add = Bindings::new()
            .file("/docs/a.pdf")
            .tags(&["to read".to_string(), "urgent".to_string()]);
        assert!(store.run(&request(BackendCommand::AddTags, &add)).is_success());
        assert_eq!(store.tags_of("/docs/a.pdf"), vec!["report", "to read", "urgent"]);

        let query = store.run(&request(BackendCommand::Query, &Bindings::new().query("report and urgent")));
        assert_eq!(query.lines(), ["/docs/a.pdf".to_string()]);
    }

    #[test]
    fn test_temp_tree() {
        let tree = TempTree::new(&["a.txt", "sub/b.txt", "empty/"]);
        assert!(tree.path("a.txt").is_file());
        assert!(tree.path("sub/b.txt").is_file());
        assert!(tree.path("empty").is_dir());
    }
}
