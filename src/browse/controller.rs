//! Pane synchronization controller
//!
//! The controller owns the only [`Selection`] and keeps the navigation, file
//! list, tag list, and inspector panes consistent with it.
//!
//! # Protocol
//!
//! ```text
//! Event ──handle()──▶ state update + Vec<Job>
//!                                  │ (engine, inline or on a worker)
//! JobOutput ◀──────────────────────┘
//!     │
//!     └──apply()──▶ generation check ──▶ state update + follow-up Vec<Job>
//! ```
//!
//! Resolve and tag-list jobs share the resolve generation; metadata fetches
//! have their own. An output whose generation is older than the current one
//! is stale and dropped. Mutations are never superseded, and each completed
//! mutation triggers a refresh of whatever node is current at that time.

use super::jobs::{Engine, Job, JobKind, JobOutput, Outcome, Ticket, Work};
use super::models::{FileRecord, MetadataSnapshot, NavigationNode, Selection, TagSet};
use super::mutation::{MutationError, MutationOutcome, MutationReport, TagOp, sanitize_tags};
use super::resolver::{Resolution, TagListing};
use crate::gateway::{CommandStatus, Tool};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Controller error type
pub type Result<T> = std::result::Result<T, BrowseError>;

/// Events rejected before any backend work is scheduled
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrowseError {
    #[error("Invalid tag edit: {0}")]
    InvalidEdit(#[from] MutationError),
}

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NavigationChanged(NavigationNode),
    FileSelectionChanged(Vec<PathBuf>),
    TagEditRequested {
        paths: Vec<PathBuf>,
        tags: Vec<String>,
        op: TagOp,
    },
    /// Re-resolve the current node, keeping the still-valid selection
    Refresh,
    /// A tool path was supplied; clear its prompt mark and refresh
    ToolConfigured(Tool),
}

/// Display state of one pane
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneState {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl PaneState {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A one-off message for the status bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

#[derive(Debug)]
pub struct PaneController {
    selection: Selection,
    records: Vec<FileRecord>,
    tags: TagSet,
    files_pane: PaneState,
    tags_pane: PaneState,
    inspector_pane: PaneState,
    resolve_generation: u64,
    fetch_generation: u64,
    mutation_sequence: u64,
    pending_mutations: usize,
    /// Path of the fetch currently in flight
    fetching: Option<PathBuf>,
    /// Directory the tag backend runs from
    cwd: PathBuf,
    prompted: HashSet<Tool>,
    prompt: Option<Tool>,
    notices: VecDeque<Notice>,
}

impl PaneController {
    /// Controller with nothing selected, running the backend from `cwd`
    #[must_use]
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            selection: Selection::default(),
            records: Vec::new(),
            tags: TagSet::new(),
            files_pane: PaneState::Idle,
            tags_pane: PaneState::Idle,
            inspector_pane: PaneState::Idle,
            resolve_generation: 0,
            fetch_generation: 0,
            mutation_sequence: 0,
            pending_mutations: 0,
            fetching: None,
            cwd: cwd.into(),
            prompted: HashSet::new(),
            prompt: None,
            notices: VecDeque::new(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn node(&self) -> Option<&NavigationNode> {
        self.selection.node.as_ref()
    }

    #[must_use]
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    #[must_use]
    pub fn record(&self, path: &Path) -> Option<&FileRecord> {
        self.records.iter().find(|r| r.path == path)
    }

    #[must_use]
    pub const fn tags(&self) -> &TagSet {
        &self.tags
    }

    #[must_use]
    pub fn metadata(&self) -> Option<&MetadataSnapshot> {
        self.selection.metadata.as_ref()
    }

    #[must_use]
    pub const fn files_pane(&self) -> &PaneState {
        &self.files_pane
    }

    #[must_use]
    pub const fn tags_pane(&self) -> &PaneState {
        &self.tags_pane
    }

    #[must_use]
    pub const fn inspector_pane(&self) -> &PaneState {
        &self.inspector_pane
    }

    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Whether any backend work is outstanding
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending_mutations > 0
            || self.files_pane.is_loading()
            || self.tags_pane.is_loading()
            || self.inspector_pane.is_loading()
    }

    /// The tool to ask the user about, at most once per tool
    pub fn take_tool_prompt(&mut self) -> Option<Tool> {
        self.prompt.take()
    }

    /// Drain queued status messages
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Apply an event and return the backend work it requires
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::InvalidEdit` when a tag edit names no known file
    /// or an invalid tag; no work is scheduled in that case.
    pub fn handle(&mut self, event: Event) -> Result<Vec<Job>> {
        match event {
            Event::NavigationChanged(node) => Ok(self.navigate(node)),
            Event::FileSelectionChanged(paths) => Ok(self.select_files(&paths)),
            Event::TagEditRequested { paths, tags, op } => self.edit_tags(&paths, &tags, op),
            Event::Refresh => Ok(self.refresh()),
            Event::ToolConfigured(tool) => {
                info!(%tool, "tool configured, refreshing");
                self.prompted.remove(&tool);
                if self.prompt == Some(tool) {
                    self.prompt = None;
                }
                Ok(self.refresh())
            }
        }
    }

    fn navigate(&mut self, node: NavigationNode) -> Vec<Job> {
        debug!(%node, "navigation changed");
        if let NavigationNode::FilesystemPath(dir) = &node {
            self.cwd.clone_from(dir);
        }

        self.selection.node = Some(node.clone());
        self.selection.clear_files();
        self.records.clear();
        self.cancel_fetch();
        self.inspector_pane = PaneState::Idle;

        self.resolve_jobs(node)
    }

    fn refresh(&mut self) -> Vec<Job> {
        match self.selection.node.clone() {
            Some(node) => {
                debug!(%node, "refreshing");
                self.resolve_jobs(node)
            }
            None => Vec::new(),
        }
    }

    fn resolve_jobs(&mut self, node: NavigationNode) -> Vec<Job> {
        self.resolve_generation += 1;
        self.files_pane = PaneState::Loading;
        self.tags_pane = PaneState::Loading;

        let generation = self.resolve_generation;
        vec![
            Job {
                ticket: Ticket {
                    kind: JobKind::Resolve,
                    generation,
                },
                work: Work::Resolve {
                    node,
                    cwd: self.cwd.clone(),
                },
            },
            Job {
                ticket: Ticket {
                    kind: JobKind::LoadTags,
                    generation,
                },
                work: Work::LoadTags {
                    cwd: self.cwd.clone(),
                },
            },
        ]
    }

    fn select_files(&mut self, paths: &[PathBuf]) -> Vec<Job> {
        let dropped = self.selection.set_files(paths, &self.records);
        if dropped > 0 {
            debug!(dropped, "ignored paths not in the current file list");
        }

        match self.selection.single().map(Path::to_path_buf) {
            Some(path) if self.selection.metadata.is_some() => {
                debug!(path = %path.display(), "metadata already current");
                self.cancel_fetch();
                self.inspector_pane = PaneState::Ready;
                Vec::new()
            }
            Some(path) if self.fetching.as_deref() == Some(path.as_path()) => Vec::new(),
            Some(path) => vec![self.fetch_job(path)],
            None => {
                self.cancel_fetch();
                self.inspector_pane = PaneState::Idle;
                Vec::new()
            }
        }
    }

    fn fetch_job(&mut self, path: PathBuf) -> Job {
        self.fetch_generation += 1;
        self.fetching = Some(path.clone());
        self.selection.metadata = None;
        self.inspector_pane = PaneState::Loading;
        Job {
            ticket: Ticket {
                kind: JobKind::Fetch,
                generation: self.fetch_generation,
            },
            work: Work::Fetch { path },
        }
    }

    /// Invalidate any fetch in flight
    fn cancel_fetch(&mut self) {
        if self.fetching.take().is_some() {
            self.fetch_generation += 1;
        }
    }

    fn edit_tags(&mut self, paths: &[PathBuf], tags: &[String], op: TagOp) -> Result<Vec<Job>> {
        let tags = sanitize_tags(tags)?;
        let mut known: Vec<PathBuf> = Vec::with_capacity(paths.len());
        for path in paths {
            if self.record(path).is_some() && !known.contains(path) {
                known.push(path.clone());
            }
        }
        if known.is_empty() {
            return Err(MutationError::NoFiles.into());
        }

        info!(%op, tags = ?tags, files = known.len(), "tag edit requested");
        self.mutation_sequence += 1;
        self.pending_mutations += 1;
        Ok(vec![Job {
            ticket: Ticket {
                kind: JobKind::Mutate,
                generation: self.mutation_sequence,
            },
            work: Work::Mutate {
                op,
                paths: known,
                tags,
                cwd: self.cwd.clone(),
            },
        }])
    }

    // ------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------

    /// Merge a job's output and return any follow-up work
    pub fn apply(&mut self, output: JobOutput) -> Vec<Job> {
        let JobOutput { ticket, outcome } = output;
        match outcome {
            Outcome::Resolved(resolution) if self.is_current(ticket) => {
                self.apply_resolution(resolution)
            }
            Outcome::Tags(listing) if self.is_current(ticket) => {
                self.apply_tags(listing);
                Vec::new()
            }
            Outcome::Fetched(snapshot) if self.is_current(ticket) => {
                self.apply_snapshot(snapshot);
                Vec::new()
            }
            Outcome::Mutated(report) => self.apply_mutation(report),
            _ => {
                debug!(kind = %ticket.kind, generation = ticket.generation, "dropping stale result");
                Vec::new()
            }
        }
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        match ticket.kind {
            JobKind::Resolve | JobKind::LoadTags => ticket.generation == self.resolve_generation,
            JobKind::Fetch => ticket.generation == self.fetch_generation,
            JobKind::Mutate => true,
        }
    }

    fn apply_resolution(&mut self, resolution: Resolution) -> Vec<Job> {
        if resolution.status.command_status() == Some(CommandStatus::ToolMissing) {
            self.note_tool_missing(Tool::TagBackend);
        }

        self.files_pane = if resolution.is_success() {
            PaneState::Ready
        } else {
            let message = resolution
                .message
                .clone()
                .unwrap_or_else(|| resolution.status.to_string());
            warn!(node = %resolution.node, %message, "resolution failed");
            PaneState::Failed(message)
        };
        self.records = resolution.records;

        let previous = std::mem::take(&mut self.selection.files);
        self.selection.set_files(&previous, &self.records);

        match self.selection.single().map(Path::to_path_buf) {
            Some(path) => vec![self.fetch_job(path)],
            None => {
                self.cancel_fetch();
                self.selection.metadata = None;
                self.inspector_pane = PaneState::Idle;
                Vec::new()
            }
        }
    }

    fn apply_tags(&mut self, listing: TagListing) {
        if listing.status == CommandStatus::ToolMissing {
            self.note_tool_missing(Tool::TagBackend);
        }
        self.tags = listing.tags;
        self.tags_pane = match listing.message {
            Some(message) if !listing.status.is_success() => PaneState::Failed(message),
            _ => PaneState::Ready,
        };
    }

    fn apply_snapshot(&mut self, snapshot: MetadataSnapshot) {
        self.fetching = None;
        if self.selection.single() != Some(snapshot.path.as_path()) {
            debug!(path = %snapshot.path.display(), "snapshot no longer matches selection");
            return;
        }
        if snapshot.is_tool_missing() {
            self.note_tool_missing(Tool::MetadataTool);
        }
        self.selection.metadata = Some(snapshot);
        self.inspector_pane = PaneState::Ready;
    }

    fn apply_mutation(
        &mut self,
        report: std::result::Result<MutationReport, MutationError>,
    ) -> Vec<Job> {
        self.pending_mutations = self.pending_mutations.saturating_sub(1);

        match report {
            Ok(report) => {
                if report.tool_missing() {
                    self.note_tool_missing(Tool::TagBackend);
                }
                let notice = match report.outcome() {
                    MutationOutcome::Success {
                        affected_count,
                        details,
                    } => Notice::new(
                        NoticeLevel::Info,
                        format!("{details} ({affected_count} file(s))"),
                    ),
                    MutationOutcome::PartialFailure {
                        succeeded,
                        failed,
                        errors,
                    } => Notice::new(
                        NoticeLevel::Warning,
                        format!(
                            "{succeeded} succeeded, {failed} failed: {}",
                            errors.first().map_or("", String::as_str)
                        ),
                    ),
                    MutationOutcome::Failed(message) => Notice::new(NoticeLevel::Error, message),
                };
                self.notices.push_back(notice);
            }
            Err(e) => self.notices.push_back(Notice::new(NoticeLevel::Error, e.to_string())),
        }

        self.refresh()
    }

    fn note_tool_missing(&mut self, tool: Tool) {
        if self.prompted.insert(tool) {
            info!(%tool, "tool missing, prompting once");
            self.prompt = Some(tool);
        }
    }

    // ------------------------------------------------------------------
    // Inline execution
    // ------------------------------------------------------------------

    /// Run `jobs` and all follow-up work on the calling thread
    ///
    /// Used by the headless commands and tests; the interactive front end
    /// runs jobs on worker threads instead.
    pub fn settle(&mut self, engine: &Engine, jobs: Vec<Job>) {
        let mut queue: VecDeque<Job> = jobs.into();
        while let Some(job) = queue.pop_front() {
            let output = engine.run(job);
            queue.extend(self.apply(output));
        }
    }

    /// Handle `event` and settle all resulting work inline
    ///
    /// # Errors
    ///
    /// Returns the error from [`PaneController::handle`].
    pub fn dispatch_blocking(&mut self, engine: &Engine, event: Event) -> Result<()> {
        let jobs = self.handle(event)?;
        self.settle(engine, jobs);
        Ok(())
    }
}
