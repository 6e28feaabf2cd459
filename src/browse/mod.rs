//! Browse engine - navigation, file lists, tags, and metadata
//!
//! This module holds the UI-agnostic core. The interactive front end and the
//! headless commands both drive the same [`PaneController`].
//!
//! # Architecture
//!
//! - `models`: Core data types (`NavigationNode`, `FileRecord`, `Selection`, ...)
//! - `resolver`: Navigation node to file list, via the tag backend
//! - `metadata`: Metadata snapshot for one file, via the metadata tool
//! - `mutation`: Add/remove tag edits with per-file results
//! - `jobs`: Generation-stamped work units and the engine that runs them
//! - `controller`: The selection state machine

pub mod controller;
pub mod jobs;
pub mod metadata;
pub mod models;
pub mod mutation;
pub mod resolver;

pub use controller::{BrowseError, Event, Notice, NoticeLevel, PaneController, PaneState};
pub use jobs::{Engine, Job, JobKind, JobOutput, Outcome, Ticket, Work};
pub use metadata::{DEFAULT_PRIORITY_KEYS, MetadataFetcher, display_entries};
pub use models::{
    FileRecord, MetadataSnapshot, MetadataStatus, NavigationNode, QueryExpression, SavedQuery,
    Selection, TagSet,
};
pub use mutation::{
    MutationError, MutationOutcome, MutationReport, TagMutator, TagOp, sanitize_tags,
    split_tag_input,
};
pub use resolver::{
    Resolution, ResolveStatus, Resolver, TagListing, list_files, list_subdirectories,
};
