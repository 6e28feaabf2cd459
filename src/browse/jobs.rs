//! Generation-stamped units of backend work
//!
//! The controller never calls the backend itself. Each event yields [`Job`]s
//! that an [`Engine`] runs, inline or on a worker thread, producing a
//! [`JobOutput`] with the same [`Ticket`]. The controller compares the ticket
//! against its current generation before applying the output.

use super::metadata::MetadataFetcher;
use super::models::{MetadataSnapshot, NavigationNode};
use super::mutation::{MutationError, MutationReport, TagMutator, TagOp};
use super::resolver::{Resolution, Resolver, TagListing};
use crate::gateway::Backend;
use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Resolve,
    LoadTags,
    Fetch,
    Mutate,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resolve => "resolve",
            Self::LoadTags => "load_tags",
            Self::Fetch => "fetch",
            Self::Mutate => "mutate",
        })
    }
}

/// Identifies which request an output answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub kind: JobKind,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Work {
    Resolve {
        node: NavigationNode,
        cwd: PathBuf,
    },
    LoadTags {
        cwd: PathBuf,
    },
    Fetch {
        path: PathBuf,
    },
    Mutate {
        op: TagOp,
        paths: Vec<PathBuf>,
        tags: Vec<String>,
        cwd: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub ticket: Ticket,
    pub work: Work,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Resolved(Resolution),
    Tags(TagListing),
    Fetched(MetadataSnapshot),
    Mutated(Result<MutationReport, MutationError>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutput {
    pub ticket: Ticket,
    pub outcome: Outcome,
}

/// Runs jobs against the backend
///
/// Cheap to clone; every worker thread gets its own copy.
#[derive(Debug, Clone)]
pub struct Engine {
    resolver: Resolver,
    fetcher: MetadataFetcher,
    mutator: TagMutator,
}

impl Engine {
    #[must_use]
    pub fn new(backend: Backend, show_hidden: bool) -> Self {
        Self {
            resolver: Resolver::new(backend.clone()).with_hidden(show_hidden),
            fetcher: MetadataFetcher::new(backend.clone()),
            mutator: TagMutator::new(backend),
        }
    }

    #[must_use]
    pub const fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    #[must_use]
    pub const fn fetcher(&self) -> &MetadataFetcher {
        &self.fetcher
    }

    #[must_use]
    pub const fn mutator(&self) -> &TagMutator {
        &self.mutator
    }

    /// Run one job to completion on the calling thread
    #[must_use]
    pub fn run(&self, job: Job) -> JobOutput {
        debug!(kind = %job.ticket.kind, generation = job.ticket.generation, "job started");
        let outcome = match job.work {
            Work::Resolve { node, cwd } => Outcome::Resolved(self.resolver.resolve(&node, &cwd)),
            Work::LoadTags { cwd } => Outcome::Tags(self.resolver.load_tags(&cwd)),
            Work::Fetch { path } => Outcome::Fetched(self.fetcher.fetch(&path)),
            Work::Mutate {
                op,
                paths,
                tags,
                cwd,
            } => Outcome::Mutated(self.mutator.apply(op, &paths, &tags, &cwd)),
        };
        JobOutput {
            ticket: job.ticket,
            outcome,
        }
    }

    /// Run `job` on a new thread and send the output to `tx`
    ///
    /// A closed channel means the receiver has shut down; the output is
    /// dropped.
    pub fn spawn(&self, job: Job, tx: Sender<JobOutput>) {
        let engine = self.clone();
        thread::spawn(move || {
            let output = engine.run(job);
            if tx.send(output).is_err() {
                debug!("job output receiver gone");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browse::models::MetadataStatus;
    use crate::gateway::CommandTable;
    use crate::testing::{FakeTagStore, TempTree};
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_spawned_job_reports_back_with_ticket() {
        let tree = TempTree::new(&["a.jpg"]);
        let store = Arc::new(FakeTagStore::new());
        store.set_metadata(tree.path("a.jpg"), &[("Make", "Canon")]);
        let engine = Engine::new(Backend::new(store, CommandTable::default()), false);

        let (tx, rx) = mpsc::channel();
        let ticket = Ticket {
            kind: JobKind::Fetch,
            generation: 7,
        };
        engine.spawn(
            Job {
                ticket,
                work: Work::Fetch {
                    path: tree.path("a.jpg"),
                },
            },
            tx,
        );

        let output = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(output.ticket, ticket);
        let Outcome::Fetched(snapshot) = output.outcome else {
            panic!("expected a metadata snapshot");
        };
        assert_eq!(snapshot.status, MetadataStatus::Ok);
    }
}
