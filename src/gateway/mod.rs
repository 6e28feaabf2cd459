//! Process gateway: uniform, timeout-bounded calls to the external tools
//!
//! Everything that talks to the tag backend or the metadata tool goes through
//! a [`ProcessGateway`]. The gateway never returns `Err`; every failure is a
//! [`CommandStatus`] inside the returned [`CommandResult`].
//!
//! # Architecture
//!
//! ```text
//! caller ── BackendCommand + Bindings ──▶ CommandTable ──▶ CommandRequest
//!                                                              │
//!                                         ProcessGateway::run ◀┘
//!                                                │
//!                         ToolRegistry ──▶ spawn / timeout / classify / parse
//!                                                │
//!                                          CommandResult
//! ```

pub mod parse;
pub mod process;
pub mod result;
pub mod table;
pub mod tools;

pub use process::SystemGateway;
pub use result::{CommandResult, CommandStatus, Payload};
pub use table::{
    BackendCommand, Bindings, CommandOverride, CommandRequest, CommandTable, ExitPolicy,
    OutputFormat, Tool,
};
pub use tools::{ToolPathError, ToolRegistry};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Default per-invocation timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes an expanded command request
///
/// Implementations must not panic or block past `request.timeout`; all
/// failures are reported through the returned status.
pub trait ProcessGateway: Send + Sync {
    fn run(&self, request: &CommandRequest) -> CommandResult;
}

/// A gateway bound to a command table, timeout, and working directory
///
/// This is the handle the resolver, fetcher, and mutation service share.
/// Cloning is cheap.
#[derive(Clone)]
pub struct Backend {
    gateway: Arc<dyn ProcessGateway>,
    table: Arc<CommandTable>,
    timeout: Duration,
    cwd: Option<PathBuf>,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("timeout", &self.timeout)
            .field("cwd", &self.cwd)
            .finish_non_exhaustive()
    }
}

impl Backend {
    #[must_use]
    pub fn new(gateway: Arc<dyn ProcessGateway>, table: CommandTable) -> Self {
        Self {
            gateway,
            table: Arc::new(table),
            timeout: DEFAULT_TIMEOUT,
            cwd: None,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Directory the tag backend is run from
    ///
    /// TMSU locates its database by walking up from the working directory,
    /// and prints query results relative to it.
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn set_cwd(&mut self, cwd: impl Into<PathBuf>) {
        self.cwd = Some(cwd.into());
    }

    #[must_use]
    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    /// Expand `command` with `bindings` and run it
    #[must_use]
    pub fn call(&self, command: BackendCommand, bindings: &Bindings) -> CommandResult {
        let request = self
            .table
            .request(command, bindings, self.timeout, self.cwd.as_deref());
        self.gateway.run(&request)
    }

    /// Like [`Backend::call`], but run from `cwd`
    #[must_use]
    pub fn call_in(&self, command: BackendCommand, bindings: &Bindings, cwd: &Path) -> CommandResult {
        let request = self.table.request(command, bindings, self.timeout, Some(cwd));
        self.gateway.run(&request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGateway;

    #[test]
    fn test_backend_expands_and_forwards() {
        let fake = Arc::new(FakeGateway::new());
        fake.respond(
            BackendCommand::AllTags,
            CommandResult::success(Payload::Lines(vec!["report".into()])),
        );
        let backend = Backend::new(fake.clone(), CommandTable::default())
            .with_timeout(Duration::from_secs(5))
            .with_cwd("/docs");

        let result = backend.call(BackendCommand::AllTags, &Bindings::new());
        assert_eq!(result.lines(), ["report".to_string()]);

        let requests = fake.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].args, ["tags"]);
        assert_eq!(requests[0].timeout, Duration::from_secs(5));
        assert_eq!(requests[0].cwd.as_deref(), Some(Path::new("/docs")));
    }
}
