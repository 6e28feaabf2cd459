//! Command implementations
//!
//! Each command is a module with an `execute` function that takes parsed CLI
//! args and a [`Context`]. The headless commands drive the same engine and
//! controller as the terminal browser, inline on the calling thread.

pub mod browse;
pub mod config;
pub mod files;
pub mod meta;
pub mod tag;

pub use browse::execute as browse;
pub use config::execute as config;
pub use files::execute as files;
pub use meta::execute as meta;
pub use tag::execute as tag;

use crate::browse::{BrowseError, Engine, MutationError};
use crate::config::TagpaneConfig;
use crate::gateway::{ToolPathError, ToolRegistry};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CommandError>;

/// Failures of a headless command
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Cannot access path '{path}': {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Browse(#[from] BrowseError),
    #[error("{0}")]
    Mutation(#[from] MutationError),
    #[error("{0}")]
    ToolPath(#[from] ToolPathError),
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    /// The backend reported a failure
    #[error("{0}")]
    Failed(String),
    #[error("{failed} of {total} file(s) failed")]
    Partial { failed: usize, total: usize },
    #[error("Terminal error: {0}")]
    Ui(#[from] crate::ui::UiError),
}

/// Everything a command needs
pub struct Context {
    pub engine: Engine,
    pub config: TagpaneConfig,
    pub registry: ToolRegistry,
    /// Start directory and default backend working directory
    pub cwd: PathBuf,
}

/// Absolute, symlink-resolved form of a user-supplied path
///
/// # Errors
///
/// Returns `CommandError::Path` if the path cannot be resolved.
pub fn canonical(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(|source| CommandError::Path {
        path: path.to_path_buf(),
        source,
    })
}
