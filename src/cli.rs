//! Command-line interface definitions and parsing
//!
//! This module defines the CLI structure for tagpane using the `clap` crate.
//!
//! # Commands
//!
//! - **browse**: Three-pane terminal browser (default)
//! - **files**: Print the files of a directory or query
//! - **meta**: Print the metadata of one file
//! - **tag** / **untag**: Add or remove tags
//! - **config**: Show the configuration or set a tool path
//!
//! Tool paths, the timeout, and verbosity are global flags so they apply to
//! every subcommand.
//!
//! # Examples
//!
//! ```no_run
//! use tagpane::cli::{Cli, Commands};
//!
//! let cli = Cli::parse_args();
//! match cli.get_command() {
//!     Commands::Browse { path, query } => { /* ... */ }
//!     _ => {}
//! }
//! ```

use crate::gateway::Tool;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Tool names accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolArg {
    /// The tag backend (tmsu)
    TagBackend,
    /// The metadata tool (exiftool)
    MetadataTool,
}

impl From<ToolArg> for Tool {
    fn from(arg: ToolArg) -> Self {
        match arg {
            ToolArg::TagBackend => Self::TagBackend,
            ToolArg::MetadataTool => Self::MetadataTool,
        }
    }
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the configuration file location and contents
    Show,

    /// Validate and store the executable path of a tool
    #[command(name = "set-tool")]
    SetTool {
        #[arg(value_enum)]
        tool: ToolArg,

        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

#[derive(Parser, Debug)]
#[command(name = "tagpane")]
#[command(about = "Browse TMSU-tagged files with ExifTool metadata", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory to open (browse mode)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Start on an ad-hoc tag query instead of a directory
    #[arg(long = "query", value_name = "EXPR")]
    pub query: Option<String>,

    /// Path to the tmsu executable
    #[arg(long = "tmsu", value_name = "PATH", global = true)]
    pub tmsu: Option<PathBuf>,

    /// Path to the exiftool executable
    #[arg(long = "exiftool", value_name = "PATH", global = true)]
    pub exiftool: Option<PathBuf>,

    /// Seconds before an external command is killed
    #[arg(long = "timeout", value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Never prompt for missing tool paths
    #[arg(long = "no-prompt", global = true)]
    pub no_prompt: bool,

    /// Log at debug level
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Open the terminal browser (default)
    #[command(visible_alias = "b")]
    Browse {
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,

        #[arg(long = "query", value_name = "EXPR")]
        query: Option<String>,
    },

    /// Print the files of a directory, or of a tag query with --query
    #[command(visible_alias = "ls")]
    Files {
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,

        #[arg(short = 'q', long = "query", value_name = "EXPR")]
        query: Option<String>,
    },

    /// Print the metadata of a file
    #[command(visible_alias = "m")]
    Meta {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Add tags to files
    #[command(visible_alias = "t")]
    Tag {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        #[arg(short = 't', long = "tags", value_name = "TAG", num_args = 1.., required = true)]
        tags: Vec<String>,
    },

    /// Remove tags from files
    #[command(visible_alias = "u")]
    Untag {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        #[arg(short = 't', long = "tags", value_name = "TAG", num_args = 1.., required = true)]
        tags: Vec<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

impl Cli {
    /// Parse command-line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the command, defaulting to Browse with the top-level PATH and --query
    #[must_use]
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or_else(|| Commands::Browse {
            path: self.path.clone(),
            query: self.query.clone(),
        })
    }

    /// Tool paths given on the command line
    #[must_use]
    pub fn tool_overrides(&self) -> Vec<(Tool, PathBuf)> {
        [
            (Tool::TagBackend, self.tmsu.as_ref()),
            (Tool::MetadataTool, self.exiftool.as_ref()),
        ]
        .into_iter()
        .filter_map(|(tool, path)| path.map(|p| (tool, p.clone())))
        .collect()
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(|secs| Duration::from_secs(secs.max(1)))
    }

    /// True when the terminal browser will run
    #[must_use]
    pub fn is_browse(&self) -> bool {
        matches!(self.get_command(), Commands::Browse { .. })
    }
}
