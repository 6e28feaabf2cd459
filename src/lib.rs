//! Tagpane - a three-pane terminal browser for tagged files
//!
//! Files are tagged with an external tag database program (TMSU) and
//! inspected with an external metadata extractor (ExifTool). This library
//! runs those programs through a single gateway and keeps the navigation,
//! file list, tag list, and inspector panes consistent with one selection.
//!
//! - [`gateway`]: running external tools with timeouts and table-driven
//!   exit-code rules
//! - [`browse`]: query resolution, metadata fetching, tag mutation, and the
//!   pane controller
//! - [`ui`]: the ratatui front end
//! - [`commands`]: headless subcommands over the same core

use thiserror::Error;

pub mod browse;
pub mod cli;
pub mod commands;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod output;
pub mod ui;

#[cfg(test)]
pub mod testing;

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum TagpaneError {
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Command(#[from] commands::CommandError),
    #[error(transparent)]
    Browse(#[from] browse::BrowseError),
    #[error(transparent)]
    Ui(#[from] ui::UiError),
    #[error("Logging error: {0}")]
    Logging(#[from] logging::LoggingError),
}
