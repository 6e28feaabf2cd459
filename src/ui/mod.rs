//! Terminal browser built on ratatui and crossterm
//!
//! # Layout
//!
//! ```text
//! ┌ Navigation ─┐┌ Files ──────────────────┐┌ Inspector ────┐
//! │ ▾ File Sys… ││ > a.jpg   2.1 MB  …  tag ││ a.jpg          │
//! │ ▸ Queries   ││   b.jpg   1.8 MB  …      ││ holiday 2024   │
//! ├ Tags ───────┤│                          ││ FileName a.jpg │
//! │ holiday     ││                          ││ Model    X100  │
//! └─────────────┘└──────────────────────────┘└────────────────┘
//! ┌ Status ───────────────────────────────────────────────────┐
//! Tab:focus  Enter:open  F5:refresh  ?:help  q:quit
//! ```
//!
//! The [`PaneController`](crate::browse::PaneController) owns selection and
//! backend results. This module owns only view state ([`state::AppState`]),
//! translates keys into controller events ([`events`]), and runs controller
//! jobs on worker threads ([`app::Browser`]).

pub mod app;
mod error;
pub mod events;
pub mod state;
pub mod theme;
pub mod widgets;

pub use app::Browser;
pub use error::{Result, UiError};
pub use theme::Theme;

use crate::browse::{Engine, NavigationNode};
use crate::config::TagpaneConfig;
use crate::gateway::ToolRegistry;
use crate::logging::LogBuffer;
use std::path::Path;

/// Run the browser on `start` until the user quits
///
/// # Errors
///
/// Returns `UiError` if stdout is not a terminal or terminal I/O fails.
pub fn run(
    engine: &Engine,
    config: &mut TagpaneConfig,
    registry: &ToolRegistry,
    start: NavigationNode,
    cwd: &Path,
    logs: &LogBuffer,
) -> Result<()> {
    Browser::new(engine, config, registry, cwd, logs).run(start)
}
