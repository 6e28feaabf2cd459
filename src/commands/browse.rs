//! Browse command - open the terminal browser

use super::{Context, Result, canonical};
use crate::browse::{NavigationNode, SavedQuery};
use crate::logging::LogBuffer;
use crate::ui;
use std::path::PathBuf;

/// Execute the browse command
///
/// Starts on the ad-hoc `query` if given, otherwise on `path` (default: the
/// current directory).
///
/// # Errors
///
/// Returns `CommandError` if the start path cannot be resolved or the
/// terminal cannot be driven.
pub fn execute(
    ctx: &mut Context,
    path: Option<PathBuf>,
    query: Option<String>,
    logs: &LogBuffer,
) -> Result<()> {
    let start = match query {
        Some(expression) => NavigationNode::SavedQuery(SavedQuery::adhoc(expression)),
        None => NavigationNode::path(canonical(path.as_ref().unwrap_or(&ctx.cwd))?),
    };

    ui::run(
        &ctx.engine,
        &mut ctx.config,
        &ctx.registry,
        start,
        &ctx.cwd,
        logs,
    )?;
    Ok(())
}
