//! Files command - print the resolution of a directory or a tag query

use super::{CommandError, Context, Result, canonical};
use crate::browse::{Event, NavigationNode, PaneController, PaneState, SavedQuery};
use crate::output;
use std::io::IsTerminal;
use std::path::PathBuf;

/// Execute the files command
///
/// Output is one path per line when stdout is not a terminal.
///
/// # Errors
///
/// Returns `CommandError` if the path cannot be resolved or the backend fails.
pub fn execute(ctx: &Context, path: Option<PathBuf>, query: Option<String>) -> Result<()> {
    let node = match query {
        Some(expression) => NavigationNode::SavedQuery(SavedQuery::adhoc(expression)),
        None => NavigationNode::path(canonical(path.as_ref().unwrap_or(&ctx.cwd))?),
    };
    let quiet = !std::io::stdout().is_terminal();

    let mut controller = PaneController::new(&ctx.cwd);
    controller.dispatch_blocking(&ctx.engine, Event::NavigationChanged(node.clone()))?;

    if let PaneState::Failed(message) = controller.files_pane() {
        return Err(CommandError::Failed(message.clone()));
    }

    let records = controller.records();
    if !quiet {
        if records.is_empty() {
            println!("No files in {}", node.label());
            return Ok(());
        }
        println!("{} file(s) in {}:", records.len(), node.label());
    }
    for record in records {
        println!("{}", output::file_record(record, quiet));
    }
    Ok(())
}
