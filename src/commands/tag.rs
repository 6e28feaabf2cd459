//! Tag and untag commands

use super::{CommandError, Context, Result, canonical};
use crate::browse::{MutationOutcome, TagOp};
use crate::output;
use colored::Colorize;
use std::path::PathBuf;

/// Execute the tag or untag command
///
/// Files may live in different directories; the backend runs from the
/// start directory.
///
/// # Errors
///
/// Returns `CommandError` if a path cannot be resolved, a tag is invalid, or
/// the backend fails for any file.
pub fn execute(ctx: &Context, op: TagOp, files: &[PathBuf], tags: &[String]) -> Result<()> {
    let paths = files
        .iter()
        .map(|file| canonical(file))
        .collect::<Result<Vec<_>>>()?;

    let report = ctx.engine.mutator().apply(op, &paths, tags, &ctx.cwd)?;

    for (path, result) in &report.results {
        if result.is_success() {
            println!("{} {}", "ok".green(), output::format_path(path));
        } else {
            println!(
                "{} {}: {}",
                output::status(result.status),
                output::format_path(path),
                result.describe()
            );
        }
    }

    match report.outcome() {
        MutationOutcome::Success { details, .. } => {
            println!("{details}");
            Ok(())
        }
        MutationOutcome::PartialFailure {
            succeeded, failed, ..
        } => Err(CommandError::Partial {
            failed,
            total: succeeded + failed,
        }),
        MutationOutcome::Failed(_) => Err(CommandError::Partial {
            failed: report.results.len(),
            total: report.results.len(),
        }),
    }
}
