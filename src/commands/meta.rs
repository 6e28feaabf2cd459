//! Meta command - print the metadata snapshot of one file

use super::{CommandError, Context, Result, canonical};
use crate::browse::{MetadataStatus, display_entries};
use crate::output;
use std::path::Path;

/// Execute the meta command
///
/// # Errors
///
/// Returns `CommandError` if the file cannot be resolved or extraction fails.
pub fn execute(ctx: &Context, file: &Path) -> Result<()> {
    let path = canonical(file)?;
    let snapshot = ctx.engine.fetcher().fetch(&path);

    match snapshot.status {
        MetadataStatus::Error => {
            let message = snapshot.message.unwrap_or_else(|| "extraction failed".into());
            return Err(CommandError::Failed(match snapshot.command {
                Some(status) => format!("{}: {message}", output::status(status)),
                None => message,
            }));
        }
        MetadataStatus::Unavailable => {
            println!(
                "No metadata available for {}",
                output::format_path(&snapshot.path)
            );
            return Ok(());
        }
        MetadataStatus::Ok => {}
    }

    let entries = display_entries(
        &snapshot,
        &ctx.config.metadata.priority_keys,
        ctx.config.metadata.max_value_width,
    );
    let key_width = entries
        .iter()
        .map(|(key, _)| key.chars().count())
        .max()
        .unwrap_or(0);

    println!("{}:", output::format_path(&snapshot.path));
    for (key, value) in &entries {
        println!("{}", output::metadata_entry(key, value, key_width));
    }
    Ok(())
}
