//! Interactive prompt for tool paths that could not be discovered
//!
//! Runs before the terminal interface starts, while stdin is still a plain
//! terminal. Leaving an answer empty skips the tool; the interface then shows
//! the tool as missing and offers to configure it later.

use super::TagpaneConfig;
use crate::gateway::{Tool, ToolRegistry};
use colored::Colorize;
use config::ConfigError;
use dialoguer::{Input, theme::ColorfulTheme};
use std::path::PathBuf;

/// Ask for the path of every tool missing from `registry`
///
/// Accepted paths are validated, installed in the registry, stored in
/// `config`, and saved. Returns the tools that were configured.
///
/// # Errors
///
/// Returns `ConfigError` if user input cannot be read or the configuration
/// cannot be saved.
pub fn prompt_missing_tools(
    config: &mut TagpaneConfig,
    registry: &ToolRegistry,
) -> Result<Vec<Tool>, ConfigError> {
    let missing = registry.missing();
    if missing.is_empty() {
        return Ok(Vec::new());
    }

    println!("Some external tools could not be found.\n");

    let mut configured = Vec::new();
    for tool in missing {
        loop {
            let answer: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt(format!("Path to {tool} (leave empty to skip)"))
                .allow_empty(true)
                .interact_text()
                .map_err(|e| ConfigError::Message(format!("Failed to read input: {e}")))?;

            let answer = answer.trim();
            if answer.is_empty() {
                println!("{}", format!("Skipping {tool}").dimmed());
                break;
            }

            let path = PathBuf::from(answer);
            match registry.set(tool, &path) {
                Ok(()) => {
                    config.set_tool_path(tool, path);
                    configured.push(tool);
                    break;
                }
                Err(e) => println!("{}", e.to_string().red()),
            }
        }
    }

    if !configured.is_empty() {
        config.save()?;
        println!("\n{}", "Configuration saved successfully!".green());
    }
    Ok(configured)
}
