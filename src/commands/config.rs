//! Config command - show the configuration or set a tool path

use super::{Context, Result};
use crate::cli::ConfigCommands;
use crate::config::TagpaneConfig;
use crate::gateway::Tool;
use colored::Colorize;

/// Execute a config subcommand
///
/// # Errors
///
/// Returns `CommandError` if the tool path is rejected or the configuration
/// cannot be written.
pub fn execute(ctx: &mut Context, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(ctx),
        ConfigCommands::SetTool { tool, path } => {
            let tool = Tool::from(tool);
            ctx.registry.set(tool, &path)?;
            ctx.config.set_tool_path(tool, &path);
            ctx.config.save()?;
            println!("{} {tool} = {}", "Saved".green(), path.display());
            Ok(())
        }
    }
}

fn show(ctx: &Context) -> Result<()> {
    println!("{}", TagpaneConfig::config_path()?.display().to_string().bold());
    for tool in Tool::ALL {
        match ctx.registry.get(tool) {
            Some(path) => println!("  {tool}: {}", path.display()),
            None => println!("  {tool}: {}", "not found".red()),
        }
    }
    println!();

    let text = toml::to_string_pretty(&ctx.config).map_err(|e| {
        ::config::ConfigError::Message(format!("Failed to serialize config: {e}"))
    })?;
    print!("{text}");
    Ok(())
}
