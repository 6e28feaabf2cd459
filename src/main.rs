//! Tagpane CLI application entry point
//!
//! # Usage
//!
//! ```bash
//! # Browse the current directory (default command)
//! tagpane
//! tagpane ~/Pictures
//!
//! # Start on a tag query
//! tagpane --query "holiday and 2024"
//!
//! # Headless commands
//! tagpane files ~/Pictures
//! tagpane files --query holiday
//! tagpane meta photo.jpg
//! tagpane tag a.jpg b.jpg -t holiday beach
//! tagpane untag a.jpg -t beach
//! tagpane config set-tool metadata-tool /opt/exiftool/exiftool
//! ```
//!
//! # Configuration
//!
//! The configuration lives in the user's config directory
//! (`~/.config/tagpane/config.toml` on Linux) and is created with defaults on
//! first run. Tools that cannot be found are asked for interactively unless
//! `--no-prompt` is given or stdin is not a terminal.

use colored::Colorize;
use std::io::{self, IsTerminal};
use tagpane::{
    TagpaneError,
    browse::{Engine, TagOp},
    cli::{Cli, Commands},
    commands::{self, CommandError, Context},
    config::{self, TagpaneConfig},
    gateway::{Backend, CommandTable, SystemGateway, ToolRegistry},
    logging::{self, LogConfig},
};
use std::sync::Arc;
use tracing::{info, warn};

type Result<T> = std::result::Result<T, TagpaneError>;

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red().bold());
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let browse = cli.is_browse();

    let logs = match logging::init_logging(&LogConfig {
        verbose: cli.verbose,
        tui_mode: browse,
        file: None,
    }) {
        Ok(logs) => logs,
        Err(e) => {
            eprintln!("{} log file disabled: {e}", "Warning:".yellow());
            logging::init_buffer_only(cli.verbose)
        }
    };

    let mut config = TagpaneConfig::load()?;

    // Command-line tool paths and timeout apply to this run only
    let timeout = cli.timeout().unwrap_or_else(|| config.timeout());
    let registry = ToolRegistry::discover(&config.tool_paths());
    for (tool, path) in cli.tool_overrides() {
        registry.set(tool, &path).map_err(CommandError::from)?;
    }
    let command = cli.get_command();
    let may_prompt = !cli.no_prompt
        && io::stdin().is_terminal()
        && !matches!(command, Commands::Config { .. });
    if may_prompt {
        config::prompt_missing_tools(&mut config, &registry)?;
    }
    for tool in registry.missing() {
        warn!(%tool, "tool not configured");
    }

    let cwd = std::env::current_dir()?;
    let backend = Backend::new(
        Arc::new(SystemGateway::new(registry.clone())),
        CommandTable::with_overrides(&config.command_overrides()),
    )
    .with_timeout(timeout)
    .with_cwd(&cwd);
    let engine = Engine::new(backend, config.browse.show_hidden);
    info!(cwd = %cwd.display(), "tagpane starting");

    let mut ctx = Context {
        engine,
        config,
        registry,
        cwd,
    };

    match command {
        Commands::Browse { path, query } => commands::browse(&mut ctx, path, query, &logs)?,
        Commands::Files { path, query } => commands::files(&ctx, path, query)?,
        Commands::Meta { file } => commands::meta(&ctx, &file)?,
        Commands::Tag { files, tags } => commands::tag(&ctx, TagOp::Add, &files, &tags)?,
        Commands::Untag { files, tags } => commands::tag(&ctx, TagOp::Remove, &files, &tags)?,
        Commands::Config { command } => commands::config(&mut ctx, command)?,
    }
    Ok(())
}
