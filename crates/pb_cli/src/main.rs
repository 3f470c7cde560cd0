//! `pb` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments, initialize logging and load configuration.
//! - Dispatch to the subcommand handlers with one per-invocation service.

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::debug;
use pb_core::config::{system_config_path, user_config_path};
use pb_core::{init_logging, level_for_verbosity, DirLocator, ItemService, SystemRunner};
use std::path::PathBuf;
use std::process::ExitCode;

mod argv;
mod commands;
mod editor;
mod prompt;

use commands::{AddArgs, ItemArgs, ListArgs};

#[derive(Parser, Debug)]
#[command(name = "pb")]
#[command(about = "Track todo items as mail files next to your code", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// User configuration file (replaces the per-user default)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write rotating log files to this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a new item
    Add(AddArgs),

    /// List open items, optionally filtered by search terms
    #[command(visible_alias = "search")]
    List(ListArgs),

    /// Print every message of one item
    Show(ItemArgs),

    /// Move an item to the done category
    #[command(visible_aliases = ["done", "do"])]
    Close(ItemArgs),
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("pb: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = argv::expand_command(std::env::args_os().collect())?;
    let cli = Cli::parse_from(args);

    let log_dir = cli.log_dir.as_deref().map(absolute).transpose()?;
    init_logging(
        level_for_verbosity(cli.verbose),
        log_dir.as_deref().and_then(|dir| dir.to_str()),
    )
    .map_err(|err| anyhow!(err))?;

    let mut config_paths = vec![system_config_path()];
    config_paths.extend(cli.config.clone().or_else(user_config_path));
    debug!(
        "event=cli_start module=cli status=ok config_files={}",
        config_paths.len()
    );

    let config = pb_core::Config::load(&config_paths)?;
    let runner = SystemRunner::new(config.vcs_timeout);
    let locator = DirLocator::from_current_dir()?;
    let mut service = ItemService::new(config, locator, &runner);

    match cli.command {
        Some(Commands::Add(args)) => commands::add(&mut service, args),
        Some(Commands::List(args)) => commands::list(&mut service, args),
        Some(Commands::Show(args)) => commands::show(&mut service, args),
        Some(Commands::Close(args)) => commands::close(&mut service, args),
        None => commands::list(
            &mut service,
            ListArgs {
                all: false,
                json: false,
                terms: Vec::new(),
            },
        ),
    }
}

fn absolute(path: &std::path::Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to read working directory")?;
    Ok(cwd.join(path))
}
