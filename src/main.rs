mod cli;
mod commands;
mod config;
mod directory;
mod engine;
mod progress;
mod schema;
mod ui;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use commands::sync::{Credentials, SyncOptions};

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let opts = SyncOptions {
        render_directory: cli.directory,
        update_remote: cli.groupsio,
        config_dir: cli.config_dir,
        output_dir: cli.output_dir,
        api_base: cli.api_base,
        credentials: Credentials::from_parts(cli.username, cli.password),
    };

    commands::sync::run(&ctx, opts)
}
