//! `gxupload`: resumable uploads to a Galaxy server.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod commands;
mod config;
mod ui;

use crate::args::{Cli, Command};
use crate::config::CliConfig;

const DEBUG_FILTER: &str =
    "warn,gxupload=debug,gxupload_upload=debug,gxupload_galaxy=debug,gxupload_transfer=debug";

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    // Uploads run one request at a time; no worker threads are needed.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("ERROR: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new(DEBUG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = CliConfig::load(cli.config.as_deref());

    match cli.command {
        Command::Upload(args) => commands::upload::run(args, &config, cli.debug).await,
        Command::Histories(args) => {
            commands::histories::run(args, &config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Resume(args) => {
            commands::resume::run(args, &config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
