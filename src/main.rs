mod applier;
mod cli;
mod commands;
mod common;
mod config;
mod error;
mod fetch;
mod history;
mod reconcile;
mod remote;
mod scheduler;
mod ui;

use clap::Parser;
use std::io::IsTerminal;

use crate::cli::Cli;
use crate::ui::prelude::*;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    ui::init(cli.output, std::io::stdout().is_terminal());
    ui::set_debug_mode(cli.debug);
    emit(Level::Debug, "debug.enabled", "Debug mode is on", None);

    if let Err(e) = commands::handle_command(cli.command, cli.config.as_deref()).await {
        emit(
            Level::Error,
            "gistwall.error",
            &format!("Error: {:#}", e),
            None,
        );
        std::process::exit(1);
    }
}
