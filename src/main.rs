// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use auth_server::{app, config::Config, logging};
use clap::{Parser, Subcommand};

/// Relational Auth - credential and session token service
#[derive(Parser)]
#[command(name = "auth-server", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gRPC server (default if no command given)
    Serve,

    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("auth-server: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config.log);

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => app::serve(config).await,
        Commands::Migrate => app::migrate(config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, code = e.error_code(), "auth-server exited with error");
            ExitCode::FAILURE
        }
    }
}
