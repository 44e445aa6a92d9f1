//! Scheduler server executable.
//!
//! # Responsibility
//! - Resolve configuration from the environment.
//! - Bootstrap logging and storage, then run the HTTP server.
//! - Map startup failures to a non-zero exit code.

use clap::Parser;
use log::error;
use scheduler_core::db::open_db;
use scheduler_core::{core_version, init_logging};
use scheduler_server::{serve, ServerConfig};
use std::process::ExitCode;

/// Task scheduler server.
///
/// Settings come from the `TODO_PORT`, `TODO_DBFILE`, `TODO_WEB_DIR`,
/// `TODO_LOG_DIR` and `TODO_LOG_LEVEL` environment variables.
#[derive(Debug, Parser)]
#[command(name = "scheduler", version = core_version(), about)]
struct Cli {}

#[tokio::main]
async fn main() -> ExitCode {
    let _cli = Cli::parse();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("scheduler: {err}");
            return ExitCode::FAILURE;
        }
    };

    // Logging failures are not fatal; the server still runs without file logs.
    if let Err(err) = init_logging(&config.log_level, &config.log_dir.to_string_lossy()) {
        eprintln!("scheduler: logging disabled: {err}");
    }

    let conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=startup module=cli status=error path={} error={err}",
                config.db_path.display()
            );
            eprintln!("scheduler: cannot open {}: {err}", config.db_path.display());
            return ExitCode::FAILURE;
        }
    };

    match serve(&config, conn).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=startup module=cli status=error error={err}");
            eprintln!("scheduler: {err}");
            ExitCode::FAILURE
        }
    }
}
