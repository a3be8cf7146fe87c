//! wellpoints - employee check-ins and rewards from the terminal.
//!
//! Signs in against the rewards backend, keeps tokens in the OS keychain
//! and talks to the API through the shared session controller.

mod cli;
mod commands;
mod navigator;

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wellpoints_core::{ApiClient, Config, KeyringStore, Route, SecureStore, Session, SessionController};

use cli::Cli;
use navigator::TerminalNavigator;

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr unless a log file is given. The returned guard must
/// live until exit so buffered file output is flushed.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_name = path
                .file_name()
                .context("Log file path has no file name")?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let log_guard = init_tracing(cli.log_file.as_deref())?;
    info!("wellpoints starting");

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_base_url = Some(url);
    }

    let store: Arc<dyn SecureStore> = Arc::new(KeyringStore::new());
    let session = Arc::new(Session::new(store));
    let api = ApiClient::with_base_url(session, config.base_url(), config.request_timeout())?;

    let navigator = Arc::new(TerminalNavigator::default());
    let controller = Arc::new(SessionController::new(api, navigator.clone()));
    // Terminal "routes" are always mounted
    controller.on_navigation_ready();
    let watcher = controller.watch_session();

    let requires_session = cli.command.requires_session();
    let result = commands::run(cli.command, &controller, &mut config).await;
    watcher.abort();

    if let Err(e) = result {
        if requires_session && navigator.last() == Some(Route::Login) {
            eprintln!("Please sign in again with `wellpoints login`.");
        }
        eprintln!("Error: {}", commands::describe_error(&e));
        tracing::debug!(error = ?e, "Command failed");
        drop(log_guard);
        std::process::exit(1);
    }

    info!("wellpoints done");
    drop(log_guard);
    Ok(())
}
