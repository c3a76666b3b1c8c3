mod app;
mod auth;
mod components;
mod config;
mod db;
mod gate;
mod models;
mod router;
mod store;
mod triage;
mod tui;
mod utils;

use anyhow::{Context, Result};
use app::App;
use auth::LocalIdentityProvider;
use config::AppConfig;
use crossterm::{
    event::DisableMouseCapture,
    terminal::{self, LeaveAlternateScreen},
};
use db::SqliteStore;
use ratatui::prelude::{CrosstermBackend, Terminal};
use std::fs::OpenOptions;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;
use triage::{GeminiClient, TriageAdvisor};
use tui::Tui;

fn main() -> Result<()> {
    let config = AppConfig::from_env();
    init_tracing(&config)?;
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let _guard = CleanupGuard;

    let documents = SqliteStore::open(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    let model = GeminiClient::new(
        &config.triage_base_url,
        &config.triage_model,
        &config.triage_api_key,
        config.triage_timeout_secs,
    )?;
    let advisor = Arc::new(TriageAdvisor::new(Box::new(model)));

    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    let mut tui = Tui::new(terminal, config.tick_rate_hz);
    tui.init()?;

    let mut app = App::new(
        Box::new(LocalIdentityProvider::new()),
        Box::new(documents),
        advisor,
        config.single_session,
    );
    let res = app.run(&mut tui);

    tui.exit()?;

    if let Err(e) = res {
        tracing::error!(error = %e, "application error");
        eprintln!("Application Error: {e}");
    }
    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}

/// Sends tracing output to the log file; the terminal belongs to the UI.
fn init_tracing(config: &AppConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("opening log file {}", config.log_file.display()))?;

    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

struct CleanupGuard;

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        // Ignore errors during cleanup
        let _ = terminal::disable_raw_mode();
        let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
    }
}
