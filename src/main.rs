//! HostPilot - property management dashboard in the terminal
//!
//! A terminal UI that shows portfolio stats, properties, bookings, and tasks
//! from the HostPilot API, painting cached data first and refreshing it in
//! the background.

mod app;
mod ui;

use std::io;
use std::panic;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use app::App;
use hostpilot::api::ApiClient;
use hostpilot::cache::CacheContext;
use hostpilot::cli::{Cli, StartupConfig};
use hostpilot::logging;
use hostpilot::refresh::RefreshHandle;

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Validate before touching the terminal so errors print normally
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    match logging::init(config.log_file.as_deref(), &config.log_level) {
        Ok(Some(path)) => tracing::info!("Logging to {}", path.display()),
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: could not set up logging: {}", e);
            process::exit(1);
        }
    }

    let client = match &config.session {
        Some(session) => ApiClient::with_session(config.api_url.as_str(), session)?,
        None => ApiClient::new(config.api_url.as_str())?,
    };
    tracing::info!("Using API at {}", client.base_url());

    let cache = CacheContext::new(Arc::new(client));
    let refresh_handle = RefreshHandle::spawn(cache.clone(), config.refresh.clone());

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Mounting paints from cache and starts the first loads
    let mut app = App::new(cache, config.refetch_interval);

    // Main event loop
    let result = loop {
        if let Err(e) = terminal.draw(|f| ui::render(f, &app)) {
            break Err(e);
        }

        // Poll for keyboard events with 100ms timeout
        match event::poll(Duration::from_millis(100)) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Ok(_) => {}
                Err(e) => break Err(e),
            },
            Ok(false) => {}
            Err(e) => break Err(e),
        }

        app.process_refresh_request();

        // Check if we should quit
        if app.should_quit {
            break Ok(());
        }
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    refresh_handle.shutdown().await;
    tracing::info!("Shutting down");

    result?;
    Ok(())
}
