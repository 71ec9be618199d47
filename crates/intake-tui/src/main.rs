use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use intake_service::BlockingHttpSubmitter;
use intake_tui::app::{discard_pending, App};
use intake_tui::config::{Command, Config};
use intake_tui::headless;
use ratatui::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let config = Config::parse();

    match &config.command {
        Some(Command::Submit(args)) => {
            init_tracing(config.log_file.as_deref(), true)?;
            headless::run(&config, args)
        }
        None => {
            // stderr would draw over the alternate screen
            init_tracing(config.log_file.as_deref(), false)?;
            let service = BlockingHttpSubmitter::with_timeout(&config.api_url, config.timeout())
                .context("failed to create tokio runtime")?;
            info!("intake form for {}", service.endpoint());
            let app = App::new(service, config.form_context(), config.confirmation_delay());
            run_tui(app)
        }
    }
}

fn init_tracing(log_file: Option<&Path>, stderr_fallback: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if stderr_fallback => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
        None => {}
    }
    Ok(())
}

fn run_tui(app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e}");
    }

    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        terminal.draw(|frame| app.render(frame))?;

        // The Submitting frame is on screen; now block on the request.
        if app.submit_request {
            app.run_submission();
            // The submit control was disabled while the request ran.
            discard_pending(|| event::poll(Duration::ZERO), event::read)?;
            continue;
        }

        let event = if app.needs_polling() {
            if !event::poll(Duration::from_millis(100))? {
                app.tick();
                continue;
            }
            event::read()?
        } else {
            event::read()?
        };

        if let Event::Key(key) = event {
            // Ctrl+C always quits
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }
            // q quits unless we're in an input mode
            if key.code == KeyCode::Char('q') && !app.is_input_mode() {
                break;
            }
            app.handle_key(key);
        }
    }

    Ok(())
}
