//! swipefeed: news articles as a swipeable card stack in the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//!  ┌───────────────┐ CoreEvent ┌───────────────┐  draw()  ┌──────────┐
//!  │ spawned tasks │ ────────► │   engine.rs   │ ───────► │  ui.rs   │
//!  │ (FeedService) │ (channel) │ store, fetch, │          │ (render) │
//!  └───────────────┘           │ derived views │          └──────────┘
//!          ▲                   └───────────────┘
//!          │ dispatch()               ▲  commit_swipe()
//!          └──────────────────────────┤
//!                              ┌──────────────┐  pointer / key  ┌──────────┐
//!                              │    app.rs    │ ◄────────────── │ input.rs │
//!                              │ card + state │                 └──────────┘
//!                              └──────────────┘
//! ```
//!
//! * **`source/`**: the `FeedService` trait, the HTTP backend client and
//!   the `Article` model.
//! * **`gesture`** / **`card`**: release classification and the per-card
//!   drag / spring-back / exit animation.
//! * **`store`**: the ordered card stack.
//! * **`coordinator`**: single-flight fetching and debounced refill when the
//!   stack drains.
//! * **`readmodel`**: stats and liked-items views refreshed per swipe.
//! * **`engine`**: owns all of the above and applies finished network calls.
//! * **`app`** / **`ui`** / **`input`**: terminal state, rendering and key /
//!   mouse mapping.
//! * **`main`**: wires everything together: parse args, set up logging and
//!   the terminal, and run the event loop.

mod app;
mod card;
mod config;
mod coordinator;
mod engine;
mod error;
mod events;
mod gesture;
mod input;
mod readmodel;
mod session;
mod source;
mod store;
mod ui;

use std::fs::File;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::App;
use config::{Cli, Config};
use engine::FeedEngine;
use session::{Session, TokenSession};
use source::HttpFeedService;

/// Target frame time; animations are advanced by the real elapsed time.
const FRAME: Duration = Duration::from_millis(16);

// ---------------------------------------------------------------------------
// Terminal lifetime
// ---------------------------------------------------------------------------

/// Raw mode, alternate screen and mouse capture for as long as the value
/// lives.  Dropping it (normally or while unwinding) restores the terminal.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the default hook prints the panic.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(info);
    }));
}

/// Logs go to a file; stdout belongs to the UI.
fn init_tracing(config: &Config) -> Result<()> {
    let file = File::create(&config.log_file)
        .with_context(|| format!("cannot open log file {}", config.log_file.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("swipefeed=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_cli(Cli::parse()).context("invalid configuration")?;
    init_tracing(&config)?;
    install_panic_hook();
    info!(api_url = %config.api_url, "starting swipefeed");

    // -- backend and core ----------------------------------------------------
    let session: Arc<dyn Session> = Arc::new(TokenSession::new(config.token.clone()));
    let service = Arc::new(HttpFeedService::new(config.api_url.clone(), session.clone()));
    let mut engine = FeedEngine::new(service, session, config.refill_debounce);
    engine.start();
    let mut app = App::new(engine, config.thresholds, config.units_per_column);

    let mut guard = TerminalGuard::new()?;

    // -- main event loop -----------------------------------------------------
    // Each iteration:
    //   1. Apply finished network calls and advance the card animation.
    //   2. Render the UI.
    //   3. Wait up to one frame for keyboard / mouse input.
    let mut last = Instant::now();
    loop {
        let now = Instant::now();
        app.tick(now - last);
        last = now;

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        // Terminal polling blocks; move this worker aside so spawned
        // requests keep running.
        if tokio::task::block_in_place(|| event::poll(FRAME))? {
            let event = event::read()?;
            input::handle_event(&mut app, event);
        }

        if app.quit {
            break;
        }
    }

    drop(guard);
    if !app.engine.session_active() {
        println!("{}", app.status);
    }
    info!("bye");
    Ok(())
}
