//! Terminal UI for binday: type a postcode, pick an address, see your collection days.

mod app;
mod config;
mod input;
mod logging;
mod ui;

use std::{io, path::PathBuf, sync::Arc, time::Duration as StdDuration};

use anyhow::{Context, Result};
use binday_core::service::BinDayService;
use binday_provider_itouchvision as itouchvision;
use clap::Parser;
use crossterm::{
    event::{self, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use reqwest::Client;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info};

use crate::app::{App, Effect, Outcome};
use crate::config::Settings;
use crate::input::Action;

#[derive(Debug, Parser)]
#[command(name = "binday", version, about = "Find out your waste collection day")]
struct Cli {
    /// Settings file (defaults to binday.toml in the platform config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory for log files
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    let _log_guard = logging::init(&settings.log, cli.log_dir.as_deref())?;

    // HTTP + service setup
    let client = Client::builder()
        .user_agent(concat!("binday/", env!("CARGO_PKG_VERSION")))
        .timeout(settings.request_timeout)
        .build()?;

    let plugin = itouchvision::plugin(client, settings.service.clone(), &settings.council_name);
    let service = Arc::new(BinDayService::new(plugin));
    info!(council = %service.council().name, "starting binday");

    // App state
    let app = App::new(service.council().name.clone(), settings.show_schedule_errors);

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app, service).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("binday stopped");
    res
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    service: Arc<BinDayService>,
) -> Result<()> {
    let (outcomes_tx, mut outcomes_rx) = mpsc::unbounded_channel();

    loop {
        // Apply whatever finished since the last frame
        while let Ok(outcome) = outcomes_rx.try_recv() {
            app.apply(outcome);
        }

        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            match input::handle_key_event(key, &mut app) {
                Action::Quit => break,
                Action::None => {}
                Action::Dispatch(effect) => dispatch(&service, &outcomes_tx, effect),
            }
        }
    }

    Ok(())
}

/// Run the effect on its own task; superseded results are filtered by ticket in `App`.
fn dispatch(service: &Arc<BinDayService>, outcomes: &UnboundedSender<Outcome>, effect: Effect) {
    let service = Arc::clone(service);
    let outcomes = outcomes.clone();

    tokio::spawn(async move {
        let outcome = app::run_effect(&service, effect).await;
        if outcomes.send(outcome).is_err() {
            debug!("UI closed before the lookup finished");
        }
    });
}
