use anyhow::Result;

mod app;
mod handler;
mod host;
mod logging;
mod tui;
mod ui;

use app::App;
use overlay_core::{Config, UpdateSink};
use tui::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = logging::init_or_warn(Config::app_dir());

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("could not load config, using defaults: {e:#}");
        Config::new()
    });
    tracing::info!(
        provider = ?config.provider,
        model = ?config.default_model,
        "starting overlay"
    );

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &config).await;

    tui::restore()?;
    if let Err(e) = &result {
        tracing::error!("overlay exited with error: {e:#}");
    }
    result
}

async fn run(terminal: &mut tui::Tui, config: &Config) -> Result<()> {
    let (width, height) = crossterm::terminal::size()?;
    let (updates, updates_rx) = UpdateSink::channel();

    let mut app = App::new(config, updates, width, height);
    let mut events = EventHandler::new(config.update_interval(), updates_rx);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event),
            None => break,
        }
    }

    tracing::info!("overlay closed");
    Ok(())
}
