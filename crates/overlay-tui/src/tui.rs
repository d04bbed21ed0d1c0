use std::io::{self, Stderr};
use std::time::Duration;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use futures_util::StreamExt;
use tokio::sync::mpsc;

use overlay_core::UiUpdate;

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

/// Animation frame interval for the "Thinking..." ellipsis
const ANIMATION_INTERVAL: Duration = Duration::from_millis(300);

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    /// Animation frame
    Tick,
    /// Time to check where the game window is
    Reposition,
    /// Sent by a query worker
    Update(UiUpdate),
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    updates: mpsc::UnboundedReceiver<UiUpdate>,
    _tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventHandler {
    pub fn new(reposition_interval: Duration, updates: mpsc::UnboundedReceiver<UiUpdate>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let _tx = tx.clone();

        // Spawn event reader task
        let tx_events = tx.clone();
        tokio::spawn(async move {
            let mut reader = event::EventStream::new();
            while let Some(evt) = reader.next().await {
                let Ok(evt) = evt else {
                    continue;
                };
                let app_event = match evt {
                    // Only handle key press events, not release
                    Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
                    Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
                    Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
                    _ => None,
                };

                if let Some(event) = app_event {
                    if tx_events.send(event).is_err() {
                        break;
                    }
                }
            }
        });

        Self::spawn_timer(tx.clone(), ANIMATION_INTERVAL, || AppEvent::Tick);
        Self::spawn_timer(tx, reposition_interval, || AppEvent::Reposition);

        Self { rx, updates, _tx }
    }

    fn spawn_timer(
        tx: mpsc::UnboundedSender<AppEvent>,
        period: Duration,
        make: fn() -> AppEvent,
    ) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if tx.send(make()).is_err() {
                    break;
                }
            }
        });
    }

    /// Next event for the UI loop. Worker updates arrive in the order the
    /// worker sent them.
    pub async fn next(&mut self) -> Option<AppEvent> {
        tokio::select! {
            Some(update) = self.updates.recv() => Some(AppEvent::Update(update)),
            event = self.rx.recv() => event,
        }
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stderr(), EnterAlternateScreen)?;

    // Enable mouse capture
    execute!(io::stderr(), crossterm::event::EnableMouseCapture)?;

    let backend = CrosstermBackend::new(io::stderr());
    let terminal = Terminal::new(backend)?;

    Ok(terminal)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), crossterm::event::DisableMouseCapture)?;
    execute!(io::stderr(), LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Install panic hook to restore terminal on panic
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}
