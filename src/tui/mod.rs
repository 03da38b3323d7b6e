//! # TUI Adapter
//!
//! The ratatui-specific layer. Projects a `Session` onto a frame and, in
//! local mode, translates crossterm events into `core::Action` values.
//!
//! Nothing here mutates a session. `draw()` is a pure projection: the same
//! session and theme always produce the same cells, whichever backend the
//! frame belongs to (a remote connection, the local terminal or a
//! `TestBackend`).

pub mod component;
pub mod components;
pub mod event;
pub mod markdown;
pub mod theme;
mod ui;

pub use ui::{draw, MIN_HEIGHT, MIN_WIDTH};

use std::io::stdout;

use crossterm::cursor::{SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    EventStream,
};
use crossterm::execute;
use futures::StreamExt;
use log::{info, warn};
use tokio::sync::mpsc;

use crate::server::session::{run_session, SessionSettings};
use crate::store::gateway::EffectGateway;
use crate::tui::theme::Theme;

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(
            stdout(),
            EnableBracketedPaste,
            EnableMouseCapture,
            Show,
            SetCursorStyle::SteadyBlock
        )?;
        info!("Terminal modes enabled (bracketed paste, mouse, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            DisableMouseCapture,
            DisableBracketedPaste,
            SetCursorStyle::DefaultUserShape
        );
    }
}

/// Run a single session on the invoking terminal.
pub async fn run_local(
    gateway: EffectGateway,
    settings: SessionSettings,
    theme: Theme,
) -> std::io::Result<()> {
    let mut terminal = ratatui::init();
    let guard = TerminalModeGuard::new();
    if let Err(e) = &guard {
        warn!("Could not enable terminal modes: {}", e);
    }

    let (tx, rx) = mpsc::channel(64);
    let reader = tokio::spawn(async move {
        let mut events = EventStream::new();
        while let Some(next) = events.next().await {
            match next {
                Ok(terminal_event) => {
                    if let Some(action) = event::map_event(terminal_event)
                        && tx.send(action).await.is_err()
                    {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Terminal event stream failed: {}", e);
                    break;
                }
            }
        }
    });

    let result = run_session(&mut terminal, rx, &gateway, &settings, &theme).await;
    reader.abort();

    drop(guard);
    ratatui::restore();

    let session = result?;
    info!(
        "Local session ended (logged_in={}, notes={})",
        session.logged_in,
        session.notes.items.len()
    );
    Ok(())
}
