//! # Session Loop
//!
//! One cooperative loop per connected user. It owns the `Session`, waits
//! for the next thing to happen and never blocks on anything else:
//!
//! ```text
//!            ┌───────────── splash timer (once)
//!            │  ┌────────── input (keys, paste, wheel, resize)
//!            │  │  ┌─────── completions from the gateway
//!            ▼  ▼  ▼
//!          select! ──▶ update() ──▶ dispatch effects
//!                          │
//!                          └──▶ draw
//! ```
//!
//! Effects still running when the loop exits are not cancelled. Their
//! completions land on a closed channel and are dropped.

use std::io;
use std::time::Duration;

use log::{debug, info};
use ratatui::backend::Backend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use tokio::sync::mpsc::{self, Receiver};
use tokio::time;

use crate::core::action::{update, Action, Key};
use crate::core::config::ResolvedConfig;
use crate::core::state::{Session, TerminalSize};
use crate::store::gateway::EffectGateway;
use crate::tui;
use crate::tui::theme::Theme;

/// Per-session knobs taken from the resolved config.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub splash_dwell: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self {
            splash_dwell: config.splash_dwell,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            splash_dwell: Duration::from_secs(crate::core::config::DEFAULT_SPLASH_SECONDS),
        }
    }
}

/// Drive one session until it quits or its input goes away.
///
/// The initial size is the terminal's current viewport. A closed input
/// channel is treated like ctrl+c. A failed draw ends the session with
/// that error.
pub async fn run_session<B>(
    terminal: &mut Terminal<B>,
    mut input: Receiver<Action>,
    gateway: &EffectGateway,
    settings: &SessionSettings,
    theme: &Theme,
) -> io::Result<Session>
where
    B: Backend,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let area = terminal.get_frame().area();
    let mut session = Session::with_size(TerminalSize::new(area.width, area.height).clamped());
    let (completions_tx, mut completions) = mpsc::unbounded_channel();

    draw(terminal, &session, theme)?;

    let splash = time::sleep(settings.splash_dwell);
    tokio::pin!(splash);
    let mut splash_pending = true;

    while !session.is_quit() {
        let action = tokio::select! {
            _ = &mut splash, if splash_pending => {
                splash_pending = false;
                Action::SplashElapsed
            }
            next = input.recv() => match next {
                Some(action) => action,
                None => {
                    info!("Input closed, ending session");
                    Action::Key(Key::Ctrl('c'))
                }
            },
            Some(action) = completions.recv() => action,
        };

        if let Action::Resize(size) = &action {
            let size = size.clamped();
            debug!("Resize to {}x{}", size.width, size.height);
            terminal
                .resize(Rect::new(0, 0, size.width, size.height))
                .map_err(io::Error::other)?;
        }

        let effects = update(&mut session, action);
        gateway.dispatch_all(effects, &completions_tx);
        draw(terminal, &session, theme)?;
    }

    Ok(session)
}

fn draw<B>(terminal: &mut Terminal<B>, session: &Session, theme: &Theme) -> io::Result<()>
where
    B: Backend,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    terminal
        .draw(|frame| tui::draw(frame, session, theme))
        .map_err(io::Error::other)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::note::{Note, UserId};
    use crate::core::state::Screen;
    use crate::test_support::MemoryStore;
    use crate::tui::components::buffer_text;
    use ratatui::backend::TestBackend;
    use ratatui::{TerminalOptions, Viewport};
    use std::sync::Arc;
    use crate::server::transport::ChannelWriter;
    use ratatui::backend::CrosstermBackend;
    use tokio::sync::mpsc::Sender;

    fn terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        Terminal::with_options(
            TestBackend::new(width, height),
            TerminalOptions {
                viewport: Viewport::Fixed(Rect::new(0, 0, width, height)),
            },
        )
        .unwrap()
    }

    fn settings() -> SessionSettings {
        SessionSettings {
            splash_dwell: Duration::from_secs(5),
        }
    }

    fn typing(tx: &Sender<Action>, text: &str) {
        for c in text.chars() {
            let key = if c == '\n' { Key::Enter } else { Key::Char(c) };
            tx.try_send(Action::Key(key)).unwrap();
        }
    }

    fn input() -> (Sender<Action>, Receiver<Action>) {
        mpsc::channel(64)
    }

    /// The paused clock only advances once every task is idle.
    async fn settle() {
        time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_splash_dwell_then_login() {
        let gateway = EffectGateway::new(Arc::new(MemoryStore::new()), None);
        let (tx, rx) = input();
        let mut term = terminal(80, 30);

        let driver = async {
            // Dropped: the splash ignores keys.
            typing(&tx, "abc");
            time::sleep(Duration::from_secs(6)).await;
            typing(&tx, "x");
            settle().await;
            tx.try_send(Action::Key(Key::Esc)).unwrap();
        };
        let settings = settings();
        let theme = Theme::default();
        let (session, ()) = tokio::join!(
            run_session(&mut term, rx, &gateway, &settings, &theme),
            driver
        );
        let session = session.unwrap();
        assert_eq!(session.screen(), Screen::Quit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_loads_notes_in_order() {
        let store = MemoryStore::with_user("alice", "secret", 7);
        store.seed(
            7,
            vec![Note::new("NoteA", "a", ""), Note::new("NoteB", "b", "")],
        );
        let gateway = EffectGateway::new(Arc::new(store), None);
        let (tx, rx) = input();
        let mut term = terminal(80, 30);

        let driver = async {
            time::sleep(Duration::from_secs(6)).await;
            typing(&tx, "alice\nsecret\n");
            settle().await;
            tx.try_send(Action::Key(Key::Char('q'))).unwrap();
        };
        let settings = settings();
        let theme = Theme::default();
        let (session, ()) = tokio::join!(
            run_session(&mut term, rx, &gateway, &settings, &theme),
            driver
        );
        let session = session.unwrap();
        assert!(session.logged_in);
        assert_eq!(session.user, Some(UserId(7)));
        let titles: Vec<_> = session.notes.items.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, ["NoteA", "NoteB"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_while_auth_pending() {
        let store = MemoryStore::with_user("alice", "secret", 7);
        store.stall();
        let gateway = EffectGateway::new(Arc::new(store), None);
        let (tx, rx) = input();
        let mut term = terminal(80, 30);

        let driver = async move {
            time::sleep(Duration::from_secs(6)).await;
            typing(&tx, "alice\nsecret\n");
            settle().await;
            drop(tx);
        };
        let settings = settings();
        let theme = Theme::default();
        let (session, ()) = tokio::join!(
            run_session(&mut term, rx, &gateway, &settings, &theme),
            driver
        );
        let session = session.unwrap();
        assert!(session.is_quit());
        assert!(!session.logged_in);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_reaches_viewport() {
        let gateway = EffectGateway::new(Arc::new(MemoryStore::new()), None);
        let (tx, rx) = input();
        let mut term = terminal(120, 40);

        let driver = async {
            tx.try_send(Action::Resize(TerminalSize::new(80, 24))).unwrap();
            settle().await;
            tx.try_send(Action::Key(Key::Ctrl('c'))).unwrap();
        };
        let settings = settings();
        let theme = Theme::default();
        let (session, ()) = tokio::join!(
            run_session(&mut term, rx, &gateway, &settings, &theme),
            driver
        );
        assert_eq!(session.unwrap().terminal_size, TerminalSize::new(80, 24));
        assert_eq!(term.get_frame().area(), Rect::new(0, 0, 80, 24));
        assert!(buffer_text(term.backend().buffer()).contains("Goodbye"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_resize_is_clamped() {
        let gateway = EffectGateway::new(Arc::new(MemoryStore::new()), None);
        let (tx, rx) = input();
        let mut term = terminal(80, 24);

        let driver = async {
            tx.try_send(Action::Resize(TerminalSize::new(u16::MAX, u16::MAX))).unwrap();
            settle().await;
            tx.try_send(Action::Key(Key::Ctrl('c'))).unwrap();
        };
        let settings = settings();
        let theme = Theme::default();
        let (session, ()) = tokio::join!(
            run_session(&mut term, rx, &gateway, &settings, &theme),
            driver
        );
        let limit = TerminalSize::new(u16::MAX, u16::MAX).clamped();
        assert_eq!(session.unwrap().terminal_size, limit);
        assert_eq!(
            term.get_frame().area(),
            Rect::new(0, 0, limit.width, limit.height)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_ends_when_output_is_not_drained() {
        let gateway = EffectGateway::new(Arc::new(MemoryStore::new()), None);
        let (frames_tx, _frames_rx) = mpsc::channel(4);
        let mut term = Terminal::with_options(
            CrosstermBackend::new(ChannelWriter::new(frames_tx)),
            TerminalOptions {
                viewport: Viewport::Fixed(Rect::new(0, 0, 80, 24)),
            },
        )
        .unwrap();
        let (tx, rx) = input();

        let driver = async {
            time::sleep(Duration::from_secs(6)).await;
            typing(&tx, "nobody is reading");
        };
        let settings = settings();
        let theme = Theme::default();
        let (session, ()) = tokio::join!(
            run_session(&mut term, rx, &gateway, &settings, &theme),
            driver
        );
        let err = session.unwrap_err();
        assert!(err.to_string().contains("not reading"), "{err}");
    }
}
