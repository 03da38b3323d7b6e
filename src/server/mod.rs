//! # Session Supervisor
//!
//! Accepts connections and gives each one its own session task. Sessions
//! share nothing mutable: the only common piece is the `EffectGateway`
//! (and through it the store), which is safe to call from every task at
//! once.
//!
//! ```text
//! TcpListener ─accept─▶ permit? ─no──▶ "server busy" + close
//!                          │
//!                         yes
//!                          ▼
//!                 read_handshake() ─fail─▶ "no active terminal" + close
//!                          │
//!                          ▼
//!     reader task ──Action──▶ run_session() ──frames──▶ writer task
//! ```

pub mod session;
pub mod transport;

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crossterm::execute;
use crossterm::cursor::Show;
use log::{debug, info, warn};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::{Terminal, TerminalOptions, Viewport};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use uuid::Uuid;

use crate::core::config::ResolvedConfig;
use crate::store::gateway::EffectGateway;
use crate::tui::theme::Theme;
use session::{run_session, SessionSettings};
use transport::{ChannelWriter, InputDecoder, BUSY_REPLY, NOT_INTERACTIVE_REPLY};

const READ_CHUNK: usize = 1024;
/// Rendered frames waiting for the socket. A full queue ends the session.
const FRAME_BACKLOG: usize = 32;
/// Decoded actions waiting for the session loop. A full queue stops reading.
const INPUT_BACKLOG: usize = 64;
/// How long the goodbye frames get to reach the client.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything a connection task needs, shared by reference count.
struct Shared {
    gateway: EffectGateway,
    settings: SessionSettings,
    theme: Theme,
    handshake_timeout: Duration,
}

pub struct Supervisor {
    shared: Arc<Shared>,
    permits: Arc<Semaphore>,
    max_sessions: usize,
}

impl Supervisor {
    pub fn new(gateway: EffectGateway, config: &ResolvedConfig, theme: Theme) -> Self {
        Self {
            shared: Arc::new(Shared {
                gateway,
                settings: SessionSettings::from_config(config),
                theme,
                handshake_timeout: config.handshake_timeout,
            }),
            permits: Arc::new(Semaphore::new(config.max_sessions)),
            max_sessions: config.max_sessions,
        }
    }

    /// Number of sessions currently running.
    pub fn active_sessions(&self) -> usize {
        self.max_sessions - self.permits.available_permits()
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Sessions already running are left to finish on their own.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = listener.local_addr()?;
        info!(
            "Listening on {} (max {} sessions, {} store)",
            addr,
            self.max_sessions,
            self.shared.gateway.store_name()
        );
        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting connections");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!("Accept failed: {}", e);
                        continue;
                    }
                },
            };

            let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
                warn!("Rejecting {}: {} sessions already running", peer, self.max_sessions);
                tokio::spawn(reject(stream, BUSY_REPLY));
                continue;
            };

            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move {
                let id = Uuid::new_v4();
                info!("[{}] Connection from {}", id, peer);
                match handle_connection(stream, peer, id, &shared, permit).await {
                    Ok(()) => info!("[{}] Session closed", id),
                    Err(e) => warn!("[{}] Session ended with error: {}", id, e),
                }
            });
        }
        Ok(())
    }
}

async fn reject(mut stream: TcpStream, reply: &'static str) {
    let _ = stream.write_all(reply.as_bytes()).await;
    let _ = stream.shutdown().await;
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    id: Uuid,
    shared: &Shared,
    _permit: OwnedSemaphorePermit,
) -> io::Result<()> {
    stream.set_nodelay(true)?;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let request = match transport::read_handshake(&mut reader, shared.handshake_timeout).await {
        Ok(request) => request,
        Err(e) => {
            info!("[{}] Refusing {}: {}", id, peer, e);
            let _ = write_half.write_all(NOT_INTERACTIVE_REPLY.as_bytes()).await;
            let _ = write_half.shutdown().await;
            return Ok(());
        }
    };
    info!(
        "[{}] Handshake ok: term={} size={}x{}",
        id, request.term, request.size.width, request.size.height
    );

    // Frames rendered by the session go out through one writer task.
    let (frames_tx, mut frames_rx) = mpsc::channel::<Vec<u8>>(FRAME_BACKLOG);
    let mut writer = tokio::spawn(async move {
        while let Some(frame) = frames_rx.recv().await {
            if let Err(e) = write_half.write_all(&frame).await {
                debug!("Writer stopped: {}", e);
                break;
            }
        }
        let _ = write_half.shutdown().await;
    });

    // Raw input becomes actions; EOF closes the channel and ends the session.
    let (input_tx, input_rx) = mpsc::channel(INPUT_BACKLOG);
    let reader_task = tokio::spawn(async move {
        let mut decoder = InputDecoder::new();
        let mut buf = [0u8; READ_CHUNK];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    for action in decoder.feed(&buf[..n]) {
                        if input_tx.send(action).await.is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    debug!("Reader stopped: {}", e);
                    break;
                }
            }
        }
    });

    let mut backend = CrosstermBackend::new(ChannelWriter::new(frames_tx));
    transport::enter_screen(&mut backend)?;
    let viewport = Rect::new(0, 0, request.size.width, request.size.height);
    let mut terminal = Terminal::with_options(
        backend,
        TerminalOptions {
            viewport: Viewport::Fixed(viewport),
        },
    )?;

    info!("[{}] Session started", id);
    let result = run_session(
        &mut terminal,
        input_rx,
        &shared.gateway,
        &shared.settings,
        &shared.theme,
    )
    .await;
    reader_task.abort();

    let backend = terminal.backend_mut();
    let _ = execute!(backend, Show);
    let _ = transport::leave_screen(backend);
    drop(terminal);
    if tokio::time::timeout(DRAIN_TIMEOUT, &mut writer).await.is_err() {
        warn!("[{}] Client stopped reading, dropping connection", id);
        writer.abort();
    }

    let session = result?;
    info!(
        "[{}] Session finished (logged_in={}, user={:?})",
        id, session.logged_in, session.user
    );
    Ok(())
}
