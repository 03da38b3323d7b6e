//! # Transport
//!
//! Byte-level plumbing between a raw connection and a session:
//!
//! - the pty handshake that every connection must open with,
//! - [`InputDecoder`], which turns terminal input bytes into actions,
//! - [`ChannelWriter`], the `io::Write` a remote session renders into.
//!
//! ```text
//! client ──"pty-req xterm 80 24\n"──▶ read_handshake()
//! client ──raw bytes──▶ InputDecoder ──Action──▶ session loop
//! session loop ──frames──▶ ChannelWriter ──Vec<u8>──▶ writer task ──▶ client
//! ```

use std::fmt;
use std::io;
use std::time::Duration;

use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use log::debug;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;

use crate::core::action::{Action, Key, Wheel};
use crate::core::state::TerminalSize;

/// Sent to connections that do not ask for a terminal.
pub const NOT_INTERACTIVE_REPLY: &str = "no active terminal, skipping\n";

/// Sent to connections over the session limit.
pub const BUSY_REPLY: &str = "server busy, try again later\n";

const MAX_HANDSHAKE_LINE: u64 = 256;
const PASTE_START: &[u8] = b"\x1b[200~";
const PASTE_END: &[u8] = b"\x1b[201~";
/// Longest CSI parameter run accepted before the sequence is discarded.
const MAX_CSI_LEN: usize = 32;
/// Paste bytes kept per paste; the rest is discarded up to the end marker.
pub const MAX_PASTE_BYTES: usize = 64 * 1024;

// ============================================================================
// Handshake
// ============================================================================

#[derive(Debug)]
pub enum HandshakeError {
    Io(io::Error),
    /// No complete line before the deadline.
    Timeout(Duration),
    /// The first line was not a usable pty request.
    NotInteractive(String),
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::Io(e) => write!(f, "handshake I/O error: {}", e),
            HandshakeError::Timeout(limit) => {
                write!(f, "no pty request within {}s", limit.as_secs())
            }
            HandshakeError::NotInteractive(line) => write!(f, "not an interactive terminal: {:?}", line),
        }
    }
}

impl std::error::Error for HandshakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HandshakeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for HandshakeError {
    fn from(e: io::Error) -> Self {
        HandshakeError::Io(e)
    }
}

/// What the client asked for in its handshake line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtyRequest {
    pub term: String,
    pub size: TerminalSize,
}

/// Parse `pty-req <term> <cols> <rows>`.
pub fn parse_pty_request(line: &str) -> Result<PtyRequest, HandshakeError> {
    let not_interactive = || HandshakeError::NotInteractive(line.trim().to_string());
    let mut parts = line.split_whitespace();
    if parts.next() != Some("pty-req") {
        return Err(not_interactive());
    }
    let term = parts.next().ok_or_else(not_interactive)?;
    let cols: u16 = parts
        .next()
        .and_then(|v| v.parse().ok())
        .ok_or_else(not_interactive)?;
    let rows: u16 = parts
        .next()
        .and_then(|v| v.parse().ok())
        .ok_or_else(not_interactive)?;
    if parts.next().is_some() || cols == 0 || rows == 0 {
        return Err(not_interactive());
    }
    Ok(PtyRequest {
        term: term.to_string(),
        size: TerminalSize::new(cols, rows).clamped(),
    })
}

/// Read and parse the first line of a connection.
///
/// Bytes after the newline stay buffered in `reader` and belong to the
/// session's input.
pub async fn read_handshake<R>(reader: &mut R, limit: Duration) -> Result<PtyRequest, HandshakeError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let read = tokio::time::timeout(limit, async {
        (&mut *reader)
            .take(MAX_HANDSHAKE_LINE)
            .read_line(&mut line)
            .await
    })
    .await
    .map_err(|_| HandshakeError::Timeout(limit))??;

    if read == 0 || !line.ends_with('\n') {
        return Err(HandshakeError::NotInteractive(line.trim().to_string()));
    }
    parse_pty_request(&line)
}

// ============================================================================
// Input decoding
// ============================================================================

/// Incremental decoder for raw terminal input.
///
/// Feed it whatever the socket produced; it returns the complete actions
/// found so far and keeps partial sequences (a split UTF-8 character, a
/// CSI cut in half, an unfinished paste) for the next call. An ESC that
/// ends a read with nothing after it is the Esc key.
#[derive(Debug, Default)]
pub struct InputDecoder {
    pending: Vec<u8>,
    paste: Option<Vec<u8>>,
}

enum Step {
    /// Consumed `n` bytes, maybe producing an action.
    Advance(usize, Option<Action>),
    /// Consumed the paste-start marker.
    StartPaste(usize),
    /// Need more bytes.
    Incomplete,
}

impl InputDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Action> {
        self.pending.extend_from_slice(bytes);
        let mut actions = Vec::new();
        let mut pos = 0;

        while pos < self.pending.len() {
            if self.paste.is_some() {
                match self.consume_paste(pos) {
                    Some((used, text)) => {
                        pos += used;
                        actions.push(Action::Paste(text));
                        continue;
                    }
                    None => {
                        pos = self.pending.len().saturating_sub(PASTE_END.len() - 1).max(pos);
                        break;
                    }
                }
            }

            match step(&self.pending[pos..]) {
                Step::Advance(used, action) => {
                    pos += used;
                    actions.extend(action);
                }
                Step::StartPaste(used) => {
                    pos += used;
                    self.paste = Some(Vec::new());
                }
                Step::Incomplete => break,
            }
        }

        self.pending.drain(..pos);
        actions
    }

    /// Inside a paste: look for the end marker from `pos`. Bytes that
    /// cannot be part of the marker move into the paste buffer either way,
    /// up to `MAX_PASTE_BYTES`.
    fn consume_paste(&mut self, pos: usize) -> Option<(usize, String)> {
        let rest = &self.pending[pos..];
        let paste = self.paste.get_or_insert_with(Vec::new);
        if let Some(end) = find(rest, PASTE_END) {
            extend_capped(paste, &rest[..end]);
            let text = String::from_utf8_lossy(paste).into_owned();
            self.paste = None;
            return Some((end + PASTE_END.len(), text));
        }
        let keep = PASTE_END.len() - 1;
        if rest.len() > keep {
            extend_capped(paste, &rest[..rest.len() - keep]);
        }
        None
    }
}

fn extend_capped(paste: &mut Vec<u8>, bytes: &[u8]) {
    let room = MAX_PASTE_BYTES.saturating_sub(paste.len());
    if bytes.len() > room && room > 0 {
        debug!("Paste over {} bytes, discarding {} bytes", MAX_PASTE_BYTES, bytes.len() - room);
    }
    paste.extend_from_slice(&bytes[..bytes.len().min(room)]);
}

fn step(bytes: &[u8]) -> Step {
    let b = bytes[0];
    match b {
        0x1b => escape(bytes),
        b'\r' => {
            let used = if bytes.get(1) == Some(&b'\n') { 2 } else { 1 };
            Step::Advance(used, Some(Action::Key(Key::Enter)))
        }
        b'\n' => Step::Advance(1, Some(Action::Key(Key::Enter))),
        b'\t' => Step::Advance(1, Some(Action::Key(Key::Tab))),
        0x7f | 0x08 => Step::Advance(1, Some(Action::Key(Key::Backspace))),
        0x01..=0x1a => Step::Advance(1, Some(Action::Key(Key::Ctrl((b - 1 + b'a') as char)))),
        0x00 | 0x1c..=0x1f => Step::Advance(1, None),
        _ => utf8_char(bytes),
    }
}

fn escape(bytes: &[u8]) -> Step {
    match bytes.get(1) {
        None => Step::Advance(1, Some(Action::Key(Key::Esc))),
        Some(b'[') if bytes.starts_with(PASTE_START) => Step::StartPaste(PASTE_START.len()),
        Some(b'[') if bytes.get(2) == Some(&b'M') => legacy_mouse(bytes),
        Some(b'[') => csi(bytes),
        Some(b'O') => match bytes.get(2) {
            None => Step::Incomplete,
            Some(&c) => Step::Advance(3, final_key(c).map(Action::Key)),
        },
        // Alt chords are not bound; report the Esc and decode the rest.
        Some(_) => Step::Advance(1, Some(Action::Key(Key::Esc))),
    }
}

fn csi(bytes: &[u8]) -> Step {
    let body = &bytes[2..];
    let Some(end) = body.iter().position(|b| (0x40..=0x7e).contains(b)) else {
        if body.len() > MAX_CSI_LEN {
            return Step::Advance(bytes.len(), None);
        }
        return Step::Incomplete;
    };
    let params = std::str::from_utf8(&body[..end]).unwrap_or("");
    let used = 2 + end + 1;
    let action = match body[end] {
        b'~' => match params.split(';').next().unwrap_or("") {
            "1" | "7" => Some(Action::Key(Key::Home)),
            "4" | "8" => Some(Action::Key(Key::End)),
            "3" => Some(Action::Key(Key::Delete)),
            "5" => Some(Action::Key(Key::PageUp)),
            "6" => Some(Action::Key(Key::PageDown)),
            _ => None,
        },
        b't' => resize_report(params),
        b'M' | b'm' if params.starts_with('<') => sgr_mouse(&params[1..]),
        b'Z' => Some(Action::Key(Key::BackTab)),
        c => final_key(c).map(Action::Key),
    };
    if action.is_none() {
        debug!("Ignoring CSI sequence {:?}{}", params, body[end] as char);
    }
    Step::Advance(used, action)
}

/// `ESC [ 8 ; rows ; cols t`
fn resize_report(params: &str) -> Option<Action> {
    let mut parts = params.split(';');
    if parts.next() != Some("8") {
        return None;
    }
    let rows: u16 = parts.next()?.parse().ok()?;
    let cols: u16 = parts.next()?.parse().ok()?;
    if rows == 0 || cols == 0 {
        return None;
    }
    Some(Action::Resize(TerminalSize::new(cols, rows).clamped()))
}

/// `ESC [ < button ; col ; row M` (press) or `m` (release).
fn sgr_mouse(params: &str) -> Option<Action> {
    let button: u16 = params.split(';').next()?.parse().ok()?;
    wheel(button).map(Action::Wheel)
}

/// `ESC [ M` followed by three raw bytes, each offset by 32.
fn legacy_mouse(bytes: &[u8]) -> Step {
    if bytes.len() < 6 {
        return Step::Incomplete;
    }
    let button = u16::from(bytes[3].saturating_sub(32));
    Step::Advance(6, wheel(button).map(Action::Wheel))
}

/// Wheel notches only; clicks and motion are not bound.
fn wheel(button: u16) -> Option<Wheel> {
    // Shift, alt and ctrl sit in bits 2-4.
    match button & !0b1_1100 {
        64 => Some(Wheel::Up),
        65 => Some(Wheel::Down),
        _ => None,
    }
}

fn final_key(c: u8) -> Option<Key> {
    match c {
        b'A' => Some(Key::Up),
        b'B' => Some(Key::Down),
        b'C' => Some(Key::Right),
        b'D' => Some(Key::Left),
        b'H' => Some(Key::Home),
        b'F' => Some(Key::End),
        _ => None,
    }
}

fn utf8_char(bytes: &[u8]) -> Step {
    let len = match bytes[0] {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => return Step::Advance(1, None),
    };
    if bytes.len() < len {
        return Step::Incomplete;
    }
    match std::str::from_utf8(&bytes[..len]) {
        Ok(s) => Step::Advance(len, s.chars().next().map(|c| Action::Key(Key::Char(c)))),
        Err(_) => Step::Advance(1, None),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

// ============================================================================
// Output
// ============================================================================

/// `io::Write` that ships each flushed frame to the connection's writer task.
///
/// The frame queue is bounded. A flush that finds it full fails, which ends
/// the session: the client has stopped reading its output.
#[derive(Debug)]
pub struct ChannelWriter {
    buffer: Vec<u8>,
    frames: Sender<Vec<u8>>,
}

impl ChannelWriter {
    pub fn new(frames: Sender<Vec<u8>>) -> Self {
        Self {
            buffer: Vec::new(),
            frames,
        }
    }
}

impl io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let frame = std::mem::take(&mut self.buffer);
        self.frames.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => {
                io::Error::new(io::ErrorKind::WouldBlock, "client is not reading its output")
            }
            TrySendError::Closed(_) => {
                io::Error::new(io::ErrorKind::BrokenPipe, "connection writer closed")
            }
        })
    }
}

/// Switch the client into the alternate screen with bracketed paste and
/// mouse reporting on.
pub fn enter_screen<W: io::Write>(out: &mut W) -> io::Result<()> {
    execute!(out, EnterAlternateScreen, EnableBracketedPaste, EnableMouseCapture)
}

pub fn leave_screen<W: io::Write>(out: &mut W) -> io::Result<()> {
    execute!(out, DisableMouseCapture, DisableBracketedPaste, LeaveAlternateScreen)
}
