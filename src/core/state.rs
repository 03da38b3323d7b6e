//! # Session State
//!
//! Everything one connected user sees, in one place. Domain logic only;
//! presentation constants live in the `tui` theme.
//!
//! ```text
//! Session
//! ├── view: View                    // active screen + its sub-state
//! │   ├── Splash
//! │   ├── Login(LoginForm)          // fields, focus, pending auth seq
//! │   ├── List
//! │   ├── Editor(Editor)            // draft buffer
//! │   ├── Detail(Detail)            // open note + scroll offset
//! │   └── Quit
//! ├── notes: NoteList               // items + selection, shared by List/Detail
//! ├── logged_in / user              // identity for the session lifetime
//! ├── terminal_size                 // last reported dimensions
//! ├── terminating                   // set once, on the way to Quit
//! ├── status: Option<Status>        // status bar line
//! └── next_seq / generation / pending_fetch   // effect sequencing
//! ```
//!
//! State changes only happen through `update(session, action)` in action.rs.

use std::fmt;

use crate::core::note::{Credentials, Note, UserId};
use crate::core::text_input::TextInput;

/// Largest viewport a session renders. Reports beyond it are clamped.
pub const MAX_TERMINAL_WIDTH: u16 = 512;
pub const MAX_TERMINAL_HEIGHT: u16 = 256;

/// Terminal dimensions in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub width: u16,
    pub height: u16,
}

impl TerminalSize {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// The same size, limited to `MAX_TERMINAL_WIDTH` x `MAX_TERMINAL_HEIGHT`.
    pub fn clamped(self) -> Self {
        Self::new(
            self.width.min(MAX_TERMINAL_WIDTH),
            self.height.min(MAX_TERMINAL_HEIGHT),
        )
    }
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

/// Which screen is active. The tag of [`View`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Splash,
    Login,
    List,
    Editor,
    Detail,
    Quit,
}

impl Screen {
    pub const ALL: [Screen; 6] = [
        Screen::Splash,
        Screen::Login,
        Screen::List,
        Screen::Editor,
        Screen::Detail,
        Screen::Quit,
    ];
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::Splash => "splash",
            Screen::Login => "login",
            Screen::List => "list",
            Screen::Editor => "editor",
            Screen::Detail => "detail",
            Screen::Quit => "quit",
        };
        f.write_str(name)
    }
}

/// The active screen together with the state only that screen owns.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Splash,
    Login(LoginForm),
    List,
    Editor(Editor),
    Detail(Detail),
    Quit,
}

impl View {
    pub fn screen(&self) -> Screen {
        match self {
            View::Splash => Screen::Splash,
            View::Login(_) => Screen::Login,
            View::List => Screen::List,
            View::Editor(_) => Screen::Editor,
            View::Detail(_) => Screen::Detail,
            View::Quit => Screen::Quit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Username,
    Password,
}

impl LoginField {
    pub fn toggle(self) -> Self {
        match self {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoginForm {
    pub username: TextInput,
    pub password: TextInput,
    pub focus: LoginField,
    /// Sequence number of the in-flight authentication, if any.
    pub pending: Option<u64>,
    pub error: Option<String>,
}

impl LoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn focused_mut(&mut self) -> &mut TextInput {
        match self.focus {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.value().trim(), self.password.value())
    }
}

/// Draft note being composed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Editor {
    pub buffer: TextInput,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The note opened from the list.
#[derive(Debug, Clone, PartialEq)]
pub struct Detail {
    pub note: Note,
    /// First visible line of the rendered body.
    pub scroll: u16,
}

impl Detail {
    pub fn new(note: Note) -> Self {
        Self { note, scroll: 0 }
    }
}

/// The user's notes plus the list cursor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoteList {
    pub items: Vec<Note>,
    pub selected: Option<usize>,
}

impl NoteList {
    /// Replace the whole list, keeping the selection in range.
    pub fn replace(&mut self, items: Vec<Note>) {
        self.items = items;
        self.selected = match (self.selected, self.items.len()) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
    }

    /// Append one note and select it.
    pub fn push(&mut self, note: Note) {
        self.items.push(note);
        self.selected = Some(self.items.len() - 1);
    }

    pub fn selected_note(&self) -> Option<&Note> {
        self.selected.and_then(|i| self.items.get(i))
    }

    pub fn select_prev(&mut self) {
        if let Some(i) = self.selected {
            self.selected = Some(i.saturating_sub(1));
        } else if !self.items.is_empty() {
            self.selected = Some(0);
        }
    }

    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let last = self.items.len() - 1;
        self.selected = Some(self.selected.map_or(0, |i| (i + 1).min(last)));
    }

    pub fn select_first(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(0);
        }
    }

    pub fn select_last(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(self.items.len() - 1);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.selected = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

/// One line of feedback for the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub text: String,
}

impl Status {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
        }
    }
}

/// One user's interactive session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub view: View,
    pub notes: NoteList,
    pub logged_in: bool,
    pub user: Option<UserId>,
    pub terminal_size: TerminalSize,
    pub terminating: bool,
    pub status: Option<Status>,
    /// Next sequence number handed to an effect.
    pub(crate) next_seq: u64,
    /// Completions issued below this sequence are stale.
    pub(crate) generation: u64,
    /// Sequence of the newest `FetchNotes`; older fetches are superseded.
    pub(crate) pending_fetch: Option<u64>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_size(TerminalSize::default())
    }

    pub fn with_size(terminal_size: TerminalSize) -> Self {
        Self {
            view: View::Splash,
            notes: NoteList::default(),
            logged_in: false,
            user: None,
            terminal_size,
            terminating: false,
            status: None,
            next_seq: 1,
            generation: 0,
            pending_fetch: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.view.screen()
    }

    pub fn is_quit(&self) -> bool {
        self.screen() == Screen::Quit
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Sequence number the next effect will carry.
    pub fn peek_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn is_fetching(&self) -> bool {
        self.pending_fetch.is_some()
    }

    pub(crate) fn issue_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
