//! # Actions
//!
//! Everything that can happen to a session becomes an `Action`.
//! User presses a key? That's `Action::Key(key)`.
//! The store answers? That's `Action::Completed { seq, result }`.
//!
//! The `update()` function takes the current session and an action,
//! mutates the session and returns the effects to run next. No I/O here:
//! effects are descriptors that the gateway executes.
//!
//! ```text
//! Session + Action  →  update()  →  Session' + [Effect]
//! ```
//!
//! Every effect carries the sequence number it was issued under. A
//! completion is applied only if its sequence is still the one the session
//! is waiting for, so a slow answer can never land on a session that has
//! moved on.

use std::fmt;

use log::{debug, info};

use crate::core::note::{Credentials, Note, UserId};
use crate::core::state::{
    Detail, Editor, LoginField, LoginForm, Screen, Session, Status, TerminalSize, View,
};

/// Transport-neutral key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    /// Control chord, always lowercase (`Ctrl('c')`).
    Ctrl(char),
    Enter,
    Tab,
    BackTab,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Esc,
}

/// Mouse wheel movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wheel {
    Up,
    Down,
}

/// Longest draft the editor accepts, in characters.
pub const MAX_DRAFT_CHARS: usize = 10_000;
/// Longest username or password accepted, in characters.
pub const MAX_FIELD_CHARS: usize = 256;
/// Detail lines moved per wheel notch.
const WHEEL_STEP: u16 = 3;

/// Storage could not be reached or answered with an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendUnavailable {
    pub reason: String,
}

impl BackendUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for BackendUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "backend unavailable: {}", self.reason)
    }
}

impl std::error::Error for BackendUnavailable {}

/// Outcome of an effect, delivered back as [`Action::Completed`].
#[derive(Debug, Clone, PartialEq)]
pub enum EffectResult {
    /// `Ok(None)` means the credentials were rejected.
    Auth(Result<Option<UserId>, BackendUnavailable>),
    Notes(Result<Vec<Note>, BackendUnavailable>),
    Saved(Result<(), BackendUnavailable>),
}

impl EffectResult {
    pub fn kind(&self) -> &'static str {
        match self {
            EffectResult::Auth(_) => "auth",
            EffectResult::Notes(_) => "notes",
            EffectResult::Saved(_) => "save",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The splash dwell timer fired.
    SplashElapsed,
    Key(Key),
    /// Bracketed paste.
    Paste(String),
    Wheel(Wheel),
    Resize(TerminalSize),
    Completed { seq: u64, result: EffectResult },
}

/// Background work requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Authenticate { seq: u64, credentials: Credentials },
    FetchNotes { seq: u64, user: UserId },
    SaveNote { seq: u64, user: UserId, note: Note },
}

impl Effect {
    pub fn seq(&self) -> u64 {
        match self {
            Effect::Authenticate { seq, .. }
            | Effect::FetchNotes { seq, .. }
            | Effect::SaveNote { seq, .. } => *seq,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Effect::Authenticate { .. } => "authenticate",
            Effect::FetchNotes { .. } => "fetch_notes",
            Effect::SaveNote { .. } => "save_note",
        }
    }
}

/// Apply one action to the session and return the effects to launch.
pub fn update(session: &mut Session, action: Action) -> Vec<Effect> {
    if session.is_quit() {
        return Vec::new();
    }

    let before = session.screen();
    let effects = match action {
        Action::Key(Key::Ctrl('c')) => {
            quit(session, "interrupt");
            Vec::new()
        }
        Action::Resize(size) => {
            session.terminal_size = size.clamped();
            Vec::new()
        }
        Action::SplashElapsed => {
            if before == Screen::Splash {
                session.view = View::Login(LoginForm::new());
            }
            Vec::new()
        }
        Action::Completed { seq, result } => on_completed(session, seq, result),
        Action::Key(key) => on_key(session, key),
        Action::Paste(text) => {
            on_paste(session, &text);
            Vec::new()
        }
        Action::Wheel(wheel) => {
            on_wheel(session, wheel);
            Vec::new()
        }
    };

    let after = session.screen();
    if before != after {
        debug!("Screen transition: {} -> {}", before, after);
    }
    effects
}

/// By-value form of [`update`].
pub fn transition(mut session: Session, action: Action) -> (Session, Vec<Effect>) {
    let effects = update(&mut session, action);
    (session, effects)
}

fn quit(session: &mut Session, reason: &str) {
    info!("Session quitting ({})", reason);
    session.terminating = true;
    session.view = View::Quit;
}

// ============================================================================
// Keys
// ============================================================================

fn on_key(session: &mut Session, key: Key) -> Vec<Effect> {
    match session.screen() {
        // Input during the splash dwell is dropped.
        Screen::Splash | Screen::Quit => Vec::new(),
        Screen::Login => login_key(session, key),
        Screen::List => list_key(session, key),
        Screen::Editor => editor_key(session, key),
        Screen::Detail => {
            detail_key(session, key);
            Vec::new()
        }
    }
}

fn login_key(session: &mut Session, key: Key) -> Vec<Effect> {
    let View::Login(form) = &mut session.view else {
        return Vec::new();
    };

    if key == Key::Esc {
        quit(session, "login aborted");
        return Vec::new();
    }

    // At most one authentication in flight.
    if form.is_pending() {
        return Vec::new();
    }

    match key {
        Key::Tab | Key::BackTab | Key::Up | Key::Down => form.focus = form.focus.toggle(),
        Key::Enter => match form.focus {
            LoginField::Username => form.focus = LoginField::Password,
            LoginField::Password => return submit_login(session),
        },
        Key::Char(c) => {
            form.focused_mut()
                .insert_str_within(c.encode_utf8(&mut [0; 4]), MAX_FIELD_CHARS);
            form.error = None;
        }
        Key::Backspace => {
            form.focused_mut().backspace();
        }
        Key::Delete => {
            form.focused_mut().delete();
        }
        Key::Left => form.focused_mut().move_left(),
        Key::Right => form.focused_mut().move_right(),
        Key::Home => form.focused_mut().move_home(),
        Key::End => form.focused_mut().move_end(),
        _ => {}
    }
    Vec::new()
}

fn submit_login(session: &mut Session) -> Vec<Effect> {
    let credentials = match &mut session.view {
        View::Login(form) => {
            let credentials = form.credentials();
            if credentials.identifier.is_empty() {
                form.error = Some("Username is required".to_string());
                form.focus = LoginField::Username;
                return Vec::new();
            }
            credentials
        }
        _ => return Vec::new(),
    };

    let seq = session.issue_seq();
    if let View::Login(form) = &mut session.view {
        form.pending = Some(seq);
        form.error = None;
    }
    session.status = Some(Status::info("Signing in..."));
    info!(
        "Login submitted for '{}' (seq={})",
        credentials.identifier, seq
    );
    vec![Effect::Authenticate { seq, credentials }]
}

fn list_key(session: &mut Session, key: Key) -> Vec<Effect> {
    match key {
        Key::Up | Key::Char('k') => session.notes.select_prev(),
        Key::Down | Key::Char('j') => session.notes.select_next(),
        Key::Home | Key::Char('g') => session.notes.select_first(),
        Key::End | Key::Char('G') => session.notes.select_last(),
        Key::Enter | Key::Ctrl('z') => {
            if let Some(note) = session.notes.selected_note().cloned() {
                session.view = View::Detail(Detail::new(note));
            }
        }
        Key::Ctrl('a') | Key::Char('n') => session.view = View::Editor(Editor::new()),
        Key::Char('r') | Key::Ctrl('r') => {
            if let Some(user) = session.user {
                session.status = Some(Status::info("Refreshing..."));
                return vec![request_fetch(session, user)];
            }
        }
        Key::Ctrl('x') => logout(session),
        Key::Char('q') => quit(session, "quit from list"),
        _ => {}
    }
    Vec::new()
}

fn editor_key(session: &mut Session, key: Key) -> Vec<Effect> {
    let View::Editor(editor) = &mut session.view else {
        return Vec::new();
    };
    let buffer = &mut editor.buffer;

    let fits = match key {
        Key::Char(c) => buffer.insert_str_within(c.encode_utf8(&mut [0; 4]), MAX_DRAFT_CHARS),
        Key::Enter => buffer.insert_str_within("\n", MAX_DRAFT_CHARS),
        Key::Tab => buffer.insert_str_within("    ", MAX_DRAFT_CHARS),
        _ => true,
    };
    if !fits {
        session.status = Some(draft_full());
        return Vec::new();
    }

    match key {
        Key::Ctrl('e') => return submit_note(session),
        Key::Esc | Key::Ctrl('a') => session.view = View::List,
        Key::Backspace => {
            buffer.backspace();
        }
        Key::Delete => {
            buffer.delete();
        }
        Key::Left => buffer.move_left(),
        Key::Right => buffer.move_right(),
        Key::Up => {
            buffer.move_vertically(-1);
        }
        Key::Down => {
            buffer.move_vertically(1);
        }
        Key::Home => buffer.move_home(),
        Key::End => buffer.move_end(),
        _ => {}
    }
    Vec::new()
}

fn draft_full() -> Status {
    Status::error(format!("Draft is limited to {} characters", MAX_DRAFT_CHARS))
}

fn submit_note(session: &mut Session) -> Vec<Effect> {
    let note = match &session.view {
        View::Editor(editor) => Note::compose(editor.buffer.value()),
        _ => return Vec::new(),
    };
    session.view = View::List;

    let Some(user) = session.user else {
        session.status = Some(Status::error("Not signed in, note discarded"));
        return Vec::new();
    };

    let seq = session.issue_seq();
    info!("Saving note '{}' for user {} (seq={})", note.title, user, seq);
    session.status = Some(Status::info(format!("Saving \"{}\"...", note.title)));
    // Optimistic insert; a failed save is reported but never rolled back.
    session.notes.push(note.clone());
    vec![Effect::SaveNote { seq, user, note }]
}

fn detail_key(session: &mut Session, key: Key) {
    let page = session.terminal_size.height.saturating_sub(6).max(1);
    let View::Detail(detail) = &mut session.view else {
        return;
    };
    let max_scroll = detail_line_count(&detail.note);

    match key {
        Key::Esc | Key::Ctrl('z') | Key::Backspace | Key::Char('q') => {
            session.view = View::List;
        }
        Key::Up | Key::Char('k') => detail.scroll = detail.scroll.saturating_sub(1),
        Key::Down | Key::Char('j') => detail.scroll = detail.scroll.saturating_add(1).min(max_scroll),
        Key::PageUp => detail.scroll = detail.scroll.saturating_sub(page),
        Key::PageDown => detail.scroll = detail.scroll.saturating_add(page).min(max_scroll),
        Key::Home | Key::Char('g') => detail.scroll = 0,
        _ => {}
    }
}

/// Upper bound for the detail scroll offset; the renderer clamps further.
fn detail_line_count(note: &Note) -> u16 {
    let lines = note.body.lines().count() + 2;
    u16::try_from(lines).unwrap_or(u16::MAX)
}

fn on_paste(session: &mut Session, text: &str) {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    match &mut session.view {
        View::Login(form) if !form.is_pending() => {
            let single_line: String = normalized.chars().filter(|c| *c != '\n').collect();
            form.focused_mut().insert_str_within(&single_line, MAX_FIELD_CHARS);
        }
        View::Editor(editor) => {
            if !editor.buffer.insert_str_within(&normalized, MAX_DRAFT_CHARS) {
                session.status = Some(draft_full());
            }
        }
        _ => {}
    }
}

fn on_wheel(session: &mut Session, wheel: Wheel) {
    match &mut session.view {
        View::List => match wheel {
            Wheel::Up => session.notes.select_prev(),
            Wheel::Down => session.notes.select_next(),
        },
        View::Detail(detail) => {
            let max_scroll = detail_line_count(&detail.note);
            detail.scroll = match wheel {
                Wheel::Up => detail.scroll.saturating_sub(WHEEL_STEP),
                Wheel::Down => detail.scroll.saturating_add(WHEEL_STEP).min(max_scroll),
            };
        }
        _ => {}
    }
}

fn logout(session: &mut Session) {
    info!("User {:?} signed out", session.user);
    // Everything issued so far is now stale.
    session.generation = session.peek_seq();
    session.logged_in = false;
    session.user = None;
    session.pending_fetch = None;
    session.notes.clear();
    session.view = View::Login(LoginForm::new());
    session.status = Some(Status::info("Signed out"));
}

fn request_fetch(session: &mut Session, user: UserId) -> Effect {
    let seq = session.issue_seq();
    session.pending_fetch = Some(seq);
    Effect::FetchNotes { seq, user }
}

// ============================================================================
// Completions
// ============================================================================

fn on_completed(session: &mut Session, seq: u64, result: EffectResult) -> Vec<Effect> {
    if seq < session.generation {
        debug!(
            "Dropping stale {} result (seq={}, generation={})",
            result.kind(),
            seq,
            session.generation
        );
        return Vec::new();
    }

    match result {
        EffectResult::Auth(outcome) => on_auth(session, seq, outcome),
        EffectResult::Notes(outcome) => {
            on_notes(session, seq, outcome);
            Vec::new()
        }
        EffectResult::Saved(outcome) => {
            on_saved(session, seq, outcome);
            Vec::new()
        }
    }
}

fn on_auth(
    session: &mut Session,
    seq: u64,
    outcome: Result<Option<UserId>, BackendUnavailable>,
) -> Vec<Effect> {
    let form = match &mut session.view {
        View::Login(form) if form.pending == Some(seq) => form,
        _ => {
            debug!("Dropping auth result for superseded request (seq={})", seq);
            return Vec::new();
        }
    };
    form.pending = None;

    match outcome {
        Ok(Some(user)) => {
            info!("Authenticated as user {}", user);
            session.logged_in = true;
            session.user = Some(user);
            session.notes.clear();
            session.view = View::List;
            session.status = Some(Status::info("Loading notes..."));
            vec![request_fetch(session, user)]
        }
        Ok(None) => {
            info!("Authentication rejected (seq={})", seq);
            form.password.clear();
            form.focus = LoginField::Password;
            form.error = Some("Invalid username or password".to_string());
            session.status = None;
            Vec::new()
        }
        Err(err) => {
            form.error = Some("Could not reach the note store, try again".to_string());
            session.status = Some(Status::error(err.to_string()));
            Vec::new()
        }
    }
}

fn on_notes(session: &mut Session, seq: u64, outcome: Result<Vec<Note>, BackendUnavailable>) {
    if !session.logged_in || session.pending_fetch != Some(seq) {
        debug!("Dropping notes result for superseded fetch (seq={})", seq);
        return;
    }
    session.pending_fetch = None;

    match outcome {
        Ok(notes) => {
            debug!("Loaded {} notes (seq={})", notes.len(), seq);
            session.status = Some(Status::info(match notes.len() {
                1 => "1 note".to_string(),
                n => format!("{} notes", n),
            }));
            session.notes.replace(notes);
        }
        Err(err) => {
            session.notes.replace(Vec::new());
            session.status = Some(Status::error(format!("Could not load notes: {}", err)));
        }
    }
}

fn on_saved(session: &mut Session, seq: u64, outcome: Result<(), BackendUnavailable>) {
    match outcome {
        Ok(()) => {
            debug!("Save confirmed (seq={})", seq);
            session.status = Some(Status::info("Note saved"));
        }
        Err(err) => {
            session.status = Some(Status::error(format!("Save failed: {}", err)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::StatusLevel;

    fn key(k: Key) -> Action {
        Action::Key(k)
    }

    fn type_text(session: &mut Session, text: &str) {
        for c in text.chars() {
            let action = if c == '\n' {
                key(Key::Enter)
            } else {
                key(Key::Char(c))
            };
            update(session, action);
        }
    }

    fn at_login() -> Session {
        let mut session = Session::new();
        update(&mut session, Action::SplashElapsed);
        assert_eq!(session.screen(), Screen::Login);
        session
    }

    /// Submits credentials and returns the authentication seq.
    fn submit(session: &mut Session, user: &str, secret: &str) -> u64 {
        type_text(session, user);
        update(session, key(Key::Tab));
        type_text(session, secret);
        let effects = update(session, key(Key::Enter));
        match effects.as_slice() {
            [Effect::Authenticate { seq, credentials }] => {
                assert_eq!(credentials, &Credentials::new(user, secret));
                *seq
            }
            other => panic!("expected one Authenticate effect, got {:?}", other),
        }
    }

    /// Logs in as user 7 and returns (session, fetch seq).
    fn at_list() -> (Session, u64) {
        let mut session = at_login();
        let seq = submit(&mut session, "alice", "secret");
        let effects = update(
            &mut session,
            Action::Completed {
                seq,
                result: EffectResult::Auth(Ok(Some(UserId(7)))),
            },
        );
        let fetch_seq = match effects.as_slice() {
            [Effect::FetchNotes { seq, user }] => {
                assert_eq!(*user, UserId(7));
                *seq
            }
            other => panic!("expected FetchNotes, got {:?}", other),
        };
        (session, fetch_seq)
    }

    fn notes_result(seq: u64, notes: Vec<Note>) -> Action {
        Action::Completed {
            seq,
            result: EffectResult::Notes(Ok(notes)),
        }
    }

    #[test]
    fn test_splash_elapses_into_login() {
        let mut session = Session::new();
        assert!(update(&mut session, Action::SplashElapsed).is_empty());
        assert_eq!(session.screen(), Screen::Login);
    }

    #[test]
    fn test_input_during_splash_is_dropped() {
        let mut session = Session::new();
        for k in [Key::Char('x'), Key::Enter, Key::Esc, Key::Ctrl('a'), Key::Tab] {
            assert!(update(&mut session, key(k)).is_empty());
        }
        update(&mut session, Action::Paste("ignored".into()));
        assert_eq!(session.screen(), Screen::Splash);
        update(&mut session, Action::SplashElapsed);
        match &session.view {
            View::Login(form) => assert!(form.username.is_empty()),
            other => panic!("expected login, got {:?}", other),
        }
    }

    #[test]
    fn test_splash_elapsed_later_is_ignored() {
        let (mut session, _) = at_list();
        update(&mut session, Action::SplashElapsed);
        assert_eq!(session.screen(), Screen::List);
    }

    #[test]
    fn test_wrong_credentials_stay_on_login() {
        let mut session = at_login();
        let seq = submit(&mut session, "alice", "wrong");
        update(
            &mut session,
            Action::Completed {
                seq,
                result: EffectResult::Auth(Ok(None)),
            },
        );
        assert_eq!(session.screen(), Screen::Login);
        assert!(!session.logged_in);
        match &session.view {
            View::Login(form) => {
                assert!(!form.is_pending());
                assert_eq!(form.error.as_deref(), Some("Invalid username or password"));
                assert_eq!(form.username.value(), "alice");
                assert!(form.password.is_empty());
            }
            other => panic!("expected login, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_credentials_fetch_notes_in_delivered_order() {
        let (mut session, fetch_seq) = at_list();
        assert_eq!(session.screen(), Screen::List);
        assert!(session.logged_in);
        assert_eq!(session.user, Some(UserId(7)));

        let a = Note::new("NoteA", "first", "");
        let b = Note::new("NoteB", "second", "");
        update(&mut session, notes_result(fetch_seq, vec![a.clone(), b.clone()]));
        assert_eq!(session.notes.items, vec![a, b]);
        assert_eq!(session.notes.selected, Some(0));
    }

    #[test]
    fn test_empty_username_is_not_submitted() {
        let mut session = at_login();
        update(&mut session, key(Key::Tab));
        type_text(&mut session, "pw");
        let effects = update(&mut session, key(Key::Enter));
        assert!(effects.is_empty());
        match &session.view {
            View::Login(form) => {
                assert_eq!(form.focus, LoginField::Username);
                assert!(form.error.is_some());
            }
            other => panic!("expected login, got {:?}", other),
        }
    }

    #[test]
    fn test_second_submit_while_pending_is_dropped() {
        let mut session = at_login();
        submit(&mut session, "alice", "pw");
        assert!(update(&mut session, key(Key::Enter)).is_empty());
        assert!(update(&mut session, key(Key::Char('z'))).is_empty());
        match &session.view {
            View::Login(form) => assert_eq!(form.password.value(), "pw"),
            other => panic!("expected login, got {:?}", other),
        }
    }

    #[test]
    fn test_abort_while_pending_then_result_is_ignored() {
        let mut session = at_login();
        let seq = submit(&mut session, "alice", "pw");
        update(&mut session, key(Key::Esc));
        assert_eq!(session.screen(), Screen::Quit);
        assert!(session.terminating);

        let before = session.clone();
        let effects = update(
            &mut session,
            Action::Completed {
                seq,
                result: EffectResult::Auth(Ok(Some(UserId(1)))),
            },
        );
        assert!(effects.is_empty());
        assert_eq!(session, before);
    }

    #[test]
    fn test_backend_failure_on_login_is_recoverable() {
        let mut session = at_login();
        let seq = submit(&mut session, "alice", "pw");
        update(
            &mut session,
            Action::Completed {
                seq,
                result: EffectResult::Auth(Err(BackendUnavailable::new("connection refused"))),
            },
        );
        assert_eq!(session.screen(), Screen::Login);
        assert_eq!(session.status.as_ref().map(|s| s.level), Some(StatusLevel::Error));

        // The user can retry by submitting again.
        let effects = update(&mut session, key(Key::Enter));
        assert!(matches!(effects.as_slice(), [Effect::Authenticate { .. }]));
    }

    #[test]
    fn test_interrupt_quits_from_every_screen() {
        let (list, _) = at_list();
        let mut editor = list.clone();
        update(&mut editor, key(Key::Ctrl('a')));
        for mut session in [Session::new(), at_login(), list, editor] {
            update(&mut session, key(Key::Ctrl('c')));
            assert_eq!(session.screen(), Screen::Quit);
        }
    }

    #[test]
    fn test_quit_is_absorbing() {
        let mut session = at_login();
        update(&mut session, key(Key::Ctrl('c')));
        let before = session.clone();
        for action in [
            Action::SplashElapsed,
            key(Key::Enter),
            Action::Resize(TerminalSize::new(10, 10)),
            Action::Paste("x".into()),
        ] {
            assert!(update(&mut session, action).is_empty());
            assert_eq!(session, before);
        }
    }

    #[test]
    fn test_compose_and_submit_is_optimistic() {
        let (mut session, fetch_seq) = at_list();
        update(&mut session, notes_result(fetch_seq, vec![]));

        update(&mut session, key(Key::Ctrl('a')));
        assert_eq!(session.screen(), Screen::Editor);
        type_text(&mut session, "Groceries\nbuy milk\neggs\nbread");
        let effects = update(&mut session, key(Key::Ctrl('e')));

        let expected = Note::new("Groceries", "buy milk", "eggs\nbread");
        assert_eq!(session.screen(), Screen::List);
        assert_eq!(session.notes.items, vec![expected.clone()]);
        match effects.as_slice() {
            [Effect::SaveNote { user, note, .. }] => {
                assert_eq!(*user, UserId(7));
                assert_eq!(note, &expected);
            }
            other => panic!("expected SaveNote, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_save_keeps_optimistic_note() {
        let (mut session, _) = at_list();
        update(&mut session, key(Key::Char('n')));
        type_text(&mut session, "Draft");
        let effects = update(&mut session, key(Key::Ctrl('e')));
        let seq = effects[0].seq();

        let follow_up = update(
            &mut session,
            Action::Completed {
                seq,
                result: EffectResult::Saved(Err(BackendUnavailable::new("disk full"))),
            },
        );
        assert!(follow_up.is_empty());
        assert_eq!(session.notes.items, vec![Note::new("Draft", "", "")]);
        let status = session.status.expect("status should be set");
        assert_eq!(status.level, StatusLevel::Error);
        assert!(status.text.contains("disk full"));
    }

    #[test]
    fn test_editor_back_discards_draft() {
        let (mut session, _) = at_list();
        update(&mut session, key(Key::Ctrl('a')));
        type_text(&mut session, "unsaved");
        assert!(update(&mut session, key(Key::Esc)).is_empty());
        assert_eq!(session.screen(), Screen::List);
        assert!(session.notes.items.is_empty());

        update(&mut session, key(Key::Ctrl('a')));
        match &session.view {
            View::Editor(editor) => assert!(editor.buffer.is_empty()),
            other => panic!("expected editor, got {:?}", other),
        }
    }

    #[test]
    fn test_open_and_close_detail() {
        let (mut session, fetch_seq) = at_list();
        let notes = vec![Note::new("a", "", "body a"), Note::new("b", "", "body b")];
        update(&mut session, notes_result(fetch_seq, notes));
        update(&mut session, key(Key::Down));
        update(&mut session, key(Key::Enter));
        match &session.view {
            View::Detail(detail) => assert_eq!(detail.note.body, "body b"),
            other => panic!("expected detail, got {:?}", other),
        }
        update(&mut session, key(Key::Esc));
        assert_eq!(session.screen(), Screen::List);
        assert_eq!(session.notes.selected, Some(1));
    }

    #[test]
    fn test_open_with_empty_list_stays_on_list() {
        let (mut session, _) = at_list();
        update(&mut session, key(Key::Enter));
        assert_eq!(session.screen(), Screen::List);
    }

    #[test]
    fn test_resize_in_detail_keeps_screen() {
        let (mut session, fetch_seq) = at_list();
        update(&mut session, notes_result(fetch_seq, vec![Note::new("a", "", "b")]));
        update(&mut session, key(Key::Ctrl('z')));
        update(&mut session, Action::Resize(TerminalSize::new(80, 24)));
        assert_eq!(session.screen(), Screen::Detail);
        assert_eq!(session.terminal_size, TerminalSize::new(80, 24));
        update(&mut session, Action::Resize(TerminalSize::new(120, 40)));
        assert_eq!(session.terminal_size, TerminalSize::new(120, 40));
    }

    #[test]
    fn test_detail_scroll_is_bounded() {
        let (mut session, fetch_seq) = at_list();
        update(&mut session, notes_result(fetch_seq, vec![Note::new("t", "s", "1\n2\n3")]));
        update(&mut session, key(Key::Enter));
        for _ in 0..50 {
            update(&mut session, key(Key::Down));
        }
        match &session.view {
            View::Detail(detail) => assert_eq!(detail.scroll, 5),
            other => panic!("expected detail, got {:?}", other),
        }
        update(&mut session, key(Key::Home));
        match &session.view {
            View::Detail(detail) => assert_eq!(detail.scroll, 0),
            other => panic!("expected detail, got {:?}", other),
        }
    }

    #[test]
    fn test_superseded_fetch_is_discarded() {
        let (mut session, first) = at_list();
        let effects = update(&mut session, key(Key::Char('r')));
        let second = effects[0].seq();
        assert!(second > first);

        let before = session.clone();
        update(&mut session, notes_result(first, vec![Note::new("old", "", "")]));
        assert_eq!(session, before);

        update(&mut session, notes_result(second, vec![Note::new("new", "", "")]));
        assert_eq!(session.notes.items, vec![Note::new("new", "", "")]);
    }

    #[test]
    fn test_notes_arriving_while_editing_update_list_only() {
        let (mut session, fetch_seq) = at_list();
        update(&mut session, key(Key::Ctrl('a')));
        type_text(&mut session, "draft");
        update(&mut session, notes_result(fetch_seq, vec![Note::new("a", "", "")]));
        assert_eq!(session.screen(), Screen::Editor);
        assert_eq!(session.notes.items.len(), 1);
        match &session.view {
            View::Editor(editor) => assert_eq!(editor.buffer.value(), "draft"),
            other => panic!("expected editor, got {:?}", other),
        }
    }

    #[test]
    fn test_fetch_failure_yields_empty_list_and_status() {
        let (mut session, fetch_seq) = at_list();
        update(
            &mut session,
            Action::Completed {
                seq: fetch_seq,
                result: EffectResult::Notes(Err(BackendUnavailable::new("timeout"))),
            },
        );
        assert_eq!(session.screen(), Screen::List);
        assert!(session.notes.items.is_empty());
        assert_eq!(session.status.as_ref().map(|s| s.level), Some(StatusLevel::Error));
    }

    #[test]
    fn test_results_from_before_logout_are_stale() {
        let (mut session, fetch_seq) = at_list();
        update(&mut session, key(Key::Ctrl('x')));
        assert_eq!(session.screen(), Screen::Login);
        assert!(!session.logged_in);
        assert!(session.generation() > fetch_seq);

        // Log back in as someone else.
        let seq = submit(&mut session, "bob", "pw");
        update(
            &mut session,
            Action::Completed {
                seq,
                result: EffectResult::Auth(Ok(Some(UserId(9)))),
            },
        );

        // The slow fetch for alice must not leak into bob's session.
        let before = session.clone();
        update(&mut session, notes_result(fetch_seq, vec![Note::new("alice's", "", "")]));
        assert_eq!(session, before);
        assert_eq!(session.user, Some(UserId(9)));
    }

    #[test]
    fn test_paste_into_editor_normalizes_newlines() {
        let (mut session, _) = at_list();
        update(&mut session, key(Key::Ctrl('a')));
        update(&mut session, Action::Paste("a\r\nb\rc".into()));
        match &session.view {
            View::Editor(editor) => assert_eq!(editor.buffer.value(), "a\nb\nc"),
            other => panic!("expected editor, got {:?}", other),
        }
    }

    #[test]
    fn test_paste_into_login_strips_newlines() {
        let mut session = at_login();
        update(&mut session, Action::Paste("alice\n".into()));
        match &session.view {
            View::Login(form) => assert_eq!(form.username.value(), "alice"),
            other => panic!("expected login, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_resize_is_clamped() {
        let mut session = at_login();
        update(&mut session, Action::Resize(TerminalSize::new(u16::MAX, u16::MAX)));
        assert_eq!(
            session.terminal_size,
            TerminalSize::new(
                crate::core::state::MAX_TERMINAL_WIDTH,
                crate::core::state::MAX_TERMINAL_HEIGHT
            )
        );
    }

    #[test]
    fn test_paste_into_editor_stops_at_draft_limit() {
        let (mut session, _) = at_list();
        update(&mut session, key(Key::Ctrl('a')));
        update(&mut session, Action::Paste("x".repeat(MAX_DRAFT_CHARS + 500)));
        match &session.view {
            View::Editor(editor) => {
                assert_eq!(editor.buffer.value().chars().count(), MAX_DRAFT_CHARS)
            }
            other => panic!("expected editor, got {:?}", other),
        }
        assert_eq!(session.status.as_ref().map(|s| s.level), Some(StatusLevel::Error));

        // Typing past the limit is refused too.
        update(&mut session, key(Key::Char('y')));
        update(&mut session, key(Key::Enter));
        match &session.view {
            View::Editor(editor) => {
                assert_eq!(editor.buffer.value().chars().count(), MAX_DRAFT_CHARS);
                assert!(!editor.buffer.value().contains('y'));
            }
            other => panic!("expected editor, got {:?}", other),
        }

        // Deleting makes room again.
        update(&mut session, key(Key::Backspace));
        update(&mut session, key(Key::Char('y')));
        match &session.view {
            View::Editor(editor) => assert!(editor.buffer.value().ends_with('y')),
            other => panic!("expected editor, got {:?}", other),
        }
    }

    #[test]
    fn test_login_fields_are_bounded() {
        let mut session = at_login();
        update(&mut session, Action::Paste("u".repeat(MAX_FIELD_CHARS * 4)));
        type_text(&mut session, "more");
        match &session.view {
            View::Login(form) => assert_eq!(form.username.value().len(), MAX_FIELD_CHARS),
            other => panic!("expected login, got {:?}", other),
        }
    }

    #[test]
    fn test_wheel_moves_list_selection() {
        let (mut session, fetch_seq) = at_list();
        let notes = vec![Note::new("a", "", ""), Note::new("b", "", ""), Note::new("c", "", "")];
        update(&mut session, notes_result(fetch_seq, notes));
        update(&mut session, Action::Wheel(Wheel::Down));
        update(&mut session, Action::Wheel(Wheel::Down));
        update(&mut session, Action::Wheel(Wheel::Down));
        assert_eq!(session.notes.selected, Some(2));
        update(&mut session, Action::Wheel(Wheel::Up));
        assert_eq!(session.notes.selected, Some(1));
    }

    #[test]
    fn test_wheel_scrolls_detail_within_bounds() {
        let (mut session, fetch_seq) = at_list();
        update(&mut session, notes_result(fetch_seq, vec![Note::new("t", "s", "1\n2\n3")]));
        update(&mut session, key(Key::Enter));
        update(&mut session, Action::Wheel(Wheel::Down));
        match &session.view {
            View::Detail(detail) => assert_eq!(detail.scroll, 3),
            other => panic!("expected detail, got {:?}", other),
        }
        for _ in 0..10 {
            update(&mut session, Action::Wheel(Wheel::Down));
        }
        match &session.view {
            View::Detail(detail) => assert_eq!(detail.scroll, 5),
            other => panic!("expected detail, got {:?}", other),
        }
        update(&mut session, Action::Wheel(Wheel::Up));
        update(&mut session, Action::Wheel(Wheel::Up));
        match &session.view {
            View::Detail(detail) => assert_eq!(detail.scroll, 0),
            other => panic!("expected detail, got {:?}", other),
        }
    }

    #[test]
    fn test_wheel_elsewhere_changes_nothing() {
        let mut session = at_login();
        let before = session.clone();
        update(&mut session, Action::Wheel(Wheel::Down));
        assert_eq!(session, before);
    }

    #[test]
    fn test_transition_is_by_value_update() {
        let (session, effects) = transition(Session::new(), Action::SplashElapsed);
        assert!(effects.is_empty());
        assert_eq!(session.screen(), Screen::Login);
    }
}
