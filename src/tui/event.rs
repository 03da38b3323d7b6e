//! crossterm events → core actions, for sessions on a local terminal.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};

use crate::core::action::{Action, Key, Wheel};
use crate::core::state::TerminalSize;

/// Translate one terminal event; `None` for events the session ignores.
pub fn map_event(event: Event) -> Option<Action> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => map_key(key).map(Action::Key),
        Event::Paste(data) => Some(Action::Paste(data)),
        Event::Mouse(mouse) => map_mouse(mouse).map(Action::Wheel),
        Event::Resize(width, height) => Some(Action::Resize(TerminalSize::new(width, height))),
        _ => None,
    }
}

/// Wheel notches only.
pub fn map_mouse(mouse: MouseEvent) -> Option<Wheel> {
    match mouse.kind {
        MouseEventKind::ScrollUp => Some(Wheel::Up),
        MouseEventKind::ScrollDown => Some(Wheel::Down),
        _ => None,
    }
}

pub fn map_key(key: KeyEvent) -> Option<Key> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let mapped = match key.code {
        KeyCode::Char(c) if ctrl => Key::Ctrl(c.to_ascii_lowercase()),
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Esc => Key::Esc,
        _ => return None,
    };
    log::debug!("Key event: {:?} with modifiers {:?}", key.code, key.modifiers);
    Some(mapped)
}
