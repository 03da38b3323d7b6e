//! # TUI Components
//!
//! One component per screen plus the status bar. All are stateless
//! wrappers: built each frame from borrowed `Session` data and the
//! `Theme`, rendered once, dropped.
//!
//! ```text
//! components/
//! ├── mod.rs          (this file, layout helpers)
//! ├── splash.rs       (banner + version)
//! ├── login_form.rs   (username/password form)
//! ├── note_list.rs    (the user's notes)
//! ├── editor.rs       (draft + live preview)
//! ├── detail.rs       (one note, scrollable)
//! └── status_bar.rs   (status line + key hints)
//! ```

pub mod detail;
pub mod editor;
pub mod login_form;
pub mod note_list;
pub mod splash;
pub mod status_bar;

pub use detail::DetailView;
pub use editor::EditorView;
pub use login_form::LoginFormView;
pub use note_list::NoteListView;
pub use splash::Splash;
pub use status_bar::StatusBar;

use ratatui::layout::{Constraint, Flex, Layout, Rect};

/// Compute a centered rect using percentage of the outer rect.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, outer: Rect) -> Rect {
    let [_, center_v, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center_v);
    center
}

/// A `width` x `height` rect centered in `outer`, shrunk to fit.
pub(crate) fn centered_fixed(width: u16, height: u16, outer: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(outer.height))])
        .flex(Flex::Center)
        .areas(outer);
    let [area] = Layout::horizontal([Constraint::Length(width.min(outer.width))])
        .flex(Flex::Center)
        .areas(row);
    area
}

#[cfg(test)]
pub(crate) fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
    let area = buffer.area;
    let mut out = String::new();
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_fixed_fits_and_centers() {
        let outer = Rect::new(0, 0, 80, 24);
        let inner = centered_fixed(40, 10, outer);
        assert_eq!(inner, Rect::new(20, 7, 40, 10));

        let clipped = centered_fixed(200, 50, outer);
        assert_eq!(clipped, outer);
    }
}
