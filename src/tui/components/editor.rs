//! # Editor
//!
//! Side-by-side compose screen: the raw draft with line numbers on the
//! left, the markdown preview of the same text on the right.
//!
//! The text area does not wrap. It scrolls in both directions so the
//! cursor is always visible.

use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Padding, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::core::state::Editor;
use crate::tui::component::Component;
use crate::tui::markdown;
use crate::tui::theme::Theme;

/// Digits + one space.
const GUTTER_WIDTH: u16 = 5;

pub struct EditorView<'a> {
    pub editor: &'a Editor,
    pub theme: &'a Theme,
}

impl<'a> EditorView<'a> {
    pub fn new(editor: &'a Editor, theme: &'a Theme) -> Self {
        Self { editor, theme }
    }

    fn render_text_area(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::RIGHT)
            .border_style(self.theme.accent_style())
            .title(Span::styled(" Draft ", self.theme.title_style()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [gutter, text_area] =
            Layout::horizontal([Constraint::Length(GUTTER_WIDTH), Constraint::Min(1)]).areas(inner);
        if text_area.width == 0 || text_area.height == 0 {
            return;
        }

        let buffer = &self.editor.buffer;
        let (row, _) = buffer.row_col();
        let line_start = buffer.value()[..buffer.cursor()]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let cursor_x =
            u16::try_from(buffer.value()[line_start..buffer.cursor()].width()).unwrap_or(u16::MAX);
        let cursor_row = u16::try_from(row).unwrap_or(u16::MAX);

        let top = cursor_row.saturating_sub(text_area.height - 1);
        let left = cursor_x.saturating_sub(text_area.width - 1);

        let value = buffer.value();
        let line_count = value.split('\n').count();
        let numbers: Vec<Line> = (1..=line_count)
            .skip(top as usize)
            .take(gutter.height as usize)
            .map(|n| {
                let style = if n == row + 1 {
                    self.theme.accent_style()
                } else {
                    self.theme.muted_style()
                };
                Line::from(Span::styled(format!("{:>4} ", n), style))
            })
            .collect();
        frame.render_widget(Paragraph::new(numbers), gutter);

        let lines: Vec<Line> = value
            .split('\n')
            .map(|l| Line::from(Span::styled(l.to_string(), self.theme.text_style())))
            .collect();
        frame.render_widget(Paragraph::new(Text::from(lines)).scroll((top, left)), text_area);

        frame.set_cursor_position(Position::new(
            text_area.x + cursor_x - left,
            text_area.y + cursor_row - top,
        ));
    }

    fn render_preview(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(Span::styled(" Preview ", self.theme.title_style()))
            .padding(Padding::horizontal(1));
        let preview = markdown::render(self.editor.buffer.value(), self.theme);
        frame.render_widget(
            Paragraph::new(preview).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }
}

impl Component for EditorView<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);
        self.render_text_area(frame, left);
        self.render_preview(frame, right);
    }
}
