use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::core::state::NoteList;
use crate::tui::component::Component;
use crate::tui::theme::Theme;

/// The signed-in user's notes, inset by the theme margins.
pub struct NoteListView<'a> {
    pub notes: &'a NoteList,
    pub theme: &'a Theme,
    /// A fetch is in flight.
    pub loading: bool,
}

impl<'a> NoteListView<'a> {
    pub fn new(notes: &'a NoteList, theme: &'a Theme, loading: bool) -> Self {
        Self {
            notes,
            theme,
            loading,
        }
    }

    /// Shrink by the configured margins, keeping at least a usable core.
    fn inset(&self, area: Rect) -> Rect {
        let mx = self.theme.list_margin_x.min(area.width.saturating_sub(20) / 2);
        let my = self.theme.list_margin_y.min(area.height.saturating_sub(6));
        Rect::new(
            area.x + mx,
            area.y + my,
            area.width.saturating_sub(mx * 2),
            area.height.saturating_sub(my),
        )
    }
}

impl Component for NoteListView<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let area = self.inset(area);
        let [header, _, body] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
                .areas(area);

        let count = match self.notes.items.len() {
            1 => "1 note".to_string(),
            n => format!("{n} notes"),
        };
        let mut title = vec![
            Span::styled(" Notes ", self.theme.selected_style()),
            Span::styled(format!("  {count}"), self.theme.muted_style()),
        ];
        if self.loading {
            title.push(Span::styled("  loading…", self.theme.muted_style()));
        }
        frame.render_widget(Paragraph::new(Line::from(title)), header);

        if self.notes.items.is_empty() {
            let hint = if self.loading {
                "Loading notes..."
            } else {
                "No notes yet. Press ctrl+a to write one."
            };
            frame.render_widget(
                Paragraph::new(Span::styled(hint, self.theme.muted_style())),
                body,
            );
            return;
        }

        let items: Vec<ListItem> = self
            .notes
            .items
            .iter()
            .map(|note| {
                let title = if note.title.trim().is_empty() {
                    "(untitled)".to_string()
                } else {
                    note.title.clone()
                };
                ListItem::new(vec![
                    Line::from(Span::styled(title, self.theme.text_style().add_modifier(Modifier::BOLD))),
                    Line::from(Span::styled(note.summary.clone(), self.theme.muted_style())),
                    Line::default(),
                ])
            })
            .collect();

        let list = List::new(items)
            .highlight_symbol("│ ")
            .highlight_style(self.theme.accent_style());
        let mut state = ListState::default().with_selected(self.notes.selected);
        frame.render_stateful_widget(list, body, &mut state);
    }
}
