use ratatui::layout::{Position, Rect, Size};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Wrap};
use ratatui::Frame;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::state::Detail;
use crate::tui::component::Component;
use crate::tui::components::centered_rect;
use crate::tui::markdown;
use crate::tui::theme::Theme;

/// One note in a centered thick-bordered panel.
///
/// The session's scroll offset is clamped here, once the wrapped height
/// of the body at the current width is known.
pub struct DetailView<'a> {
    pub detail: &'a Detail,
    pub theme: &'a Theme,
}

impl<'a> DetailView<'a> {
    pub fn new(detail: &'a Detail, theme: &'a Theme) -> Self {
        Self { detail, theme }
    }

    fn content(&self) -> Text<'static> {
        let note = &self.detail.note;
        let mut lines = Vec::new();
        if !note.summary.is_empty() {
            lines.push(Line::from(Span::styled(
                note.summary.clone(),
                self.theme.muted_style().add_modifier(Modifier::ITALIC),
            )));
            lines.push(Line::default());
        }
        lines.extend(markdown::render(&note.body, self.theme).lines);
        Text::from(lines)
    }
}

impl Component for DetailView<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let panel = centered_rect(80, 86, area);
        frame.render_widget(Clear, panel);

        let title = if self.detail.note.title.trim().is_empty() {
            "(untitled)".to_string()
        } else {
            self.detail.note.title.clone()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Thick)
            .border_style(self.theme.accent_style())
            .title(Line::from(Span::styled(format!(" {title} "), self.theme.title_style())))
            .padding(Padding::horizontal(1));
        let inner = block.inner(panel);
        frame.render_widget(block, panel);
        if inner.width < 2 || inner.height == 0 {
            return;
        }

        // Last column belongs to the scrollbar.
        let width = inner.width - 1;
        let paragraph = Paragraph::new(self.content()).wrap(Wrap { trim: false });
        let height = (paragraph.line_count(width) as u16).max(1);
        let offset = self.detail.scroll.min(height.saturating_sub(inner.height));

        let mut scroll_view = ScrollView::new(Size::new(width, height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);
        scroll_view.render_widget(paragraph, Rect::new(0, 0, width, height));

        let mut state = ScrollViewState::default();
        state.set_offset(Position { x: 0, y: offset });
        frame.render_stateful_widget(scroll_view, inner, &mut state);
    }
}
