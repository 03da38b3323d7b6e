use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::core::state::{Screen, Status, StatusLevel};
use crate::tui::component::Component;
use crate::tui::theme::Theme;

/// Bottom line: latest status on the left, key hints on the right.
pub struct StatusBar<'a> {
    pub status: Option<&'a Status>,
    pub screen: Screen,
    pub theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(status: Option<&'a Status>, screen: Screen, theme: &'a Theme) -> Self {
        Self {
            status,
            screen,
            theme,
        }
    }
}

pub fn key_hints(screen: Screen) -> &'static str {
    match screen {
        Screen::Splash => "ctrl+c quit",
        Screen::Login => "tab switch · enter submit · esc quit",
        Screen::List => "↑↓ move · enter open · ctrl+a new · r refresh · ctrl+x logout · q quit",
        Screen::Editor => "ctrl+e save · esc cancel",
        Screen::Detail => "↑↓ scroll · esc back",
        Screen::Quit => "",
    }
}

impl Component for StatusBar<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let hints = key_hints(self.screen);
        let hints_width = (hints.chars().count() as u16 + 1).min(area.width / 2 + area.width / 4);
        let [left, right] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(hints_width)]).areas(area);

        if let Some(status) = self.status {
            let style = match status.level {
                StatusLevel::Info => self.theme.text_style(),
                StatusLevel::Error => self.theme.error_style(),
            };
            frame.render_widget(Paragraph::new(Span::styled(status.text.clone(), style)), left);
        }
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(hints, self.theme.muted_style())).right_aligned()),
            right,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::components::buffer_text;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn test_status_and_hints() {
        let theme = Theme::default();
        let status = Status::error("Save failed: disk full");
        let mut terminal = Terminal::new(TestBackend::new(100, 1)).unwrap();
        terminal
            .draw(|f| StatusBar::new(Some(&status), Screen::Editor, &theme).render(f, f.area()))
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Save failed: disk full"));
        assert!(text.contains("ctrl+e save"));

        let cell = terminal.backend().buffer()[(0, 0)].clone();
        assert_eq!(cell.fg, theme.error);
    }

    #[test]
    fn test_every_live_screen_has_hints() {
        for screen in Screen::ALL {
            assert_eq!(key_hints(screen).is_empty(), screen == Screen::Quit);
        }
    }
}
