use ratatui::layout::{Alignment, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::component::Component;
use crate::tui::components::centered_fixed;
use crate::tui::theme::Theme;

/// Shown for the splash dwell after connecting.
pub struct Splash<'a> {
    pub theme: &'a Theme,
    pub version: &'a str,
}

impl<'a> Splash<'a> {
    pub fn new(theme: &'a Theme, version: &'a str) -> Self {
        Self { theme, version }
    }
}

impl Component for Splash<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut lines: Vec<Line> = self
            .theme
            .banner
            .lines()
            .map(|l| Line::from(Span::styled(l.to_string(), self.theme.accent_style())))
            .collect();
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            self.theme.app_name.clone(),
            self.theme.title_style(),
        )));
        lines.push(Line::from(Span::styled(
            format!("v{}", self.version),
            self.theme.muted_style(),
        )));

        let width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16;
        let height = lines.len() as u16;
        let target = centered_fixed(width, height, area);
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), target);
    }
}
