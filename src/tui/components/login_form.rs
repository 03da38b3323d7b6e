//! # Login Form
//!
//! Banner on top, a thick-bordered form below it with the username and
//! masked password fields. The focused field gets the terminal cursor
//! unless an authentication is in flight.

use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Padding, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::core::state::{LoginField, LoginForm};
use crate::core::text_input::TextInput;
use crate::tui::component::Component;
use crate::tui::components::centered_fixed;
use crate::tui::theme::Theme;

const FORM_WIDTH: u16 = 46;
const FORM_HEIGHT: u16 = 12;
const FIELD_PREFIX: &str = "> ";
const MASK: char = '•';

pub struct LoginFormView<'a> {
    pub form: &'a LoginForm,
    pub theme: &'a Theme,
}

impl<'a> LoginFormView<'a> {
    pub fn new(form: &'a LoginForm, theme: &'a Theme) -> Self {
        Self { form, theme }
    }

    fn label(&self, text: &'static str, field: LoginField) -> Line<'static> {
        let style = if self.form.focus == field {
            self.theme.title_style()
        } else {
            self.theme.muted_style()
        };
        Line::from(Span::styled(text, style))
    }

    /// Draw one input row; returns where the cursor belongs.
    fn field(&self, frame: &mut Frame, area: Rect, input: &TextInput, masked: bool) -> Position {
        let shown = if masked {
            MASK.to_string().repeat(input.value().chars().count())
        } else {
            input.value().to_string()
        };
        let before_cursor = if masked {
            input.value()[..input.cursor()].chars().count()
        } else {
            input.value()[..input.cursor()].width()
        } as u16;

        let room = area.width.saturating_sub(FIELD_PREFIX.len() as u16 + 1);
        let offset = before_cursor.saturating_sub(room);

        let [prefix_area, value_area] =
            Layout::horizontal([Constraint::Length(FIELD_PREFIX.len() as u16), Constraint::Min(0)])
                .areas(area);
        frame.render_widget(
            Paragraph::new(Span::styled(FIELD_PREFIX, self.theme.accent_style())),
            prefix_area,
        );
        frame.render_widget(
            Paragraph::new(Span::styled(shown, self.theme.text_style())).scroll((0, offset)),
            value_area,
        );
        Position::new(value_area.x + before_cursor - offset, value_area.y)
    }
}

impl Component for LoginFormView<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let banner_height = self.theme.banner.lines().count() as u16;
        let show_banner = area.height >= banner_height + 1 + FORM_HEIGHT;
        let total = if show_banner { banner_height + 1 + FORM_HEIGHT } else { FORM_HEIGHT };
        let outer = centered_fixed(FORM_WIDTH.max(banner_width(&self.theme.banner)), total, area);

        let form_area = if show_banner {
            let [banner_area, _, form_area] = Layout::vertical([
                Constraint::Length(banner_height),
                Constraint::Length(1),
                Constraint::Length(FORM_HEIGHT),
            ])
            .areas(outer);
            let banner: Vec<Line> = self
                .theme
                .banner
                .lines()
                .map(|l| Line::from(Span::styled(l.to_string(), self.theme.accent_style())).centered())
                .collect();
            frame.render_widget(Paragraph::new(banner), banner_area);
            centered_fixed(FORM_WIDTH, FORM_HEIGHT, form_area)
        } else {
            centered_fixed(FORM_WIDTH, FORM_HEIGHT, outer)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Thick)
            .border_style(self.theme.accent_style())
            .title(Line::from(format!(" {} ", self.theme.app_name)).centered())
            .title_style(self.theme.title_style())
            .padding(Padding::horizontal(1));
        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let [user_label, user_field, _, pass_label, pass_field, _, message, hint] =
            Layout::vertical([Constraint::Length(1); 8]).areas(inner);

        frame.render_widget(Paragraph::new(self.label("Username", LoginField::Username)), user_label);
        let user_cursor = self.field(frame, user_field, &self.form.username, false);
        frame.render_widget(Paragraph::new(self.label("Password", LoginField::Password)), pass_label);
        let pass_cursor = self.field(frame, pass_field, &self.form.password, true);

        let status = if self.form.is_pending() {
            Span::styled("Signing in...", self.theme.muted_style().add_modifier(Modifier::ITALIC))
        } else if let Some(error) = &self.form.error {
            Span::styled(error.clone(), self.theme.error_style())
        } else {
            Span::raw("")
        };
        frame.render_widget(Paragraph::new(status), message);
        frame.render_widget(
            Paragraph::new(Span::styled("enter submit · tab switch · esc quit", self.theme.muted_style())),
            hint,
        );

        if !self.form.is_pending() {
            let cursor = match self.form.focus {
                LoginField::Username => user_cursor,
                LoginField::Password => pass_cursor,
            };
            frame.set_cursor_position(cursor);
        }
    }
}

fn banner_width(banner: &str) -> u16 {
    banner.lines().map(UnicodeWidthStr::width).max().unwrap_or(0) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::components::buffer_text;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn draw(form: &LoginForm, width: u16, height: u16) -> (String, Terminal<TestBackend>) {
        let theme = Theme::default();
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| LoginFormView::new(form, &theme).render(f, f.area()))
            .unwrap();
        (buffer_text(terminal.backend().buffer()), terminal)
    }

    #[test]
    fn test_password_is_masked() {
        let mut form = LoginForm::new();
        form.username = TextInput::with_value("alice");
        form.password = TextInput::with_value("hunter2");
        let (text, _) = draw(&form, 80, 30);
        assert!(text.contains("alice"));
        assert!(!text.contains("hunter2"));
        assert!(text.contains("•••••••"));
    }

    #[test]
    fn test_error_and_pending_are_shown() {
        let mut form = LoginForm::new();
        form.error = Some("Invalid username or password".to_string());
        let (text, _) = draw(&form, 80, 30);
        assert!(text.contains("Invalid username or password"));

        form.error = None;
        form.pending = Some(1);
        let (text, _) = draw(&form, 80, 30);
        assert!(text.contains("Signing in..."));
    }

    #[test]
    fn test_banner_dropped_on_short_terminal() {
        let (tall, _) = draw(&LoginForm::new(), 80, 30);
        let (short, _) = draw(&LoginForm::new(), 80, 14);
        assert!(tall.contains("██╗"));
        assert!(!short.contains("██╗"));
        assert!(short.contains("Username"));
    }

    #[test]
    fn test_cursor_follows_focus() {
        let mut form = LoginForm::new();
        form.username = TextInput::with_value("bob");
        let (_, mut terminal) = draw(&form, 80, 14);
        let on_user = terminal.get_cursor_position().unwrap();

        form.focus = LoginField::Password;
        let theme = Theme::default();
        terminal
            .draw(|f| LoginFormView::new(&form, &theme).render(f, f.area()))
            .unwrap();
        let on_pass = terminal.get_cursor_position().unwrap();
        assert!(on_pass.y > on_user.y);
    }
}
