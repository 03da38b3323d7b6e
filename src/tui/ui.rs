use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use crate::core::state::{Session, View};
use crate::tui::component::Component;
use crate::tui::components::{
    centered_fixed, DetailView, EditorView, LoginFormView, NoteListView, Splash, StatusBar,
};
use crate::tui::theme::Theme;

/// Below this the layouts stop making sense.
pub const MIN_WIDTH: u16 = 46;
pub const MIN_HEIGHT: u16 = 14;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Project the session onto the frame. Reads only; same input, same cells.
pub fn draw(frame: &mut Frame, session: &Session, theme: &Theme) {
    let area = frame.area();
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        draw_too_small(frame, area, theme);
        return;
    }

    use Constraint::{Length, Min};
    let [main_area, status_area] = Layout::vertical([Min(0), Length(1)]).areas(area);

    match &session.view {
        View::Splash => Splash::new(theme, VERSION).render(frame, main_area),
        View::Login(form) => LoginFormView::new(form, theme).render(frame, main_area),
        View::List => {
            NoteListView::new(&session.notes, theme, session.is_fetching()).render(frame, main_area)
        }
        View::Editor(editor) => EditorView::new(editor, theme).render(frame, main_area),
        View::Detail(detail) => DetailView::new(detail, theme).render(frame, main_area),
        View::Quit => {
            draw_farewell(frame, area, theme);
            return;
        }
    }

    StatusBar::new(session.status.as_ref(), session.screen(), theme).render(frame, status_area);
}

fn draw_too_small(frame: &mut Frame, area: Rect, theme: &Theme) {
    let lines = vec![
        Line::from(Span::styled("Terminal too small", theme.title_style())),
        Line::from(Span::styled(
            format!("{}x{}, need {}x{}", area.width, area.height, MIN_WIDTH, MIN_HEIGHT),
            theme.muted_style(),
        )),
    ];
    let target = centered_fixed(area.width, 2, area);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        target,
    );
}

fn draw_farewell(frame: &mut Frame, area: Rect, theme: &Theme) {
    let target = centered_fixed(area.width, 1, area);
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!("Goodbye from {}.", theme.app_name),
            theme.accent_style(),
        ))
        .alignment(Alignment::Center),
        target,
    );
}
