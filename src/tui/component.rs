use ratatui::layout::Rect;
use ratatui::Frame;

/// A reusable UI component.
///
/// Components receive everything they show as props (struct fields,
/// usually borrowed from the `Session` and the `Theme`) and render to a
/// `Frame` within a given `Rect`. They never mutate session state.
///
/// `render` takes `&mut self` so a component can keep per-frame scratch
/// state, such as a `ListState` or a `ScrollViewState`, while drawing.
pub trait Component {
    /// Render the component into the given area.
    fn render(&mut self, frame: &mut Frame, area: Rect);
}
