//! Markdown → ratatui `Text` for note bodies and the editor preview.
//!
//! Walks `pulldown_cmark` events and emits styled lines in the theme's
//! colors. Fenced code with a known language is highlighted with syntect;
//! HTML, tables and images are dropped.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::tui::theme::Theme;

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static HIGHLIGHT_THEMES: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const CODE_THEME: &str = "base16-ocean.dark";

/// Render `content` in the theme's palette. Output owns its strings.
pub fn render(content: &str, theme: &Theme) -> Text<'static> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);

    let mut renderer = Renderer::new(theme);
    for event in Parser::new_ext(content, opts) {
        renderer.event(event);
    }
    renderer.finish()
}

/// Where text inside a fenced block goes.
enum CodeMode {
    Highlighted(HighlightLines<'static>),
    Plain,
}

struct Renderer {
    lines: Vec<Line<'static>>,
    text: Color,
    accent: Color,
    muted: Color,
    /// Inline styles, innermost last. Each entry is already merged with its parent.
    inline: Vec<Style>,
    /// Prepended to every new line (quote bars, code gutter).
    gutters: Vec<Span<'static>>,
    /// One entry per open list: `None` bullets, `Some(n)` next number.
    lists: Vec<Option<u64>>,
    code: Option<CodeMode>,
    pending_link: Option<String>,
    /// A block just closed; the next block starts after a blank line.
    gap: bool,
}

impl Renderer {
    fn new(theme: &Theme) -> Self {
        Self {
            lines: Vec::new(),
            text: theme.text,
            accent: theme.accent,
            muted: theme.muted,
            inline: Vec::new(),
            gutters: Vec::new(),
            lists: Vec::new(),
            code: None,
            pending_link: None,
            gap: false,
        }
    }

    fn finish(self) -> Text<'static> {
        Text::from(self.lines)
    }

    fn current(&self) -> Style {
        self.inline
            .last()
            .copied()
            .unwrap_or_else(|| Style::default().fg(self.text))
    }

    fn push_inline(&mut self, style: Style) {
        let merged = self.current().patch(style);
        self.inline.push(merged);
    }

    fn new_line(&mut self, spans: Vec<Span<'static>>) {
        let mut all = self.gutters.clone();
        all.extend(spans);
        self.lines.push(Line::from(all));
    }

    fn append(&mut self, span: Span<'static>) {
        match self.lines.last_mut() {
            Some(line) => line.spans.push(span),
            None => self.new_line(vec![span]),
        }
    }

    fn start_block(&mut self) {
        if self.gap {
            self.new_line(Vec::new());
            self.gap = false;
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(tag) => self.close(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                let style = Style::default().fg(self.accent).add_modifier(Modifier::BOLD);
                self.append(Span::styled(code.to_string(), style));
            }
            Event::SoftBreak => self.append(Span::raw(" ")),
            Event::HardBreak => self.new_line(Vec::new()),
            Event::Rule => {
                self.start_block();
                self.new_line(vec![Span::styled("─".repeat(32), Style::default().fg(self.muted))]);
                self.gap = true;
            }
            Event::TaskListMarker(done) => {
                self.append(Span::raw(if done { "[x] " } else { "[ ] " }));
            }
            _ => {}
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.start_block();
                self.new_line(Vec::new());
            }
            Tag::Heading { level, .. } => {
                self.start_block();
                let style = self.heading(level);
                self.new_line(vec![Span::styled(format!("{} ", "#".repeat(level as usize)), style)]);
                self.inline.push(style);
            }
            Tag::BlockQuote(_) => {
                self.start_block();
                self.gutters.push(Span::styled("▌ ", Style::default().fg(self.accent)));
                self.push_inline(Style::default().add_modifier(Modifier::ITALIC));
            }
            Tag::CodeBlock(kind) => {
                self.start_block();
                let lang = match &kind {
                    CodeBlockKind::Fenced(lang) => lang.trim().to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                let frame = Style::default().fg(self.muted);
                let header = if lang.is_empty() { "┌─".to_string() } else { format!("┌─ {lang}") };
                self.new_line(vec![Span::styled(header, frame)]);
                self.gutters.push(Span::styled("│ ", frame));

                let syntax = (!lang.is_empty())
                    .then(|| SYNTAXES.find_syntax_by_token(&lang))
                    .flatten();
                self.code = Some(match (syntax, HIGHLIGHT_THEMES.themes.get(CODE_THEME)) {
                    (Some(syntax), Some(code_theme)) => {
                        CodeMode::Highlighted(HighlightLines::new(syntax, code_theme))
                    }
                    _ => CodeMode::Plain,
                });
            }
            Tag::List(first) => {
                if self.lists.is_empty() {
                    self.start_block();
                }
                self.lists.push(first);
            }
            Tag::Item => {
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.new_line(vec![Span::styled(marker, Style::default().fg(self.accent))]);
            }
            Tag::Emphasis => self.push_inline(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_inline(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_inline(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.pending_link = Some(dest_url.to_string());
                self.push_inline(Style::default().fg(self.accent).add_modifier(Modifier::UNDERLINED));
            }
            _ => {}
        }
    }

    fn close(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.gap = true,
            TagEnd::Heading(_) => {
                self.inline.pop();
                self.gap = true;
            }
            TagEnd::BlockQuote(_) => {
                self.gutters.pop();
                self.inline.pop();
                self.gap = true;
            }
            TagEnd::CodeBlock => {
                self.code = None;
                self.gutters.pop();
                self.new_line(vec![Span::styled("└─", Style::default().fg(self.muted))]);
                self.gap = true;
            }
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.gap = true;
                }
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.inline.pop();
            }
            TagEnd::Link => {
                self.inline.pop();
                if let Some(url) = self.pending_link.take() {
                    self.append(Span::styled(format!(" <{url}>"), Style::default().fg(self.muted)));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, raw: &str) {
        // ratatui gives tabs zero width
        let text = raw.replace('\t', "    ");

        match self.code.take() {
            Some(CodeMode::Highlighted(mut highlighter)) => {
                for source_line in LinesWithEndings::from(&text) {
                    let spans = match highlighter.highlight_line(source_line, &SYNTAXES) {
                        Ok(ranges) => ranges
                            .into_iter()
                            .map(|(style, piece)| {
                                let fg = style.foreground;
                                Span::styled(
                                    piece.trim_end_matches('\n').to_string(),
                                    Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b)),
                                )
                            })
                            .filter(|span| !span.content.is_empty())
                            .collect(),
                        Err(_) => vec![Span::raw(source_line.trim_end_matches('\n').to_string())],
                    };
                    self.new_line(spans);
                }
                self.code = Some(CodeMode::Highlighted(highlighter));
            }
            Some(CodeMode::Plain) => {
                for source_line in text.lines() {
                    self.new_line(vec![Span::styled(
                        source_line.to_string(),
                        Style::default().fg(self.text),
                    )]);
                }
                self.code = Some(CodeMode::Plain);
            }
            None => {
                let style = self.current();
                self.append(Span::styled(text, style));
            }
        }
    }

    fn heading(&self, level: HeadingLevel) -> Style {
        let base = Style::default().fg(self.accent).add_modifier(Modifier::BOLD);
        match level {
            HeadingLevel::H1 => base.add_modifier(Modifier::UNDERLINED),
            HeadingLevel::H2 => base,
            _ => base.add_modifier(Modifier::ITALIC),
        }
    }
}
