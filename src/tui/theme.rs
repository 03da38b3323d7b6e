//! Colors, margins and banner text for every screen.
//!
//! Built once from configuration and shared read-only by all sessions.

use std::str::FromStr;

use ratatui::style::{Color, Modifier, Style};

use crate::core::config::{ConfigError, ThemeSettings};

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub accent: Color,
    pub text: Color,
    pub border: Color,
    pub muted: Color,
    pub error: Color,
    pub list_margin_x: u16,
    pub list_margin_y: u16,
    pub banner: String,
    pub app_name: String,
}

impl Theme {
    pub fn from_settings(settings: &ThemeSettings) -> Result<Self, ConfigError> {
        Ok(Self {
            accent: parse_color("accent", &settings.accent)?,
            text: parse_color("text", &settings.text)?,
            border: parse_color("border", &settings.border)?,
            muted: parse_color("muted", &settings.muted)?,
            error: Color::LightRed,
            list_margin_x: settings.list_margin_x,
            list_margin_y: settings.list_margin_y,
            banner: settings.banner.clone(),
            app_name: settings.app_name.clone(),
        })
    }

    pub fn accent_style(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn title_style(&self) -> Style {
        self.accent_style().add_modifier(Modifier::BOLD)
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn selected_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
    }
}

impl Default for Theme {
    fn default() -> Self {
        let settings = ThemeSettings::default();
        Self::from_settings(&settings).unwrap_or_else(|_| Self {
            accent: Color::Magenta,
            text: Color::White,
            border: Color::DarkGray,
            muted: Color::Gray,
            error: Color::LightRed,
            list_margin_x: settings.list_margin_x,
            list_margin_y: settings.list_margin_y,
            banner: settings.banner.clone(),
            app_name: settings.app_name.clone(),
        })
    }
}

fn parse_color(field: &str, value: &str) -> Result<Color, ConfigError> {
    Color::from_str(value.trim())
        .map_err(|_| ConfigError::Invalid(format!("theme.{field}: '{value}' is not a color")))
}
