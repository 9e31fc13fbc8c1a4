//! Light/dark theme preference and the terminal palette for each.

use std::fmt;
use std::str::FromStr;

use ratatui::style::Color;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::task::{Category, Priority};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Missing or unrecognised stored values fall back to light.
    pub fn from_stored(value: Option<&str>) -> Self {
        value
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Light => Palette::LIGHT,
            Theme::Dark => Palette::DARK,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(Error::InvalidArgument(format!(
                "unknown theme '{other}' (expected light|dark)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub surface: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub border: Color,
    pub highlight_bg: Color,
    pub success: Color,
    pub error: Color,
    pub info: Color,
    pub overdue: Color,
    pub due_today: Color,
}

impl Palette {
    pub const LIGHT: Palette = Palette {
        background: Color::Rgb(248, 250, 252),
        surface: Color::Rgb(255, 255, 255),
        text: Color::Rgb(30, 41, 59),
        muted: Color::Rgb(100, 116, 139),
        accent: Color::Rgb(99, 102, 241),
        border: Color::Rgb(203, 213, 225),
        highlight_bg: Color::Rgb(224, 231, 255),
        success: Color::Rgb(16, 185, 129),
        error: Color::Rgb(239, 68, 68),
        info: Color::Rgb(59, 130, 246),
        overdue: Color::Rgb(220, 38, 38),
        due_today: Color::Rgb(217, 119, 6),
    };

    pub const DARK: Palette = Palette {
        background: Color::Rgb(15, 23, 42),
        surface: Color::Rgb(30, 41, 59),
        text: Color::Rgb(226, 232, 240),
        muted: Color::Rgb(148, 163, 184),
        accent: Color::Rgb(129, 140, 248),
        border: Color::Rgb(71, 85, 105),
        highlight_bg: Color::Rgb(49, 46, 129),
        success: Color::Rgb(52, 211, 153),
        error: Color::Rgb(248, 113, 113),
        info: Color::Rgb(96, 165, 250),
        overdue: Color::Rgb(248, 113, 113),
        due_today: Color::Rgb(251, 191, 36),
    };

    pub fn priority(&self, priority: Priority) -> Color {
        match priority {
            Priority::High => Color::Rgb(239, 68, 68),
            Priority::Medium => Color::Rgb(245, 158, 11),
            Priority::Low => Color::Rgb(16, 185, 129),
        }
    }

    pub fn category(&self, category: Category) -> Color {
        match category {
            Category::Personal => Color::Rgb(139, 92, 246),
            Category::Work => Color::Rgb(59, 130, 246),
            Category::Shopping => Color::Rgb(16, 185, 129),
            Category::Health => Color::Rgb(236, 72, 153),
            Category::Other => Color::Rgb(107, 114, 128),
        }
    }
}
