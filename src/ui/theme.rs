//! Color theme definitions for the terminal browser
//!
//! Defines colors and styles used throughout the application.

use crate::browse::NoticeLevel;
use ratatui::style::{Color, Modifier, Style};

/// Theme configuration for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    /// Background color for the row under the cursor
    pub selection_bg: Color,
    /// Foreground color for the row under the cursor
    pub selection_fg: Color,
    /// Color for the cursor indicator and focused borders
    pub cursor: Color,
    /// Color for multi-select marks
    pub marked: Color,
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub info: Color,
    /// Color for unfocused borders
    pub border: Color,
    /// Color for dimmed/inactive text
    pub dimmed: Color,
    pub tag: Color,
    /// Color for directories and section headers in the navigation tree
    pub directory: Color,
    /// Color for metadata keys
    pub key: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Create a dark theme (default)
    #[must_use]
    pub const fn dark() -> Self {
        Self {
            selection_bg: Color::Blue,
            selection_fg: Color::White,
            cursor: Color::Cyan,
            marked: Color::Green,
            success: Color::Green,
            error: Color::Red,
            warning: Color::Yellow,
            info: Color::Cyan,
            border: Color::DarkGray,
            dimmed: Color::DarkGray,
            tag: Color::Magenta,
            directory: Color::Blue,
            key: Color::Yellow,
        }
    }

    /// Style for the row under the cursor
    #[must_use]
    pub fn selected_style(&self) -> Style {
        Style::default()
            .bg(self.selection_bg)
            .fg(self.selection_fg)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn normal_style(&self) -> Style {
        Style::default()
    }

    /// Style for the cursor indicator (>)
    #[must_use]
    pub fn cursor_style(&self) -> Style {
        Style::default()
            .fg(self.cursor)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for the multi-select mark (✓)
    #[must_use]
    pub fn marked_style(&self) -> Style {
        Style::default()
            .fg(self.marked)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    #[must_use]
    pub fn focused_border_style(&self) -> Style {
        Style::default().fg(self.cursor)
    }

    #[must_use]
    pub fn focused_title_style(&self) -> Style {
        Style::default()
            .fg(self.cursor)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn unfocused_title_style(&self) -> Style {
        Style::default().fg(self.dimmed)
    }

    #[must_use]
    pub fn dimmed_style(&self) -> Style {
        Style::default().fg(self.dimmed)
    }

    #[must_use]
    pub fn tag_style(&self) -> Style {
        Style::default().fg(self.tag)
    }

    /// Style for a tag chip in the inspector
    #[must_use]
    pub fn chip_style(&self) -> Style {
        Style::default()
            .bg(self.tag)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn directory_style(&self) -> Style {
        Style::default().fg(self.directory)
    }

    #[must_use]
    pub fn section_style(&self) -> Style {
        Style::default()
            .fg(self.directory)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_style(&self) -> Style {
        Style::default().fg(self.key)
    }

    #[must_use]
    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    /// Style for a status-bar notice
    #[must_use]
    pub fn notice_style(&self, level: NoticeLevel) -> Style {
        match level {
            NoticeLevel::Info => Style::default().fg(self.success),
            NoticeLevel::Warning => Style::default().fg(self.warning),
            NoticeLevel::Error => Style::default().fg(self.error),
        }
    }

    /// Prefix for a status-bar notice
    #[must_use]
    pub const fn notice_prefix(level: NoticeLevel) -> &'static str {
        match level {
            NoticeLevel::Info => "✓ ",
            NoticeLevel::Warning => "⚠ ",
            NoticeLevel::Error => "✗ ",
        }
    }

    #[must_use]
    pub fn info_style(&self) -> Style {
        Style::default().fg(self.info)
    }
}
