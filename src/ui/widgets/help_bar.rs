//! Help bar widget for displaying keybind hints

use crate::ui::state::{FocusPane, Mode};
use crate::ui::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// A keybind hint to display in the help bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyHint {
    /// Key combination (e.g., "Tab", "F5")
    pub key: &'static str,
    /// Action description (e.g., "focus", "refresh")
    pub action: &'static str,
}

impl KeyHint {
    #[must_use]
    pub const fn new(key: &'static str, action: &'static str) -> Self {
        Self { key, action }
    }
}

/// Hints for the current mode and focused pane
#[must_use]
pub fn hints_for(mode: Mode, focus: FocusPane) -> Vec<KeyHint> {
    match mode {
        Mode::Help => vec![KeyHint::new("any key", "close")],
        Mode::Input => vec![
            KeyHint::new("Enter", "submit"),
            KeyHint::new("Tab", "complete"),
            KeyHint::new("Esc", "cancel"),
        ],
        Mode::Log => vec![
            KeyHint::new("↑/↓", "scroll"),
            KeyHint::new("Esc", "close"),
        ],
        Mode::Normal => {
            let mut hints = vec![KeyHint::new("Tab", "focus")];
            match focus {
                FocusPane::Navigation => {
                    hints.push(KeyHint::new("Enter", "open"));
                    hints.push(KeyHint::new("→/←", "expand"));
                }
                FocusPane::Tags => hints.push(KeyHint::new("Enter", "files with tag")),
                FocusPane::Files => {
                    hints.push(KeyHint::new("Space", "mark"));
                    hints.push(KeyHint::new("a", "add tags"));
                    hints.push(KeyHint::new("d", "remove tags"));
                }
                FocusPane::Inspector => hints.push(KeyHint::new("↑/↓", "scroll")),
            }
            hints.push(KeyHint::new("F5", "refresh"));
            hints.push(KeyHint::new("?", "help"));
            hints.push(KeyHint::new("q", "quit"));
            hints
        }
    }
}

/// Help bar widget that displays keybind hints at the bottom
pub struct HelpBar<'a> {
    hints: &'a [KeyHint],
    theme: &'a Theme,
}

impl<'a> HelpBar<'a> {
    #[must_use]
    pub const fn new(hints: &'a [KeyHint], theme: &'a Theme) -> Self {
        Self { hints, theme }
    }
}

impl Widget for HelpBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = Vec::new();

        for (i, hint) in self.hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", self.theme.dimmed_style()));
            }
            spans.push(Span::styled(hint.key, self.theme.cursor_style()));
            spans.push(Span::styled(":", self.theme.dimmed_style()));
            spans.push(Span::raw(hint.action));
        }

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}
