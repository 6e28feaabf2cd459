//! Help overlay widget for displaying the full keybind reference

use crate::ui::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Panes",
        &[
            ("Tab", "Focus next pane"),
            ("Shift+Tab", "Focus previous pane"),
            ("↑/↓", "Move cursor / scroll"),
            ("PgUp/PgDn", "Move by a page"),
        ],
    ),
    (
        "Navigation",
        &[
            ("Enter", "Open directory or query"),
            ("→/←", "Expand / collapse"),
        ],
    ),
    ("Tags", &[("Enter", "Show files with the tag")]),
    (
        "Files",
        &[
            ("Space", "Mark / unmark file"),
            ("Esc", "Clear marks"),
            ("a", "Add tags to selection"),
            ("d", "Remove tags from selection"),
        ],
    ),
    (
        "General",
        &[
            ("F5", "Refresh"),
            ("Ctrl+L", "Show log"),
            ("F1, ?", "Toggle help"),
            ("q, Ctrl+C", "Quit"),
        ],
    ),
];

/// Help overlay widget that displays a centered help screen
pub struct HelpOverlay<'a> {
    theme: &'a Theme,
}

impl<'a> HelpOverlay<'a> {
    #[must_use]
    pub const fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }

    fn build_content(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for (title, binds) in SECTIONS {
            lines.push(Line::default());
            lines.push(Line::styled(
                format!("  {title}"),
                self.theme.cursor_style().add_modifier(Modifier::UNDERLINED),
            ));
            for &(key, desc) in *binds {
                lines.push(self.help_line(key, desc));
            }
        }

        lines.push(Line::default());
        lines.push(Line::styled(
            "  Press any key to close",
            self.theme.dimmed_style(),
        ));
        lines
    }

    fn help_line(&self, key: &str, desc: &'static str) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("  {key:<14}"), self.theme.info_style()),
            Span::raw(desc),
        ])
    }
}

/// Area of `width_percent` by `height_percent` centered in `area`
#[must_use]
pub fn centered_rect(width_percent: u16, height_percent: u16, area: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - height_percent) / 2),
        Constraint::Percentage(height_percent),
        Constraint::Percentage((100 - height_percent) / 2),
    ])
    .split(area);

    Layout::horizontal([
        Constraint::Percentage((100 - width_percent) / 2),
        Constraint::Percentage(width_percent),
        Constraint::Percentage((100 - width_percent) / 2),
    ])
    .split(popup_layout[1])[1]
}

impl Widget for HelpOverlay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup_area = centered_rect(60, 80, area);
        Clear.render(popup_area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.cursor_style())
            .title(" Help ")
            .title_alignment(Alignment::Center);

        Paragraph::new(self.build_content())
            .block(block)
            .render(popup_area, buf);
    }
}
