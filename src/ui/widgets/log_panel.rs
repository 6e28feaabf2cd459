//! Debug log overlay showing the tail of the in-memory log buffer

use crate::ui::theme::Theme;
use crate::ui::widgets::help_overlay::centered_rect;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

pub struct LogPanel<'a> {
    lines: &'a [String],
    /// Lines scrolled back from the newest
    scroll_back: usize,
    theme: &'a Theme,
}

impl<'a> LogPanel<'a> {
    #[must_use]
    pub const fn new(lines: &'a [String], scroll_back: usize, theme: &'a Theme) -> Self {
        Self {
            lines,
            scroll_back,
            theme,
        }
    }

    fn line_style(&self, line: &str) -> ratatui::style::Style {
        if line.contains("ERROR") {
            self.theme.error_style()
        } else if line.contains("WARN") {
            self.theme.notice_style(crate::browse::NoticeLevel::Warning)
        } else if line.contains("DEBUG") || line.contains("TRACE") {
            self.theme.dimmed_style()
        } else {
            self.theme.normal_style()
        }
    }
}

impl Widget for LogPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = centered_rect(90, 80, area);
        Clear.render(popup, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.cursor_style())
            .title(format!(" Log ({} lines) ", self.lines.len()));
        let inner = block.inner(popup);
        block.render(popup, buf);

        let height = inner.height as usize;
        let end = self.lines.len().saturating_sub(self.scroll_back);
        let start = end.saturating_sub(height);
        let text: Vec<Line> = self.lines[start..end]
            .iter()
            .map(|line| Line::styled(line.as_str(), self.line_style(line)))
            .collect();
        Paragraph::new(text).render(inner, buf);
    }
}
