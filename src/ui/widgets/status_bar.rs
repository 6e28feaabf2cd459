//! Status bar widget: latest message on the left, context on the right

use crate::ui::state::StatusMessage;
use crate::ui::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

pub struct StatusBar<'a> {
    message: Option<&'a StatusMessage>,
    busy: bool,
    /// Label of the current navigation node
    location: Option<String>,
    files: usize,
    selected: usize,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    #[must_use]
    pub const fn new(message: Option<&'a StatusMessage>, theme: &'a Theme) -> Self {
        Self {
            message,
            busy: false,
            location: None,
            files: 0,
            selected: 0,
            theme,
        }
    }

    #[must_use]
    pub const fn busy(mut self, busy: bool) -> Self {
        self.busy = busy;
        self
    }

    #[must_use]
    pub fn location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub const fn counts(mut self, files: usize, selected: usize) -> Self {
        self.files = files;
        self.selected = selected;
        self
    }

    fn left(&self) -> Line<'static> {
        if let Some(msg) = self.message {
            let style = self.theme.notice_style(msg.level);
            return Line::from(vec![
                Span::styled(Theme::notice_prefix(msg.level), style),
                Span::styled(msg.text.clone(), style),
            ]);
        }
        if self.busy {
            return Line::styled("Loading…", self.theme.info_style());
        }
        Line::default()
    }

    fn right(&self) -> Line<'static> {
        let mut text = self.location.clone().unwrap_or_default();
        if !text.is_empty() {
            text.push_str("  ");
        }
        text.push_str(&format!("{} files", self.files));
        if self.selected > 1 {
            text.push_str(&format!(", {} selected", self.selected));
        }
        Line::styled(text, self.theme.dimmed_style())
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(" Status ");

        let inner = block.inner(area);
        block.render(area, buf);

        let [left, right] =
            Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)])
                .areas(inner);

        Paragraph::new(self.left()).render(left, buf);
        Paragraph::new(self.right())
            .alignment(ratatui::layout::Alignment::Right)
            .render(right, buf);
    }
}
