//! Tag list widget: every tag known to the backend

use crate::browse::{PaneState, TagSet};
use crate::ui::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};

/// Cursor over the tag list
#[derive(Debug, Clone, Default)]
pub struct TagListState {
    pub selected: usize,
    pub scroll_offset: usize,
}

impl TagListState {
    pub const fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub const fn move_down(&mut self, len: usize) {
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    /// Keep the cursor inside a list of `len` tags
    pub const fn clamp(&mut self, len: usize) {
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    /// Tag under the cursor
    #[must_use]
    pub fn current<'t>(&self, tags: &'t TagSet) -> Option<&'t String> {
        tags.iter().nth(self.selected)
    }
}

pub struct TagList<'a> {
    tags: &'a TagSet,
    pane: &'a PaneState,
    state: &'a mut TagListState,
    theme: &'a Theme,
    block: Option<Block<'a>>,
    focused: bool,
}

impl<'a> TagList<'a> {
    #[must_use]
    pub const fn new(
        tags: &'a TagSet,
        pane: &'a PaneState,
        state: &'a mut TagListState,
        theme: &'a Theme,
    ) -> Self {
        Self {
            tags,
            pane,
            state,
            theme,
            block: None,
            focused: false,
        }
    }

    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    #[must_use]
    pub const fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for TagList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = self.block.as_ref().map_or(area, |b| {
            let inner = b.inner(area);
            b.clone().render(area, buf);
            inner
        });
        if area.height == 0 {
            return;
        }

        match self.pane {
            PaneState::Loading if self.tags.is_empty() => {
                Paragraph::new(Span::styled("Loading…", self.theme.dimmed_style()))
                    .render(area, buf);
                return;
            }
            PaneState::Failed(message) => {
                Paragraph::new(Span::styled(message.as_str(), self.theme.error_style()))
                    .render(area, buf);
                return;
            }
            _ if self.tags.is_empty() => {
                Paragraph::new(Span::styled("No tags", self.theme.dimmed_style()))
                    .render(area, buf);
                return;
            }
            _ => {}
        }

        let visible_height = area.height as usize;
        let state = self.state;
        if state.selected < state.scroll_offset {
            state.scroll_offset = state.selected;
        } else if state.selected >= state.scroll_offset + visible_height {
            state.scroll_offset = state.selected.saturating_sub(visible_height - 1);
        }

        for (i, tag) in self
            .tags
            .iter()
            .enumerate()
            .skip(state.scroll_offset)
            .take(visible_height)
        {
            let is_cursor = i == state.selected;
            let style = if is_cursor && self.focused {
                self.theme.selected_style()
            } else {
                self.theme.tag_style()
            };
            let line = Line::from(vec![
                Span::styled(if is_cursor { ">" } else { " " }, self.theme.cursor_style()),
                Span::raw(" "),
                Span::styled(tag.as_str(), style),
            ]);
            #[allow(clippy::cast_possible_truncation)]
            let y = area.y + (i - state.scroll_offset) as u16;
            buf.set_line(area.x, y, &line, area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_bounds() {
        let tags: TagSet = ["a", "b", "c"].into_iter().collect();
        let mut state = TagListState::default();
        state.move_up();
        assert_eq!(state.selected, 0);
        state.move_down(tags.len());
        state.move_down(tags.len());
        state.move_down(tags.len());
        assert_eq!(state.current(&tags).map(String::as_str), Some("c"));

        state.clamp(1);
        assert_eq!(state.selected, 0);
    }
}
