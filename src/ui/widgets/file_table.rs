//! File table widget: the records of the current resolution
//!
//! Space marks files for multi-selection. With nothing marked, the file
//! under the cursor is the selection.

use crate::browse::{FileRecord, PaneState};
use crate::ui::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget, Wrap},
};
use std::path::PathBuf;

const SIZE_WIDTH: usize = 10;
const MODIFIED_WIDTH: usize = 16;

/// Cursor and marks over the file table
#[derive(Debug, Clone, Default)]
pub struct FileTableState {
    pub cursor: usize,
    pub scroll_offset: usize,
    /// Marked paths, in marking order
    pub marked: Vec<PathBuf>,
}

impl FileTableState {
    pub const fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub const fn move_down(&mut self, len: usize) {
        if self.cursor + 1 < len {
            self.cursor += 1;
        }
    }

    /// Toggle the mark on the file under the cursor
    pub fn toggle_mark(&mut self, records: &[FileRecord]) {
        let Some(record) = records.get(self.cursor) else {
            return;
        };
        if let Some(index) = self.marked.iter().position(|p| *p == record.path) {
            self.marked.remove(index);
        } else {
            self.marked.push(record.path.clone());
        }
    }

    #[must_use]
    pub fn is_marked(&self, record: &FileRecord) -> bool {
        self.marked.contains(&record.path)
    }

    /// Selected paths: the marked files, or the file under the cursor
    #[must_use]
    pub fn selected_paths(&self, records: &[FileRecord]) -> Vec<PathBuf> {
        if self.marked.is_empty() {
            records
                .get(self.cursor)
                .map(|r| vec![r.path.clone()])
                .unwrap_or_default()
        } else {
            self.marked.clone()
        }
    }

    /// Drop marks for vanished files and keep the cursor in range
    ///
    /// Returns true if anything changed.
    pub fn sync(&mut self, records: &[FileRecord]) -> bool {
        let before = (self.cursor, self.marked.len());
        self.marked
            .retain(|path| records.iter().any(|r| r.path == *path));
        if self.cursor >= records.len() {
            self.cursor = records.len().saturating_sub(1);
        }
        before != (self.cursor, self.marked.len())
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
        self.scroll_offset = 0;
        self.marked.clear();
    }
}

pub struct FileTable<'a> {
    records: &'a [FileRecord],
    pane: &'a PaneState,
    state: &'a mut FileTableState,
    theme: &'a Theme,
    block: Option<Block<'a>>,
    focused: bool,
}

impl<'a> FileTable<'a> {
    #[must_use]
    pub const fn new(
        records: &'a [FileRecord],
        pane: &'a PaneState,
        state: &'a mut FileTableState,
        theme: &'a Theme,
    ) -> Self {
        Self {
            records,
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

    fn row(&self, record: &FileRecord, is_cursor: bool, name_width: usize) -> Line<'static> {
        let marked = self.state.is_marked(record);
        let name_style = if is_cursor && self.focused {
            self.theme.selected_style()
        } else if marked {
            self.theme.marked_style()
        } else {
            self.theme.normal_style()
        };

        let mut name = record.name();
        if name.chars().count() > name_width {
            name = name.chars().take(name_width.saturating_sub(1)).collect();
            name.push('…');
        }

        let mut spans = vec![
            Span::styled(if is_cursor { ">" } else { " " }, self.theme.cursor_style()),
            Span::styled(if marked { "✓ " } else { "  " }, self.theme.marked_style()),
            Span::styled(format!("{name:<name_width$}"), name_style),
            Span::styled(
                format!(" {:>SIZE_WIDTH$}", record.size_display()),
                self.theme.dimmed_style(),
            ),
            Span::styled(
                format!(" {:<MODIFIED_WIDTH$}", record.modified_display()),
                self.theme.dimmed_style(),
            ),
        ];
        if !record.tags.is_empty() {
            spans.push(Span::styled(
                format!(" {}", record.tags.join(" ")),
                self.theme.tag_style(),
            ));
        }
        Line::from(spans)
    }
}

impl Widget for FileTable<'_> {
    fn render(mut self, area: Rect, buf: &mut Buffer) {
        let area = self.block.as_ref().map_or(area, |b| {
            let inner = b.inner(area);
            b.clone().render(area, buf);
            inner
        });
        if area.height < 2 {
            return;
        }

        let message = match self.pane {
            PaneState::Loading => Some(Span::styled("Loading…", self.theme.dimmed_style())),
            PaneState::Failed(text) => Some(Span::styled(text.as_str(), self.theme.error_style())),
            PaneState::Idle => Some(Span::styled(
                "Select a directory or query",
                self.theme.dimmed_style(),
            )),
            PaneState::Ready if self.records.is_empty() => {
                Some(Span::styled("No files", self.theme.dimmed_style()))
            }
            PaneState::Ready => None,
        };
        if let Some(message) = message {
            Paragraph::new(message)
                .wrap(Wrap { trim: true })
                .render(area, buf);
            return;
        }

        // 1 cursor + 2 mark + size + modified + separators
        let fixed = 3 + SIZE_WIDTH + 1 + MODIFIED_WIDTH + 1;
        let name_width = (area.width as usize).saturating_sub(fixed).clamp(8, 48);

        let header = Line::styled(
            format!(
                "   {:<name_width$} {:>SIZE_WIDTH$} {:<MODIFIED_WIDTH$} Tags",
                "Name", "Size", "Modified"
            ),
            self.theme.dimmed_style().add_modifier(Modifier::UNDERLINED),
        );
        buf.set_line(area.x, area.y, &header, area.width);

        let visible_height = (area.height - 1) as usize;
        {
            let state = &mut *self.state;
            if state.cursor < state.scroll_offset {
                state.scroll_offset = state.cursor;
            } else if state.cursor >= state.scroll_offset + visible_height {
                state.scroll_offset = state.cursor.saturating_sub(visible_height - 1);
            }
        }

        let start = self.state.scroll_offset;
        for (i, record) in self
            .records
            .iter()
            .enumerate()
            .skip(start)
            .take(visible_height)
        {
            let line = self.row(record, i == self.state.cursor, name_width);
            #[allow(clippy::cast_possible_truncation)]
            let y = area.y + 1 + (i - start) as u16;
            buf.set_line(area.x, y, &line, area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(names: &[&str]) -> Vec<FileRecord> {
        names
            .iter()
            .map(|n| FileRecord::new(PathBuf::from("/data").join(n)))
            .collect()
    }

    #[test]
    fn test_selection_defaults_to_cursor() {
        let records = records(&["a", "b"]);
        let mut state = FileTableState::default();
        state.move_down(records.len());
        assert_eq!(state.selected_paths(&records), vec![PathBuf::from("/data/b")]);
        assert!(state.selected_paths(&[]).is_empty());
    }

    #[test]
    fn test_marks_override_cursor() {
        let records = records(&["a", "b", "c"]);
        let mut state = FileTableState::default();
        state.toggle_mark(&records);
        state.move_down(records.len());
        state.move_down(records.len());
        state.toggle_mark(&records);
        assert_eq!(
            state.selected_paths(&records),
            vec![PathBuf::from("/data/a"), PathBuf::from("/data/c")]
        );

        state.toggle_mark(&records);
        assert_eq!(state.selected_paths(&records), vec![PathBuf::from("/data/a")]);
    }

    #[test]
    fn test_sync_drops_vanished_marks() {
        let all = records(&["a", "b", "c"]);
        let mut state = FileTableState::default();
        state.cursor = 2;
        state.toggle_mark(&all);

        let remaining = records(&["a"]);
        assert!(state.sync(&remaining));
        assert_eq!(state.cursor, 0);
        assert!(state.marked.is_empty());
        assert!(!state.sync(&remaining));
    }
}
