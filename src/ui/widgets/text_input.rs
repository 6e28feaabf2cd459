//! Modal text input widget with tag autocomplete
//!
//! Tag input is comma separated; each entry completes against the known
//! tags. Tool path input is a single free-form value.

use crate::browse::{TagOp, split_tag_input};
use crate::gateway::Tool;
use crate::ui::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Widget},
};

const MAX_SUGGESTIONS: usize = 10;

/// What a submitted input is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputPurpose {
    EditTags(TagOp),
    ToolPath(Tool),
}

#[derive(Debug, Clone)]
pub struct TextInputState {
    pub purpose: InputPurpose,
    pub prompt: String,
    pub buffer: String,
    /// Cursor position in characters
    pub cursor: usize,
    /// Completion candidates
    pub candidates: Vec<String>,
    pub suggestions: Vec<String>,
    pub suggestion_cursor: usize,
}

impl TextInputState {
    #[must_use]
    pub fn new(purpose: InputPurpose) -> Self {
        let prompt = match purpose {
            InputPurpose::EditTags(TagOp::Add) => "Add tags (comma separated)".to_string(),
            InputPurpose::EditTags(TagOp::Remove) => {
                "Remove tags (comma separated)".to_string()
            }
            InputPurpose::ToolPath(tool) => format!("Path to {}", tool.default_binary()),
        };
        Self {
            purpose,
            prompt,
            buffer: String::new(),
            cursor: 0,
            candidates: Vec::new(),
            suggestions: Vec::new(),
            suggestion_cursor: 0,
        }
    }

    /// Set completion candidates
    #[must_use]
    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self.update_suggestions();
        self
    }

    const fn completes(&self) -> bool {
        matches!(self.purpose, InputPurpose::EditTags(_))
    }

    fn byte_index(&self) -> usize {
        self.buffer
            .char_indices()
            .nth(self.cursor)
            .map_or(self.buffer.len(), |(i, _)| i)
    }

    /// Byte index where the entry under the cursor starts
    fn entry_start(&self) -> usize {
        let before = &self.buffer[..self.byte_index()];
        let start = before.rfind(',').map_or(0, |i| i + 1);
        start + (before[start..].len() - before[start..].trim_start().len())
    }

    fn current_entry(&self) -> &str {
        &self.buffer[self.entry_start()..self.byte_index()]
    }

    pub fn update_suggestions(&mut self) {
        if !self.completes() {
            self.suggestions.clear();
            return;
        }
        let query = self.current_entry().to_lowercase();
        let entered = split_tag_input(&self.buffer);
        self.suggestions = self
            .candidates
            .iter()
            .filter(|tag| !entered.contains(tag))
            .filter(|tag| fuzzy_match(&tag.to_lowercase(), &query))
            .take(MAX_SUGGESTIONS)
            .cloned()
            .collect();

        if self.suggestion_cursor >= self.suggestions.len() {
            self.suggestion_cursor = 0;
        }
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_idx = self.byte_index();
        self.buffer.insert(byte_idx, c);
        self.cursor += 1;
        self.update_suggestions();
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let byte_idx = self.byte_index();
            let prev = self.buffer[..byte_idx]
                .char_indices()
                .next_back()
                .map_or(0, |(i, _)| i);
            self.buffer.remove(prev);
            self.cursor -= 1;
            self.update_suggestions();
        }
    }

    pub fn delete(&mut self) {
        let byte_idx = self.byte_index();
        if byte_idx < self.buffer.len() {
            self.buffer.remove(byte_idx);
            self.update_suggestions();
        }
    }

    pub const fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        if self.cursor < self.buffer.chars().count() {
            self.cursor += 1;
        }
    }

    pub const fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.buffer.chars().count();
    }

    pub const fn suggestion_up(&mut self) {
        if self.suggestion_cursor > 0 {
            self.suggestion_cursor -= 1;
        } else if !self.suggestions.is_empty() {
            self.suggestion_cursor = self.suggestions.len() - 1;
        }
    }

    pub const fn suggestion_down(&mut self) {
        if self.suggestion_cursor + 1 < self.suggestions.len() {
            self.suggestion_cursor += 1;
        } else {
            self.suggestion_cursor = 0;
        }
    }

    /// Replace the entry under the cursor with the highlighted suggestion
    pub fn accept_suggestion(&mut self) {
        let Some(suggestion) = self.suggestions.get(self.suggestion_cursor).cloned() else {
            return;
        };
        let start = self.entry_start();
        let end = self.byte_index();
        self.buffer.replace_range(start..end, &suggestion);
        let mut cursor_byte = start + suggestion.len();
        if !self.buffer[cursor_byte..].starts_with(',') {
            self.buffer.insert_str(cursor_byte, ", ");
            cursor_byte += 2;
        }
        self.cursor = self.buffer[..cursor_byte].chars().count();
        self.update_suggestions();
    }

    /// Delete back to the previous separator (Ctrl+W)
    pub fn delete_word_backwards(&mut self) {
        let byte_idx = self.byte_index();
        let trimmed = self.buffer[..byte_idx].trim_end_matches([' ', ',']);
        let new_end = trimmed
            .rfind(|c: char| c == ',' || c.is_whitespace())
            .map_or(0, |i| i + 1);
        self.buffer.drain(new_end..byte_idx);
        self.cursor = self.buffer[..new_end].chars().count();
        self.update_suggestions();
    }

    /// Clear the entire line (Ctrl+U)
    pub fn clear_line(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.update_suggestions();
    }

    /// Tag names entered so far
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        split_tag_input(&self.buffer)
    }

    /// The raw value, trimmed
    #[must_use]
    pub fn value(&self) -> &str {
        self.buffer.trim()
    }
}

/// Pattern chars appear in text in order
fn fuzzy_match(text: &str, pattern: &str) -> bool {
    let mut pattern_chars = pattern.chars().peekable();
    for c in text.chars() {
        if pattern_chars.peek() == Some(&c) {
            pattern_chars.next();
        }
    }
    pattern_chars.peek().is_none()
}

/// Text input modal overlay widget
pub struct TextInputModal<'a> {
    state: &'a TextInputState,
    theme: &'a Theme,
}

impl<'a> TextInputModal<'a> {
    #[must_use]
    pub const fn new(state: &'a TextInputState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        Rect::new(x, y, width.min(area.width), height.min(area.height))
    }

    fn suggestion_items(&self) -> Vec<ListItem<'static>> {
        self.state
            .suggestions
            .iter()
            .enumerate()
            .map(|(idx, suggestion)| {
                let is_selected = idx == self.state.suggestion_cursor;
                let style = if is_selected {
                    self.theme.cursor_style()
                } else {
                    self.theme.tag_style()
                };
                let prefix = if is_selected { "▶ " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::styled(prefix, style),
                    Span::styled(suggestion.clone(), style),
                ]))
            })
            .collect()
    }

    /// Visible slice of the buffer and the cursor offset inside it
    fn visible_text(&self, width: usize) -> (String, usize) {
        let buffer = &self.state.buffer;
        let cursor = self.state.cursor;
        let total = buffer.chars().count();
        if width == 0 {
            return (String::new(), 0);
        }
        if total < width {
            return (buffer.clone(), cursor);
        }
        let half = width / 2;
        let start = if cursor <= half {
            0
        } else if cursor + half >= total {
            (total + 1).saturating_sub(width)
        } else {
            cursor - half
        };
        (buffer.chars().skip(start).take(width).collect(), cursor - start)
    }
}

impl Widget for TextInputModal<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = 60.min(area.width.saturating_sub(4));
        let show_suggestions = !self.state.suggestions.is_empty();
        #[allow(clippy::cast_possible_truncation)]
        let suggestions_height = if show_suggestions {
            (self.state.suggestions.len() as u16).min(8) + 2
        } else {
            0
        };
        // borders + input field + help line
        let height = 6 + suggestions_height;
        let modal_area = Self::centered_rect(width, height, area);
        Clear.render(modal_area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.cursor_style())
            .title(format!(" {} ", self.state.prompt))
            .title_alignment(Alignment::Center);
        let inner = block.inner(modal_area);
        block.render(modal_area, buf);

        let mut constraints = vec![Constraint::Length(3)];
        if show_suggestions {
            constraints.push(Constraint::Length(suggestions_height));
        }
        constraints.push(Constraint::Length(1));
        let chunks = Layout::vertical(constraints).split(inner);

        let input_block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style());
        let input_inner = input_block.inner(chunks[0]);
        input_block.render(chunks[0], buf);

        let (visible, offset) = self.visible_text(input_inner.width as usize);
        let before: String = visible.chars().take(offset).collect();
        let under: String = visible.chars().skip(offset).take(1).collect();
        let after: String = visible.chars().skip(offset + 1).collect();
        let line = Line::from(vec![
            Span::raw(before),
            Span::styled(
                if under.is_empty() { " ".to_string() } else { under },
                Style::default()
                    .bg(self.theme.cursor)
                    .fg(Color::Black)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::raw(after),
        ]);
        Paragraph::new(line).render(input_inner, buf);

        let mut help_chunk = 1;
        if show_suggestions {
            let title = format!(
                " Tags ({}/{}) ",
                self.state.suggestions.len(),
                self.state.candidates.len()
            );
            List::new(self.suggestion_items())
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(self.theme.border_style())
                        .title(title),
                )
                .render(chunks[1], buf);
            help_chunk = 2;
        }

        let help_text = if show_suggestions {
            "Tab: accept | ↑↓: navigate | Enter: submit | Esc: cancel"
        } else {
            "Enter: submit | Esc: cancel"
        };
        Paragraph::new(help_text)
            .style(self.theme.dimmed_style())
            .alignment(Alignment::Center)
            .render(chunks[help_chunk], buf);
    }
}
