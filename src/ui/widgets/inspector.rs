//! Inspector widget: tags and metadata of the single selected file

use crate::browse::{FileRecord, MetadataSnapshot, MetadataStatus, PaneState, display_entries};
use crate::ui::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget, Wrap},
};

/// What the inspector is showing
pub struct InspectorView<'a> {
    pub pane: &'a PaneState,
    pub snapshot: Option<&'a MetadataSnapshot>,
    /// Record of the inspected file, for its tags
    pub record: Option<&'a FileRecord>,
    /// Number of selected files
    pub selected: usize,
    pub priority_keys: &'a [String],
    pub max_value_width: usize,
}

pub struct Inspector<'a> {
    view: InspectorView<'a>,
    theme: &'a Theme,
    block: Option<Block<'a>>,
    scroll: u16,
}

impl<'a> Inspector<'a> {
    #[must_use]
    pub const fn new(view: InspectorView<'a>, theme: &'a Theme) -> Self {
        Self {
            view,
            theme,
            block: None,
            scroll: 0,
        }
    }

    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    #[must_use]
    pub const fn scroll(mut self, scroll: u16) -> Self {
        self.scroll = scroll;
        self
    }

    fn placeholder(&self) -> Option<Line<'static>> {
        let dimmed = |text: String| Some(Line::styled(text, self.theme.dimmed_style()));
        match (self.view.pane, self.view.selected) {
            (_, 0) => dimmed("No file selected".into()),
            (_, n) if n > 1 => dimmed(format!("{n} files selected")),
            (PaneState::Loading, _) => dimmed("Loading metadata…".into()),
            (PaneState::Failed(message), _) => {
                Some(Line::styled(message.clone(), self.theme.error_style()))
            }
            _ if self.view.snapshot.is_none() => dimmed("No metadata".into()),
            _ => None,
        }
    }

    fn content(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        if let Some(record) = self.view.record {
            lines.push(Line::styled(
                record.name(),
                self.theme.normal_style().add_modifier(Modifier::BOLD),
            ));
            let chips: Vec<Span> = if record.tags.is_empty() {
                vec![Span::styled("no tags", self.theme.dimmed_style())]
            } else {
                record
                    .tags
                    .iter()
                    .flat_map(|tag| {
                        [
                            Span::styled(format!(" {tag} "), self.theme.chip_style()),
                            Span::raw(" "),
                        ]
                    })
                    .collect()
            };
            lines.push(Line::from(chips));
            lines.push(Line::default());
        }

        if let Some(placeholder) = self.placeholder() {
            lines.push(placeholder);
            return lines;
        }
        let Some(snapshot) = self.view.snapshot else {
            return lines;
        };

        match snapshot.status {
            MetadataStatus::Ok => {
                let entries = display_entries(
                    snapshot,
                    self.view.priority_keys,
                    self.view.max_value_width,
                );
                let key_width = entries
                    .iter()
                    .map(|(k, _)| k.chars().count())
                    .max()
                    .unwrap_or(0)
                    .min(28);
                lines.extend(entries.into_iter().map(|(key, value)| {
                    Line::from(vec![
                        Span::styled(format!("{key:<key_width$}"), self.theme.key_style()),
                        Span::raw("  "),
                        Span::raw(value),
                    ])
                }));
            }
            MetadataStatus::Unavailable => lines.push(Line::styled(
                snapshot
                    .message
                    .clone()
                    .unwrap_or_else(|| "No metadata for this file type".into()),
                self.theme.dimmed_style(),
            )),
            MetadataStatus::Error => lines.push(Line::styled(
                snapshot
                    .message
                    .clone()
                    .unwrap_or_else(|| "Metadata extraction failed".into()),
                self.theme.error_style(),
            )),
        }
        lines
    }
}

impl Widget for Inspector<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut paragraph = Paragraph::new(self.content())
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));
        if let Some(block) = self.block {
            paragraph = paragraph.block(block);
        }
        paragraph.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_priority_entries_first() {
        let theme = Theme::default();
        let mut record = FileRecord::new("/photos/a.jpg");
        record.tags = vec!["holiday".into()];
        let snapshot = MetadataSnapshot::ok(
            "/photos/a.jpg",
            vec![
                ("EXIF:Model".into(), "X100".into()),
                ("File:FileName".into(), "a.jpg".into()),
            ],
        );
        let keys = vec!["FileName".to_string()];
        let inspector = Inspector::new(
            InspectorView {
                pane: &PaneState::Ready,
                snapshot: Some(&snapshot),
                record: Some(&record),
                selected: 1,
                priority_keys: &keys,
                max_value_width: 50,
            },
            &theme,
        );

        let lines = text(&inspector.content());
        assert_eq!(lines[0], "a.jpg");
        assert!(lines[1].contains("holiday"));
        assert!(lines[3].starts_with("FileName"));
        assert!(lines[4].starts_with("Model"));
    }

    #[test]
    fn test_multiple_selection_placeholder() {
        let theme = Theme::default();
        let inspector = Inspector::new(
            InspectorView {
                pane: &PaneState::Idle,
                snapshot: None,
                record: None,
                selected: 3,
                priority_keys: &[],
                max_value_width: 50,
            },
            &theme,
        );
        assert_eq!(text(&inspector.content()), vec!["3 files selected"]);
    }
}
