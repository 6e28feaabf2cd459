//! Application state for the terminal browser
//!
//! Everything here is view state: cursors, marks, overlays and messages.
//! Selection, records and metadata belong to the
//! [`PaneController`](crate::browse::PaneController).

use crate::browse::{Notice, NoticeLevel};
use crate::config::TagpaneConfig;
use crate::ui::widgets::{FileTableState, NavTreeState, TagListState, TextInputState};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How long a status message stays visible
pub const MESSAGE_TTL: Duration = Duration::from_secs(5);

/// A status message with a creation time for auto-expiry
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub level: NoticeLevel,
    pub text: String,
    pub created_at: Instant,
}

impl StatusMessage {
    #[must_use]
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            created_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

impl From<Notice> for StatusMessage {
    fn from(notice: Notice) -> Self {
        Self::new(notice.level, notice.text)
    }
}

/// Pane with keyboard focus, in Tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusPane {
    #[default]
    Navigation,
    Tags,
    Files,
    Inspector,
}

impl FocusPane {
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Navigation => Self::Tags,
            Self::Tags => Self::Files,
            Self::Files => Self::Inspector,
            Self::Inspector => Self::Navigation,
        }
    }

    #[must_use]
    pub const fn prev(self) -> Self {
        match self {
            Self::Navigation => Self::Inspector,
            Self::Tags => Self::Navigation,
            Self::Files => Self::Tags,
            Self::Inspector => Self::Files,
        }
    }
}

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Help,
    /// A text input modal has the keyboard
    Input,
    /// The debug log overlay is open
    Log,
}

#[derive(Debug)]
pub struct AppState {
    pub focus: FocusPane,
    pub mode: Mode,
    pub nav: NavTreeState,
    pub tags: TagListState,
    pub files: FileTableState,
    pub input: Option<TextInputState>,
    pub messages: Vec<StatusMessage>,
    pub message_ttl: Duration,
    pub inspector_scroll: u16,
    /// Log lines scrolled back from the newest
    pub log_scroll: usize,
    /// Inspector display options
    pub priority_keys: Vec<String>,
    pub max_value_width: usize,
    pub should_quit: bool,
}

impl AppState {
    #[must_use]
    pub fn new(config: &TagpaneConfig, cwd: &Path) -> Self {
        let roots = filesystem_roots(dirs::home_dir(), cwd, &config.browse.roots);
        Self {
            focus: FocusPane::default(),
            mode: Mode::default(),
            nav: NavTreeState::new(roots, config.saved_queries(), config.browse.show_hidden),
            tags: TagListState::default(),
            files: FileTableState::default(),
            input: None,
            messages: Vec::new(),
            message_ttl: MESSAGE_TTL,
            inspector_scroll: 0,
            log_scroll: 0,
            priority_keys: config.metadata.priority_keys.clone(),
            max_value_width: config.metadata.max_value_width,
            should_quit: false,
        }
    }

    pub fn push_message(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.messages.push(StatusMessage::new(level, text));
    }

    /// Newest message that has not expired
    #[must_use]
    pub fn current_message(&self) -> Option<&StatusMessage> {
        self.messages
            .last()
            .filter(|m| !m.is_expired(self.message_ttl))
    }

    pub fn expire_messages(&mut self) {
        let ttl = self.message_ttl;
        self.messages.retain(|m| !m.is_expired(ttl));
    }

    pub fn open_input(&mut self, input: TextInputState) {
        self.input = Some(input);
        self.mode = Mode::Input;
    }

    pub fn close_input(&mut self) {
        self.input = None;
        self.mode = Mode::Normal;
    }
}

/// Home, the start directory, then configured roots, without duplicates
#[must_use]
pub fn filesystem_roots(
    home: Option<PathBuf>,
    cwd: &Path,
    extra: &[PathBuf],
) -> Vec<(String, PathBuf)> {
    let mut roots: Vec<(String, PathBuf)> = Vec::new();
    let mut push = |label: String, path: PathBuf| {
        if !roots.iter().any(|(_, p)| *p == path) {
            roots.push((label, path));
        }
    };
    if let Some(home) = home {
        push("Home".to_string(), home);
    }
    push(format!("Current ({})", cwd.display()), cwd.to_path_buf());
    for root in extra {
        push(root.display().to_string(), root.clone());
    }
    roots
}
