//! Event handling for the terminal browser
//!
//! Maps key presses to view-state changes and, where backend work is needed,
//! to an [`Action`] for the event loop. Key handling never blocks.

use super::state::{AppState, FocusPane, Mode};
use super::widgets::{InputPurpose, TextInputState};
use crate::browse::{Event, NavigationNode, NoticeLevel, PaneController, SavedQuery, TagOp};
use crate::gateway::Tool;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::PathBuf;

const PAGE: usize = 10;

/// What the event loop should do after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    /// Hand an event to the controller
    Dispatch(Event),
    /// Validate, store, and persist a tool path
    ConfigureTool(Tool, PathBuf),
}

/// Handle one key press
pub fn handle_key(state: &mut AppState, controller: &PaneController, key: KeyEvent) -> Action {
    if key.kind == KeyEventKind::Release {
        return Action::None;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    match state.mode {
        Mode::Help => {
            state.mode = Mode::Normal;
            Action::None
        }
        Mode::Log => {
            handle_log_mode(state, key);
            Action::None
        }
        Mode::Input => handle_input_mode(state, controller, key),
        Mode::Normal => handle_normal_mode(state, controller, key),
    }
}

fn handle_log_mode(state: &mut AppState, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc | KeyCode::Char('q'), _) | (KeyCode::Char('l'), KeyModifiers::CONTROL) => {
            state.mode = Mode::Normal;
        }
        (KeyCode::Up, _) => state.log_scroll += 1,
        (KeyCode::Down, _) => state.log_scroll = state.log_scroll.saturating_sub(1),
        (KeyCode::PageUp, _) => state.log_scroll += PAGE,
        (KeyCode::PageDown, _) => state.log_scroll = state.log_scroll.saturating_sub(PAGE),
        (KeyCode::End, _) => state.log_scroll = 0,
        _ => {}
    }
}

fn handle_input_mode(state: &mut AppState, controller: &PaneController, key: KeyEvent) -> Action {
    let Some(input) = state.input.as_mut() else {
        state.mode = Mode::Normal;
        return Action::None;
    };

    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => state.close_input(),
        (KeyCode::Enter, _) => return submit_input(state, controller),
        (KeyCode::Tab, _) => input.accept_suggestion(),
        (KeyCode::Up, _) => input.suggestion_up(),
        (KeyCode::Down, _) => input.suggestion_down(),
        (KeyCode::Left, _) => input.cursor_left(),
        (KeyCode::Right, _) => input.cursor_right(),
        (KeyCode::Home, _) | (KeyCode::Char('a'), KeyModifiers::CONTROL) => input.cursor_home(),
        (KeyCode::End, _) | (KeyCode::Char('e'), KeyModifiers::CONTROL) => input.cursor_end(),
        (KeyCode::Backspace, _) => input.backspace(),
        (KeyCode::Delete, _) => input.delete(),
        (KeyCode::Char('w'), KeyModifiers::CONTROL) => input.delete_word_backwards(),
        (KeyCode::Char('u'), KeyModifiers::CONTROL) => input.clear_line(),
        (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => input.insert_char(c),
        _ => {}
    }
    Action::None
}

fn submit_input(state: &mut AppState, controller: &PaneController) -> Action {
    let Some(input) = state.input.take() else {
        return Action::None;
    };
    state.mode = Mode::Normal;

    match input.purpose {
        InputPurpose::EditTags(op) => {
            let tags = input.tags();
            if tags.is_empty() {
                state.push_message(NoticeLevel::Warning, "No tags entered");
                return Action::None;
            }
            let paths = state.files.selected_paths(controller.records());
            if paths.is_empty() {
                state.push_message(NoticeLevel::Warning, "No files selected");
                return Action::None;
            }
            Action::Dispatch(Event::TagEditRequested { paths, tags, op })
        }
        InputPurpose::ToolPath(tool) => {
            let value = input.value();
            if value.is_empty() {
                state.push_message(NoticeLevel::Warning, format!("{tool} left unconfigured"));
                return Action::None;
            }
            Action::ConfigureTool(tool, PathBuf::from(value))
        }
    }
}

fn handle_normal_mode(state: &mut AppState, controller: &PaneController, key: KeyEvent) -> Action {
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE)
        | (KeyCode::Char('q'), KeyModifiers::CONTROL) => return Action::Quit,
        (KeyCode::Tab, _) => {
            state.focus = state.focus.next();
            return Action::None;
        }
        (KeyCode::BackTab, _) => {
            state.focus = state.focus.prev();
            return Action::None;
        }
        (KeyCode::F(1), _) | (KeyCode::Char('?'), _) => {
            state.mode = Mode::Help;
            return Action::None;
        }
        (KeyCode::Char('l'), KeyModifiers::CONTROL) => {
            state.log_scroll = 0;
            state.mode = Mode::Log;
            return Action::None;
        }
        (KeyCode::F(5), _) => {
            state.nav.reload();
            return Action::Dispatch(Event::Refresh);
        }
        (KeyCode::Char('a'), KeyModifiers::NONE) => {
            return open_tag_input(state, controller, TagOp::Add);
        }
        (KeyCode::Char('d'), KeyModifiers::NONE) => {
            return open_tag_input(state, controller, TagOp::Remove);
        }
        _ => {}
    }

    match state.focus {
        FocusPane::Navigation => handle_navigation(state, key),
        FocusPane::Tags => handle_tags(state, controller, key),
        FocusPane::Files => handle_files(state, controller, key),
        FocusPane::Inspector => {
            match key.code {
                KeyCode::Up => state.inspector_scroll = state.inspector_scroll.saturating_sub(1),
                KeyCode::Down => state.inspector_scroll = state.inspector_scroll.saturating_add(1),
                KeyCode::Home => state.inspector_scroll = 0,
                _ => {}
            }
            Action::None
        }
    }
}

fn handle_navigation(state: &mut AppState, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Up => state.nav.move_up(),
        KeyCode::Down => state.nav.move_down(),
        KeyCode::Right => state.nav.expand(),
        KeyCode::Left => state.nav.collapse(),
        KeyCode::Enter => {
            if let Some(node) = state.nav.activate() {
                return navigate(state, node);
            }
        }
        _ => {}
    }
    Action::None
}

fn handle_tags(state: &mut AppState, controller: &PaneController, key: KeyEvent) -> Action {
    let tags = controller.tags();
    match key.code {
        KeyCode::Up => state.tags.move_up(),
        KeyCode::Down => state.tags.move_down(tags.len()),
        KeyCode::PageUp => state.tags.selected = state.tags.selected.saturating_sub(PAGE),
        KeyCode::PageDown => {
            state.tags.selected = (state.tags.selected + PAGE).min(tags.len().saturating_sub(1));
        }
        KeyCode::Enter => {
            if let Some(tag) = state.tags.current(tags) {
                let node = NavigationNode::SavedQuery(SavedQuery::for_tag(tag));
                return navigate(state, node);
            }
        }
        _ => {}
    }
    Action::None
}

fn handle_files(state: &mut AppState, controller: &PaneController, key: KeyEvent) -> Action {
    let records = controller.records();
    let before = state.files.selected_paths(records);
    match key.code {
        KeyCode::Up => state.files.move_up(),
        KeyCode::Down => state.files.move_down(records.len()),
        KeyCode::PageUp => state.files.cursor = state.files.cursor.saturating_sub(PAGE),
        KeyCode::PageDown => {
            state.files.cursor = (state.files.cursor + PAGE).min(records.len().saturating_sub(1));
        }
        KeyCode::Home => state.files.cursor = 0,
        KeyCode::End => state.files.cursor = records.len().saturating_sub(1),
        KeyCode::Char(' ') => {
            state.files.toggle_mark(records);
            state.files.move_down(records.len());
        }
        KeyCode::Esc => state.files.marked.clear(),
        _ => return Action::None,
    }

    let after = state.files.selected_paths(records);
    if after == before {
        return Action::None;
    }
    state.inspector_scroll = 0;
    Action::Dispatch(Event::FileSelectionChanged(after))
}

fn navigate(state: &mut AppState, node: NavigationNode) -> Action {
    state.files.reset();
    state.inspector_scroll = 0;
    Action::Dispatch(Event::NavigationChanged(node))
}

fn open_tag_input(state: &mut AppState, controller: &PaneController, op: TagOp) -> Action {
    if state.files.selected_paths(controller.records()).is_empty() {
        state.push_message(NoticeLevel::Warning, "No files selected");
        return Action::None;
    }
    let candidates = match op {
        TagOp::Add => controller.tags().iter().cloned().collect(),
        TagOp::Remove => selected_tags(state, controller),
    };
    state.open_input(TextInputState::new(InputPurpose::EditTags(op)).with_candidates(candidates));
    Action::None
}

/// Tags carried by at least one selected file
fn selected_tags(state: &AppState, controller: &PaneController) -> Vec<String> {
    let mut tags: Vec<String> = state
        .files
        .selected_paths(controller.records())
        .iter()
        .filter_map(|path| controller.record(path))
        .flat_map(|record| record.tags.iter().cloned())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

/// Open the path prompt for a tool the backend reported missing
pub fn prompt_for_tool(state: &mut AppState, tool: Tool) {
    state.open_input(TextInputState::new(InputPurpose::ToolPath(tool)));
}
