//! Ratatui widgets for the four-pane browser

mod file_table;
mod help_bar;
pub(crate) mod help_overlay;
mod inspector;
mod log_panel;
mod nav_tree;
mod status_bar;
mod tag_list;
mod text_input;

pub use file_table::{FileTable, FileTableState};
pub use help_bar::{HelpBar, KeyHint, hints_for};
pub use help_overlay::HelpOverlay;
pub use inspector::{Inspector, InspectorView};
pub use log_panel::LogPanel;
pub use nav_tree::{NavKind, NavTree, NavTreeNode, NavTreeState};
pub use status_bar::StatusBar;
pub use tag_list::{TagList, TagListState};
pub use text_input::{InputPurpose, TextInputModal, TextInputState};
