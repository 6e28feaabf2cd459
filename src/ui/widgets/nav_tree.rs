//! Navigation tree widget: filesystem roots and saved queries
//!
//! Directories load their children the first time they are expanded. A
//! directory that cannot be read gets a single inline note instead.

use crate::browse::{NavigationNode, SavedQuery, list_subdirectories};
use crate::ui::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, StatefulWidget, Widget},
};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What a tree row stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavKind {
    /// Heading such as "File System" or "Queries"
    Section,
    Directory(PathBuf),
    Query(SavedQuery),
    /// Inline diagnostic, e.g. "permission denied"
    Note,
}

#[derive(Debug, Clone)]
pub struct NavTreeNode {
    pub label: String,
    pub kind: NavKind,
    pub children: Vec<NavTreeNode>,
    pub is_expanded: bool,
    /// Whether a directory's children have been listed
    pub loaded: bool,
}

impl NavTreeNode {
    fn section(label: &str, children: Vec<Self>) -> Self {
        Self {
            label: label.to_string(),
            kind: NavKind::Section,
            children,
            is_expanded: true,
            loaded: true,
        }
    }

    fn directory(label: impl Into<String>, path: PathBuf) -> Self {
        Self {
            label: label.into(),
            kind: NavKind::Directory(path),
            children: Vec::new(),
            is_expanded: false,
            loaded: false,
        }
    }

    fn query(query: SavedQuery) -> Self {
        Self {
            label: query.label.clone(),
            kind: NavKind::Query(query),
            children: Vec::new(),
            is_expanded: false,
            loaded: true,
        }
    }

    fn note(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: NavKind::Note,
            children: Vec::new(),
            is_expanded: false,
            loaded: true,
        }
    }

    const fn is_expandable(&self) -> bool {
        matches!(self.kind, NavKind::Section | NavKind::Directory(_))
    }

    fn collect_visible(&self, path: &mut Vec<usize>, depth: usize, output: &mut Vec<VisibleRow>) {
        output.push(VisibleRow {
            path: path.clone(),
            depth,
        });
        if self.is_expanded {
            for (i, child) in self.children.iter().enumerate() {
                path.push(i);
                child.collect_visible(path, depth + 1, output);
                path.pop();
            }
        }
    }
}

/// Index path of a visible row
#[derive(Debug, Clone)]
struct VisibleRow {
    path: Vec<usize>,
    depth: usize,
}

/// State for the navigation tree widget
#[derive(Debug, Clone)]
pub struct NavTreeState {
    pub roots: Vec<NavTreeNode>,
    /// Cursor index in the flattened visible list
    pub selected: usize,
    pub scroll_offset: usize,
    visible: Vec<VisibleRow>,
    show_hidden: bool,
}

impl NavTreeState {
    /// Build the tree from labelled filesystem roots and saved queries
    #[must_use]
    pub fn new(roots: Vec<(String, PathBuf)>, queries: Vec<SavedQuery>, show_hidden: bool) -> Self {
        let filesystem = roots
            .into_iter()
            .map(|(label, path)| NavTreeNode::directory(label, path))
            .collect();
        let queries = queries.into_iter().map(NavTreeNode::query).collect();

        let mut state = Self {
            roots: vec![
                NavTreeNode::section("File System", filesystem),
                NavTreeNode::section("Queries", queries),
            ],
            selected: 0,
            scroll_offset: 0,
            visible: Vec::new(),
            show_hidden,
        };
        state.rebuild_visible_cache();
        state
    }

    fn rebuild_visible_cache(&mut self) {
        self.visible.clear();
        for (i, root) in self.roots.iter().enumerate() {
            root.collect_visible(&mut vec![i], 0, &mut self.visible);
        }
        if self.selected >= self.visible.len() {
            self.selected = self.visible.len().saturating_sub(1);
        }
    }

    fn node(&self, path: &[usize]) -> Option<&NavTreeNode> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.roots.get(*first)?, |node, i| node.children.get(*i))
    }

    fn node_mut(&mut self, path: &[usize]) -> Option<&mut NavTreeNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.roots.get_mut(*first)?;
        for i in rest {
            node = node.children.get_mut(*i)?;
        }
        Some(node)
    }

    /// Node under the cursor
    #[must_use]
    pub fn current(&self) -> Option<&NavTreeNode> {
        self.visible
            .get(self.selected)
            .and_then(|row| self.node(&row.path))
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.visible.len() {
            self.selected += 1;
        }
    }

    /// Expand the node under the cursor, listing a directory on first use
    pub fn expand(&mut self) {
        let Some(row) = self.visible.get(self.selected).cloned() else {
            return;
        };
        let show_hidden = self.show_hidden;
        let Some(node) = self.node_mut(&row.path) else {
            return;
        };
        if !node.is_expandable() {
            return;
        }
        if let NavKind::Directory(dir) = &node.kind
            && !node.loaded
        {
            node.children = load_children(dir, show_hidden);
            node.loaded = true;
        }
        node.is_expanded = true;
        self.rebuild_visible_cache();
    }

    /// Collapse the node under the cursor, or move to its parent
    pub fn collapse(&mut self) {
        let Some(row) = self.visible.get(self.selected).cloned() else {
            return;
        };
        if let Some(node) = self.node_mut(&row.path)
            && node.is_expanded
        {
            node.is_expanded = false;
            self.rebuild_visible_cache();
            return;
        }

        let parent = &row.path[..row.path.len().saturating_sub(1)];
        if !parent.is_empty()
            && let Some(index) = self.visible.iter().position(|r| r.path == parent)
        {
            self.selected = index;
        }
    }

    /// Navigation target of the node under the cursor
    ///
    /// Sections toggle instead and return `None`.
    pub fn activate(&mut self) -> Option<NavigationNode> {
        let kind = self.current()?.kind.clone();
        match kind {
            NavKind::Directory(path) => Some(NavigationNode::FilesystemPath(path)),
            NavKind::Query(query) => Some(NavigationNode::SavedQuery(query)),
            NavKind::Section => {
                if self.current().is_some_and(|n| n.is_expanded) {
                    self.collapse();
                } else {
                    self.expand();
                }
                None
            }
            NavKind::Note => None,
        }
    }

    /// Re-list the children of every loaded directory
    pub fn reload(&mut self) {
        let show_hidden = self.show_hidden;
        for root in &mut self.roots {
            reload_node(root, show_hidden);
        }
        self.rebuild_visible_cache();
    }

    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }
}

fn reload_node(node: &mut NavTreeNode, show_hidden: bool) {
    if let NavKind::Directory(dir) = &node.kind
        && node.loaded
    {
        let fresh = load_children(dir, show_hidden);
        let expanded: Vec<NavTreeNode> = std::mem::take(&mut node.children)
            .into_iter()
            .filter(|c| c.loaded && matches!(c.kind, NavKind::Directory(_)))
            .collect();
        node.children = fresh
            .into_iter()
            .map(|child| {
                expanded
                    .iter()
                    .find(|old| old.kind == child.kind)
                    .cloned()
                    .unwrap_or(child)
            })
            .collect();
    }
    for child in &mut node.children {
        reload_node(child, show_hidden);
    }
}

fn load_children(dir: &Path, show_hidden: bool) -> Vec<NavTreeNode> {
    match list_subdirectories(dir, show_hidden) {
        Ok(dirs) => dirs
            .into_iter()
            .map(|path| {
                let label = path.file_name().map_or_else(
                    || path.display().to_string(),
                    |n| n.to_string_lossy().into_owned(),
                );
                NavTreeNode::directory(label, path)
            })
            .collect(),
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "cannot list directory");
            let note = if e.kind() == io::ErrorKind::PermissionDenied {
                "permission denied".to_string()
            } else {
                e.to_string()
            };
            vec![NavTreeNode::note(note)]
        }
    }
}

/// Navigation tree widget
pub struct NavTree<'a> {
    block: Option<Block<'a>>,
    theme: &'a Theme,
    /// Node currently shown in the file pane
    active: Option<&'a NavigationNode>,
    focused: bool,
}

impl<'a> NavTree<'a> {
    #[must_use]
    pub const fn new(theme: &'a Theme) -> Self {
        Self {
            block: None,
            theme,
            active: None,
            focused: false,
        }
    }

    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    #[must_use]
    pub const fn active(mut self, node: Option<&'a NavigationNode>) -> Self {
        self.active = node;
        self
    }

    #[must_use]
    pub const fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn is_active(&self, kind: &NavKind) -> bool {
        match (kind, self.active) {
            (NavKind::Directory(path), Some(NavigationNode::FilesystemPath(active))) => {
                path == active
            }
            (NavKind::Query(query), Some(NavigationNode::SavedQuery(active))) => query == active,
            _ => false,
        }
    }
}

impl StatefulWidget for NavTree<'_> {
    type State = NavTreeState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let area = self.block.as_ref().map_or(area, |b| {
            let inner = b.inner(area);
            b.clone().render(area, buf);
            inner
        });

        if area.height == 0 {
            return;
        }

        let visible_height = area.height as usize;
        if state.selected < state.scroll_offset {
            state.scroll_offset = state.selected;
        } else if state.selected >= state.scroll_offset + visible_height {
            state.scroll_offset = state.selected.saturating_sub(visible_height - 1);
        }

        let start = state.scroll_offset;
        let end = (start + visible_height).min(state.visible.len());

        for (i, row) in state.visible[start..end].iter().enumerate() {
            let Some(node) = state.node(&row.path) else {
                continue;
            };
            let is_cursor = start + i == state.selected;

            let mut spans = vec![Span::raw("  ".repeat(row.depth))];
            spans.push(Span::raw(match (&node.kind, node.is_expanded) {
                (NavKind::Section | NavKind::Directory(_), true) => "▾ ",
                (NavKind::Section | NavKind::Directory(_), false) => "▸ ",
                _ => "  ",
            }));

            let style = if is_cursor && self.focused {
                self.theme.selected_style()
            } else {
                match &node.kind {
                    NavKind::Section => self.theme.section_style(),
                    NavKind::Note => self.theme.error_style(),
                    kind if self.is_active(kind) => self.theme.cursor_style(),
                    NavKind::Directory(_) => self.theme.directory_style(),
                    NavKind::Query(_) => self.theme.tag_style(),
                }
            };
            spans.push(Span::styled(node.label.clone(), style));

            #[allow(clippy::cast_possible_truncation)]
            let y = area.y + i as u16;
            buf.set_line(area.x, y, &Line::from(spans), area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TempTree;

    fn tree(root: &Path) -> NavTreeState {
        NavTreeState::new(
            vec![("root".into(), root.to_path_buf())],
            vec![SavedQuery::all_tagged(), SavedQuery::untagged()],
            false,
        )
    }

    #[test]
    fn test_initial_layout() {
        let fixture = TempTree::new(&["docs/", "music/"]);
        let state = tree(fixture.root());
        // File System, root, Queries, All Tagged Files, Untagged Files
        assert_eq!(state.visible_count(), 5);
        assert_eq!(state.current().unwrap().label, "File System");
    }

    #[test]
    fn test_expand_lists_directories_lazily() {
        let fixture = TempTree::new(&["Music/", "docs/", ".hidden/", "file.txt"]);
        let mut state = tree(fixture.root());
        state.move_down();
        assert!(!state.current().unwrap().loaded);

        state.expand();
        let root = state.current().unwrap();
        assert!(root.loaded);
        let labels: Vec<&str> = root.children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["docs", "Music"]);
        assert_eq!(state.visible_count(), 7);
    }

    #[test]
    fn test_unreadable_directory_gets_note() {
        let fixture = TempTree::new(&[]);
        let missing = fixture.path("gone");
        let mut state = tree(&missing);
        state.move_down();
        state.expand();
        let root = state.current().unwrap();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].kind, NavKind::Note);
    }

    #[test]
    fn test_activate_directory_and_query() {
        let fixture = TempTree::new(&["docs/"]);
        let mut state = tree(fixture.root());
        state.move_down();
        assert_eq!(
            state.activate(),
            Some(NavigationNode::FilesystemPath(fixture.root().to_path_buf()))
        );

        state.move_down(); // Queries
        state.move_down(); // All Tagged Files
        assert_eq!(
            state.activate(),
            Some(NavigationNode::SavedQuery(SavedQuery::all_tagged()))
        );
    }

    #[test]
    fn test_collapse_moves_to_parent() {
        let fixture = TempTree::new(&["docs/"]);
        let mut state = tree(fixture.root());
        state.move_down();
        state.expand();
        state.move_down();
        assert_eq!(state.current().unwrap().label, "docs");

        state.collapse();
        assert_eq!(state.current().unwrap().label, "root");
        state.collapse();
        assert!(!state.current().unwrap().is_expanded);
    }

    #[test]
    fn test_section_toggles_on_activate() {
        let fixture = TempTree::new(&[]);
        let mut state = tree(fixture.root());
        assert_eq!(state.activate(), None);
        assert_eq!(state.visible_count(), 4);
    }
}
