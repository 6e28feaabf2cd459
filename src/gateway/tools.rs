//! Resolved executable paths for the external tools
//!
//! The registry is shared between the UI thread and command workers; a tool
//! configured at runtime becomes visible to the next invocation.

use super::table::Tool;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{info, warn};

/// Rejected tool path
#[derive(Debug, Error)]
pub enum ToolPathError {
    /// Path does not point at an existing file
    #[error("Not an executable file: {0}")]
    NotAFile(PathBuf),
}

/// Thread-safe map from tool to executable path
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    paths: Arc<RwLock<HashMap<Tool, PathBuf>>>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configured paths, falling back to a `PATH` search
    ///
    /// Configured paths that no longer exist are ignored with a warning so the
    /// `PATH` lookup still gets a chance.
    #[must_use]
    pub fn discover(configured: &HashMap<Tool, PathBuf>) -> Self {
        let registry = Self::new();

        for tool in Tool::ALL {
            let from_config = configured.get(&tool).filter(|path| {
                let ok = path.is_file();
                if !ok {
                    warn!(%tool, path = %path.display(), "configured tool path is not a file");
                }
                ok
            });

            match from_config.cloned().or_else(|| find_on_path(tool)) {
                Some(path) => {
                    info!(%tool, path = %path.display(), "found tool");
                    registry.insert(tool, path);
                }
                None => warn!(%tool, "tool not found"),
            }
        }

        registry
    }

    /// Executable path for `tool`, if configured
    #[must_use]
    pub fn get(&self, tool: Tool) -> Option<PathBuf> {
        self.paths
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tool)
            .cloned()
    }

    #[must_use]
    pub fn is_configured(&self, tool: Tool) -> bool {
        self.get(tool).is_some()
    }

    /// Tools that have no executable path
    #[must_use]
    pub fn missing(&self) -> Vec<Tool> {
        Tool::ALL
            .into_iter()
            .filter(|tool| !self.is_configured(*tool))
            .collect()
    }

    /// Set the executable for `tool` after checking that it exists
    ///
    /// # Errors
    ///
    /// Returns `ToolPathError::NotAFile` if `path` is not an existing file.
    pub fn set(&self, tool: Tool, path: impl AsRef<Path>) -> Result<(), ToolPathError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ToolPathError::NotAFile(path.to_path_buf()));
        }
        info!(%tool, path = %path.display(), "tool path configured");
        self.insert(tool, path.to_path_buf());
        Ok(())
    }

    /// Forget the executable for `tool`
    pub fn clear(&self, tool: Tool) {
        self.paths
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&tool);
    }

    fn insert(&self, tool: Tool, path: PathBuf) {
        self.paths
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tool, path);
    }
}

/// Look up the tool's default binary on `PATH`
#[must_use]
pub fn find_on_path(tool: Tool) -> Option<PathBuf> {
    which::which(tool.default_binary()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_rejects_missing_file() {
        let registry = ToolRegistry::new();
        let result = registry.set(Tool::TagBackend, "/definitely/not/here/tmsu");
        assert!(matches!(result, Err(ToolPathError::NotAFile(_))));
        assert!(!registry.is_configured(Tool::TagBackend));
    }

    #[test]
    fn test_set_and_clear() {
        let dir = TempDir::new().unwrap();
        let exe = dir.path().join("exiftool");
        std::fs::write(&exe, "#!/bin/sh\n").unwrap();

        let registry = ToolRegistry::new();
        registry.set(Tool::MetadataTool, &exe).unwrap();
        assert_eq!(registry.get(Tool::MetadataTool), Some(exe));
        assert_eq!(registry.missing(), vec![Tool::TagBackend]);

        registry.clear(Tool::MetadataTool);
        assert!(registry.get(Tool::MetadataTool).is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let dir = TempDir::new().unwrap();
        let exe = dir.path().join("tmsu");
        std::fs::write(&exe, "").unwrap();

        let registry = ToolRegistry::new();
        let worker_view = registry.clone();
        registry.set(Tool::TagBackend, &exe).unwrap();
        assert!(worker_view.is_configured(Tool::TagBackend));
    }

    #[test]
    fn test_discover_prefers_existing_configured_path() {
        let dir = TempDir::new().unwrap();
        let exe = dir.path().join("my-tmsu");
        std::fs::write(&exe, "").unwrap();

        let mut configured = HashMap::new();
        configured.insert(Tool::TagBackend, exe.clone());
        let registry = ToolRegistry::discover(&configured);
        assert_eq!(registry.get(Tool::TagBackend), Some(exe));
    }
}
