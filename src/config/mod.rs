//! Configuration module for tagpane
//!
//! Manages tool paths, browse options, saved queries, inspector settings, and
//! command-table overrides. Configuration is stored in the user's config
//! directory (`~/.config/tagpane/config.toml` on Linux).

mod setup;

pub use setup::prompt_missing_tools;

use crate::browse::{DEFAULT_PRIORITY_KEYS, SavedQuery};
use crate::gateway::{BackendCommand, CommandOverride, Tool};
use config::{Config, ConfigError, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_max_value_width() -> usize {
    50
}

fn default_priority_keys() -> Vec<String> {
    DEFAULT_PRIORITY_KEYS.iter().map(|k| (*k).to_string()).collect()
}

/// Executable paths and invocation limits
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ToolsConfig {
    /// Path to the tag backend (`tmsu`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_backend: Option<PathBuf>,

    /// Path to the metadata tool (`exiftool`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_tool: Option<PathBuf>,

    /// Seconds before an external command is killed
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            tag_backend: None,
            metadata_tool: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Filesystem browsing options
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct BrowseConfig {
    /// Show dot-files and dot-directories
    #[serde(default)]
    pub show_hidden: bool,

    /// Extra roots listed under "File System" after home and the current directory
    #[serde(default)]
    pub roots: Vec<PathBuf>,
}

/// A saved query as written in the config file
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    pub label: String,
    pub expression: String,
}

/// Inspector settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MetadataConfig {
    /// Keys shown first, in this order
    #[serde(default = "default_priority_keys")]
    pub priority_keys: Vec<String>,

    /// Longer values are truncated
    #[serde(default = "default_max_value_width")]
    pub max_value_width: usize,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            priority_keys: default_priority_keys(),
            max_value_width: default_max_value_width(),
        }
    }
}

/// Application configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct TagpaneConfig {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub browse: BrowseConfig,

    /// Saved queries, shown in this order below the built-in ones
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<QueryConfig>,

    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Command-table overrides keyed by command name (e.g. `query`, `extract`)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub commands: HashMap<String, CommandOverride>,
}

impl TagpaneConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ConfigError::Message("Could not determine config directory".to_string())
        })?;

        Ok(config_dir.join("tagpane").join("config.toml"))
    }

    /// Load configuration from the default location, creating it if missing
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read, parsed, or created.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed, or created.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let default_config = Self::default();
            default_config.save_to(path)?;
            return Ok(default_config);
        }

        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?;

        settings.try_deserialize()
    }

    /// Save configuration to the default location
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config path cannot be determined or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config directory cannot be created, the configuration
    /// cannot be serialized to TOML, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.tools.timeout_secs.max(1))
    }

    /// Configured executable for `tool`
    #[must_use]
    pub const fn tool_path(&self, tool: Tool) -> Option<&PathBuf> {
        match tool {
            Tool::TagBackend => self.tools.tag_backend.as_ref(),
            Tool::MetadataTool => self.tools.metadata_tool.as_ref(),
        }
    }

    pub fn set_tool_path(&mut self, tool: Tool, path: impl Into<PathBuf>) {
        let path = Some(path.into());
        match tool {
            Tool::TagBackend => self.tools.tag_backend = path,
            Tool::MetadataTool => self.tools.metadata_tool = path,
        }
    }

    /// Configured tool paths, for registry discovery
    #[must_use]
    pub fn tool_paths(&self) -> HashMap<Tool, PathBuf> {
        Tool::ALL
            .into_iter()
            .filter_map(|tool| self.tool_path(tool).map(|p| (tool, p.clone())))
            .collect()
    }

    /// Command overrides keyed by command; unknown names are skipped with a warning
    #[must_use]
    pub fn command_overrides(&self) -> HashMap<BackendCommand, CommandOverride> {
        self.commands
            .iter()
            .filter_map(|(name, over)| {
                let command = BackendCommand::ALL.into_iter().find(|c| c.as_str() == name);
                if command.is_none() {
                    warn!(%name, "ignoring override for unknown command");
                }
                command.map(|c| (c, over.clone()))
            })
            .collect()
    }

    /// Built-in queries followed by the configured ones
    #[must_use]
    pub fn saved_queries(&self) -> Vec<SavedQuery> {
        let mut queries = vec![SavedQuery::all_tagged(), SavedQuery::untagged()];
        queries.extend(
            self.queries
                .iter()
                .map(|q| SavedQuery::new(q.label.clone(), q.expression.clone())),
        );
        queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browse::QueryExpression;
    use crate::gateway::OutputFormat;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = TagpaneConfig::default();
        assert_eq!(config.tools.timeout_secs, 30);
        assert_eq!(config.metadata.max_value_width, 50);
        assert_eq!(config.metadata.priority_keys[0], "FileName");
        assert!(!config.browse.show_hidden);
        assert!(config.tool_paths().is_empty());
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = TagpaneConfig::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, TagpaneConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = TagpaneConfig::default();
        config.set_tool_path(Tool::TagBackend, "/usr/local/bin/tmsu");
        config.tools.timeout_secs = 5;
        config.browse.roots.push(PathBuf::from("/media/photos"));
        config.queries.push(QueryConfig {
            label: "Reports".into(),
            expression: "report and 2023".into(),
        });
        config.save_to(&path).unwrap();

        let loaded = TagpaneConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.timeout(), Duration::from_secs(5));
        assert_eq!(
            loaded.tool_path(Tool::TagBackend),
            Some(&PathBuf::from("/usr/local/bin/tmsu"))
        );
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[tools]\ntimeout_secs = 0\n").unwrap();

        let config = TagpaneConfig::load_from(&path).unwrap();
        assert_eq!(config.tools.timeout_secs, 0);
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[tools]
metadata_tool = "/opt/exiftool"

[[queries]]
label = "Holiday"
expression = "holiday and not work"

[commands.extract]
args = ["-json", "-G", "{file}"]
format = "json"
"#,
        )
        .unwrap();

        let config = TagpaneConfig::load_from(&path).unwrap();
        assert_eq!(config.tools.timeout_secs, 30);
        assert_eq!(
            config.tool_path(Tool::MetadataTool),
            Some(&PathBuf::from("/opt/exiftool"))
        );

        let queries = config.saved_queries();
        assert_eq!(queries.len(), 3);
        assert_eq!(queries[0].expression, QueryExpression::AllTagged);
        assert_eq!(queries[1].expression, QueryExpression::Untagged);
        assert_eq!(queries[2].label, "Holiday");

        let overrides = config.command_overrides();
        assert_eq!(overrides[&BackendCommand::Extract].format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_unknown_command_override_ignored() {
        let mut config = TagpaneConfig::default();
        config
            .commands
            .insert("frobnicate".into(), CommandOverride::default());
        assert!(config.command_overrides().is_empty());
    }
}
