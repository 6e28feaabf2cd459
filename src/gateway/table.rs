//! Command table for the external tools
//!
//! All backend-specific argv syntax, output shapes, and exit-code rules live
//! here. Call sites name a [`BackendCommand`] and supply [`Bindings`]; they
//! never assemble argument vectors themselves.
//!
//! # Template placeholders
//!
//! - `{files}` as a whole argument expands to one argument per file
//! - `{file}` is replaced by the first bound file
//! - `{query}` is replaced by the verbatim query expression
//! - `{tags}` is replaced by the escaped, space-joined tag names

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// External tools the gateway knows how to invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    /// Tag database program (TMSU)
    TagBackend,
    /// Metadata extraction program (ExifTool)
    MetadataTool,
}

impl Tool {
    pub const ALL: [Self; 2] = [Self::TagBackend, Self::MetadataTool];

    /// Executable name searched for on `PATH`
    #[must_use]
    pub const fn default_binary(self) -> &'static str {
        match self {
            Self::TagBackend => "tmsu",
            Self::MetadataTool => "exiftool",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TagBackend => write!(f, "tag backend ({})", self.default_binary()),
            Self::MetadataTool => write!(f, "metadata tool ({})", self.default_binary()),
        }
    }
}

/// Every operation the core performs against an external tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendCommand {
    /// List every tag name known to the backend
    AllTags,
    /// List tags of one or more files
    FileTags,
    /// Evaluate a tag query expression to file paths
    Query,
    /// List every tagged file
    AllFiles,
    /// List files the backend tracks without tags
    Untagged,
    /// Add tags to one or more files
    AddTags,
    /// Remove tags from one or more files
    RemoveTags,
    /// Extract metadata for a single file
    Extract,
}

impl BackendCommand {
    pub const ALL: [Self; 8] = [
        Self::AllTags,
        Self::FileTags,
        Self::Query,
        Self::AllFiles,
        Self::Untagged,
        Self::AddTags,
        Self::RemoveTags,
        Self::Extract,
    ];

    #[must_use]
    pub const fn tool(self) -> Tool {
        match self {
            Self::Extract => Tool::MetadataTool,
            _ => Tool::TagBackend,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllTags => "all_tags",
            Self::FileTags => "file_tags",
            Self::Query => "query",
            Self::AllFiles => "all_files",
            Self::Untagged => "untagged",
            Self::AddTags => "add_tags",
            Self::RemoveTags => "remove_tags",
            Self::Extract => "extract",
        }
    }
}

impl fmt::Display for BackendCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected shape of a command's standard output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Output is ignored
    None,
    /// One entry per non-empty line
    Lines,
    /// `path: tag tag ...` per line
    FileTags,
    /// `[Group] Key: value` or `Key: value` per line
    KeyValue,
    /// A JSON array holding one object of key/value pairs
    Json,
}

/// Rule for turning a non-zero exit into a legitimate empty result
///
/// A non-zero exit is accepted as an empty success only when standard output
/// is blank and either the exit code or a standard error marker matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitPolicy {
    /// Exit codes that mean "no results"
    #[serde(default)]
    pub empty_result_codes: Vec<i32>,
    /// Case-insensitive standard error substrings that mean "no results"
    #[serde(default)]
    pub empty_result_stderr: Vec<String>,
}

impl ExitPolicy {
    #[must_use]
    pub fn stderr_markers(markers: &[&str]) -> Self {
        Self {
            empty_result_codes: Vec::new(),
            empty_result_stderr: markers.iter().map(|m| (*m).to_string()).collect(),
        }
    }

    #[must_use]
    pub fn with_codes(mut self, codes: &[i32]) -> Self {
        self.empty_result_codes.extend_from_slice(codes);
        self
    }

    /// Whether a non-zero exit should be reported as an empty success
    #[must_use]
    pub fn accepts_empty(&self, exit_code: Option<i32>, stdout: &str, stderr: &str) -> bool {
        if !stdout.trim().is_empty() {
            return false;
        }

        if exit_code.is_some_and(|code| self.empty_result_codes.contains(&code)) {
            return true;
        }

        let stderr = stderr.to_lowercase();
        self.empty_result_stderr
            .iter()
            .any(|marker| !marker.is_empty() && stderr.contains(&marker.to_lowercase()))
    }
}

/// Table entry for one backend command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub tool: Tool,
    /// Argument template (placeholders expanded at call time)
    pub args: Vec<String>,
    pub format: OutputFormat,
    pub policy: ExitPolicy,
}

impl CommandSpec {
    fn new(tool: Tool, args: &[&str], format: OutputFormat, policy: ExitPolicy) -> Self {
        Self {
            tool,
            args: args.iter().map(|a| (*a).to_string()).collect(),
            format,
            policy,
        }
    }
}

/// User override for a single table entry, read from the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_result_codes: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_result_stderr: Option<Vec<String>>,
}

/// Values substituted into argument templates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    pub files: Vec<PathBuf>,
    pub query: Option<String>,
    pub tags: Vec<String>,
}

impl Bindings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.files.push(path.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn files<P: AsRef<Path>>(mut self, paths: &[P]) -> Self {
        self.files
            .extend(paths.iter().map(|p| p.as_ref().to_path_buf()));
        self
    }

    #[must_use]
    pub fn query(mut self, expression: impl Into<String>) -> Self {
        self.query = Some(expression.into());
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: &[String]) -> Self {
        self.tags.extend_from_slice(tags);
        self
    }
}

/// A fully expanded invocation, ready for the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub command: BackendCommand,
    pub tool: Tool,
    pub args: Vec<String>,
    /// Optional data written to the child's standard input
    pub input: Option<String>,
    pub timeout: Duration,
    /// Working directory (the tag backend locates its database from here)
    pub cwd: Option<PathBuf>,
    pub format: OutputFormat,
    pub policy: ExitPolicy,
}

impl CommandRequest {
    #[must_use]
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }
}

/// Mapping from [`BackendCommand`] to its table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTable {
    specs: HashMap<BackendCommand, CommandSpec>,
}

impl Default for CommandTable {
    /// TMSU and ExifTool bindings
    fn default() -> Self {
        use BackendCommand as C;
        use OutputFormat as F;

        let no_db = || ExitPolicy::stderr_markers(&["no database"]);
        let mut specs = HashMap::new();

        specs.insert(C::AllTags, CommandSpec::new(Tool::TagBackend, &["tags"], F::Lines, no_db()));
        specs.insert(
            C::FileTags,
            CommandSpec::new(
                Tool::TagBackend,
                &["tags", "--name=always", "{files}"],
                F::FileTags,
                no_db(),
            ),
        );
        specs.insert(
            C::Query,
            CommandSpec::new(
                Tool::TagBackend,
                &["files", "{query}"],
                F::Lines,
                ExitPolicy::stderr_markers(&["no such tag", "no database"]),
            ),
        );
        specs.insert(C::AllFiles, CommandSpec::new(Tool::TagBackend, &["files"], F::Lines, no_db()));
        specs.insert(
            C::Untagged,
            CommandSpec::new(Tool::TagBackend, &["untagged"], F::Lines, no_db()),
        );
        specs.insert(
            C::AddTags,
            CommandSpec::new(
                Tool::TagBackend,
                &["tag", "--tags={tags}", "{files}"],
                F::None,
                ExitPolicy::default(),
            ),
        );
        specs.insert(
            C::RemoveTags,
            CommandSpec::new(
                Tool::TagBackend,
                &["untag", "--tags={tags}", "{files}"],
                F::None,
                ExitPolicy::stderr_markers(&["not tagged", "no such tag"]),
            ),
        );
        specs.insert(
            C::Extract,
            CommandSpec::new(
                Tool::MetadataTool,
                &["-G", "-S", "{file}"],
                F::KeyValue,
                ExitPolicy::stderr_markers(&["unknown file type", "file format error"]),
            ),
        );

        Self { specs }
    }
}

impl CommandTable {
    /// Default table with user overrides applied
    #[must_use]
    pub fn with_overrides(overrides: &HashMap<BackendCommand, CommandOverride>) -> Self {
        let mut table = Self::default();
        for (command, over) in overrides {
            if let Some(spec) = table.specs.get_mut(command) {
                if let Some(args) = &over.args {
                    spec.args.clone_from(args);
                }
                if let Some(format) = over.format {
                    spec.format = format;
                }
                if let Some(codes) = &over.empty_result_codes {
                    spec.policy.empty_result_codes.clone_from(codes);
                }
                if let Some(markers) = &over.empty_result_stderr {
                    spec.policy.empty_result_stderr.clone_from(markers);
                }
            }
        }
        table
    }

    /// Table entry for a command
    ///
    /// Every [`BackendCommand`] has an entry; the default table is complete
    /// and overrides only modify existing entries.
    #[must_use]
    pub fn spec(&self, command: BackendCommand) -> &CommandSpec {
        &self.specs[&command]
    }

    /// Expand a command's template into a request
    #[must_use]
    pub fn request(
        &self,
        command: BackendCommand,
        bindings: &Bindings,
        timeout: Duration,
        cwd: Option<&Path>,
    ) -> CommandRequest {
        let spec = self.spec(command);
        CommandRequest {
            command,
            tool: spec.tool,
            args: expand_args(&spec.args, bindings),
            input: None,
            timeout,
            cwd: cwd.map(Path::to_path_buf),
            format: spec.format,
            policy: spec.policy.clone(),
        }
    }
}

/// Escape a tag name for the backend's space-separated tag lists
#[must_use]
pub fn escape_tag(tag: &str) -> String {
    tag.replace('\\', "\\\\").replace(' ', "\\ ")
}

fn expand_args(template: &[String], bindings: &Bindings) -> Vec<String> {
    let first_file = bindings
        .files
        .first()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let query = bindings.query.clone().unwrap_or_default();
    let tags = bindings
        .tags
        .iter()
        .map(|t| escape_tag(t))
        .collect::<Vec<_>>()
        .join(" ");

    let mut args = Vec::with_capacity(template.len() + bindings.files.len());
    for arg in template {
        if arg == "{files}" {
            args.extend(
                bindings
                    .files
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned()),
            );
            continue;
        }
        args.push(
            arg.replace("{file}", &first_file)
                .replace("{query}", &query)
                .replace("{tags}", &tags),
        );
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_covers_every_command() {
        let table = CommandTable::default();
        for command in BackendCommand::ALL {
            assert_eq!(table.spec(command).tool, command.tool());
        }
    }

    #[test]
    fn test_files_placeholder_expands_per_file() {
        let table = CommandTable::default();
        let bindings = Bindings::new().files(&["/docs/a.pdf", "/docs/b.pdf"]);
        let request = table.request(BackendCommand::FileTags, &bindings, Duration::from_secs(1), None);
        assert_eq!(
            request.args,
            ["tags", "--name=always", "/docs/a.pdf", "/docs/b.pdf"]
        );
    }

    #[test]
    fn test_query_is_passed_verbatim() {
        let table = CommandTable::default();
        let bindings = Bindings::new().query("report and 2023");
        let request = table.request(BackendCommand::Query, &bindings, Duration::from_secs(1), None);
        assert_eq!(request.args, ["files", "report and 2023"]);
    }

    #[test]
    fn test_tags_are_joined_and_escaped() {
        let table = CommandTable::default();
        let bindings = Bindings::new()
            .file("/docs/a.pdf")
            .tags(&["urgent".to_string(), "to read".to_string()]);
        let request = table.request(BackendCommand::AddTags, &bindings, Duration::from_secs(1), None);
        assert_eq!(request.args, ["tag", "--tags=urgent to\\ read", "/docs/a.pdf"]);
    }

    #[test]
    fn test_exit_policy_requires_blank_stdout() {
        let policy = ExitPolicy::stderr_markers(&["no such tag"]);
        assert!(policy.accepts_empty(Some(1), "", "tmsu: No such tag 'x'"));
        assert!(!policy.accepts_empty(Some(1), "partial output", "no such tag"));
        assert!(!policy.accepts_empty(Some(1), "", "permission denied"));
    }

    #[test]
    fn test_exit_policy_codes() {
        let policy = ExitPolicy::default().with_codes(&[1]);
        assert!(policy.accepts_empty(Some(1), "  \n", ""));
        assert!(!policy.accepts_empty(Some(2), "", ""));
        assert!(!policy.accepts_empty(None, "", ""));
    }

    #[test]
    fn test_overrides_replace_fields() {
        let mut overrides = HashMap::new();
        overrides.insert(
            BackendCommand::Extract,
            CommandOverride {
                args: Some(vec!["-json".into(), "-G".into(), "{file}".into()]),
                format: Some(OutputFormat::Json),
                empty_result_codes: Some(vec![1]),
                empty_result_stderr: None,
            },
        );
        let table = CommandTable::with_overrides(&overrides);
        let spec = table.spec(BackendCommand::Extract);
        assert_eq!(spec.format, OutputFormat::Json);
        assert_eq!(spec.policy.empty_result_codes, vec![1]);
        assert!(!spec.policy.empty_result_stderr.is_empty());
    }
}
