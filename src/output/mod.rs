//! Output formatting for the headless commands
//!
//! Paths are shown relative to the current directory when possible.

use crate::browse::FileRecord;
use crate::gateway::CommandStatus;
use colored::Colorize;
use std::path::Path;

/// Path relative to the current directory, or absolute if outside it
#[must_use]
pub fn format_path(path: &Path) -> String {
    if let Ok(cwd) = std::env::current_dir()
        && let Ok(rel_path) = path.strip_prefix(&cwd)
        && !rel_path.as_os_str().is_empty()
    {
        return rel_path.display().to_string();
    }
    path.display().to_string()
}

/// One file-table row: path, size, modification time, tags
#[must_use]
pub fn file_record(record: &FileRecord, quiet: bool) -> String {
    let path = format_path(&record.path);
    if quiet {
        return path;
    }

    let tags = if record.tags.is_empty() {
        "(no tags)".dimmed().to_string()
    } else {
        format!("[{}]", record.tags.join(", ")).cyan().to_string()
    };
    format!(
        "  {:>10}  {:16}  {} {}",
        record.size_display(),
        record.modified_display(),
        path,
        tags
    )
}

/// A key/value line of a metadata listing, keys padded to `key_width`
#[must_use]
pub fn metadata_entry(key: &str, value: &str, key_width: usize) -> String {
    format!("  {}  {}", format!("{key:key_width$}").bold(), value)
}

/// Colored status word
#[must_use]
pub fn status(status: CommandStatus) -> String {
    match status {
        CommandStatus::Success => status.as_str().green().to_string(),
        CommandStatus::ToolMissing | CommandStatus::Timeout => status.as_str().red().to_string(),
        CommandStatus::NonzeroExit | CommandStatus::ParseError => {
            status.as_str().yellow().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_path_relative_to_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(format_path(&cwd.join("a").join("b.txt")), "a/b.txt");
        assert_eq!(format_path(Path::new("/nonexistent/x")), "/nonexistent/x");
    }

    #[test]
    fn test_quiet_record_is_path_only() {
        let mut record = FileRecord::new(PathBuf::from("/nonexistent/a.pdf"));
        record.tags = vec!["report".into()];
        assert_eq!(file_record(&record, true), "/nonexistent/a.pdf");
        assert!(file_record(&record, false).contains("report"));
    }
}
