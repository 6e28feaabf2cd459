//! Parsers for the output shapes named in the command table

use super::result::Payload;
use super::table::OutputFormat;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Whitespace-separated words where `\x` escapes any character
static ESCAPED_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\\.|[^\s\\])+").expect("static regex is valid"));

static ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\(.)").expect("static regex is valid"));

/// Output that did not match the expected shape
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ParseFailure(pub String);

/// Parse standard output according to `format`
///
/// # Errors
///
/// Returns `ParseFailure` when non-blank output contains nothing that
/// matches the expected shape.
pub fn parse_output(format: OutputFormat, stdout: &str) -> Result<Payload, ParseFailure> {
    match format {
        OutputFormat::None => Ok(Payload::Empty),
        OutputFormat::Lines => Ok(Payload::Lines(parse_lines(stdout))),
        OutputFormat::FileTags => parse_file_tags(stdout).map(Payload::FileTags),
        OutputFormat::KeyValue => parse_key_values(stdout).map(Payload::Pairs),
        OutputFormat::Json => parse_json_pairs(stdout).map(Payload::Pairs),
    }
}

/// The payload an accepted empty result carries for `format`
#[must_use]
pub const fn empty_payload(format: OutputFormat) -> Payload {
    match format {
        OutputFormat::None => Payload::Empty,
        OutputFormat::Lines => Payload::Lines(Vec::new()),
        OutputFormat::FileTags => Payload::FileTags(Vec::new()),
        OutputFormat::KeyValue | OutputFormat::Json => Payload::Pairs(Vec::new()),
    }
}

fn parse_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Split a backend tag list on unescaped whitespace
#[must_use]
pub fn split_tags(list: &str) -> Vec<String> {
    ESCAPED_WORD
        .find_iter(list)
        .map(|m| unescape(m.as_str()))
        .collect()
}

fn unescape(value: &str) -> String {
    ESCAPE.replace_all(value, "$1").into_owned()
}

fn parse_file_tags(stdout: &str) -> Result<Vec<(PathBuf, Vec<String>)>, ParseFailure> {
    let mut entries = Vec::new();

    for line in stdout.lines().map(str::trim_end).filter(|l| !l.trim().is_empty()) {
        if let Some(path) = line.strip_suffix(':') {
            entries.push((PathBuf::from(unescape(path)), Vec::new()));
        } else if let Some((path, tags)) = line.rsplit_once(": ") {
            entries.push((PathBuf::from(unescape(path)), split_tags(tags)));
        } else {
            return Err(ParseFailure(format!("unexpected tag listing line: {line}")));
        }
    }

    Ok(entries)
}

fn parse_key_values(stdout: &str) -> Result<Vec<(String, String)>, ParseFailure> {
    let mut pairs = Vec::new();
    let mut unparsed = 0usize;

    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (group, rest) = match line.strip_prefix('[').and_then(|l| l.split_once(']')) {
            Some((group, rest)) => (Some(group.trim()), rest.trim_start()),
            None => (None, line),
        };

        match rest.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() => {
                let key = key.trim();
                let key = match group {
                    Some(group) if !group.is_empty() => format!("{group}:{key}"),
                    _ => key.to_string(),
                };
                pairs.push((key, value.trim().to_string()));
            }
            _ => unparsed += 1,
        }
    }

    if pairs.is_empty() && unparsed > 0 {
        return Err(ParseFailure(format!(
            "no key/value lines in {unparsed} line(s) of output"
        )));
    }

    Ok(pairs)
}

fn parse_json_pairs(stdout: &str) -> Result<Vec<(String, String)>, ParseFailure> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: serde_json::Value =
        serde_json::from_str(stdout).map_err(|e| ParseFailure(format!("invalid JSON: {e}")))?;

    let object = match value {
        serde_json::Value::Array(items) => match items.into_iter().next() {
            Some(serde_json::Value::Object(object)) => object,
            Some(_) => return Err(ParseFailure("expected an array of objects".into())),
            None => return Ok(Vec::new()),
        },
        serde_json::Value::Object(object) => object,
        _ => return Err(ParseFailure("expected a JSON array or object".into())),
    };

    Ok(object
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}
