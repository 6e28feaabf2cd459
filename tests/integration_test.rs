//! Integration tests for tagpane
//!
//! These tests run the real process gateway against small shell scripts that
//! behave like `tmsu` and `exiftool`, and drive the pane controller through
//! complete browse workflows.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tagpane::browse::{
    Engine, Event, MetadataStatus, MutationOutcome, NavigationNode, PaneController, PaneState,
    SavedQuery, TagMutator, TagOp,
};
use tagpane::gateway::{
    Backend, BackendCommand, Bindings, CommandStatus, CommandTable, SystemGateway, Tool,
    ToolRegistry,
};
use tempfile::TempDir;

/// A tag backend storing `path<TAB>tag` lines next to the script
const FAKE_TMSU: &str = r#"#!/bin/sh
db="$(dirname "$0")/tags.db"
touch "$db"
cmd="$1"
shift
case "$cmd" in
  tags)
    if [ "$1" = "--name=always" ]; then
      shift
      for f in "$@"; do
        printf '%s:' "$f"
        awk -F '\t' -v f="$f" '$1 == f { printf " %s", $2 }' "$db"
        printf '\n'
      done
    else
      cut -f2 "$db" | sort -u
    fi
    ;;
  files)
    if [ $# -eq 0 ]; then
      cut -f1 "$db" | sort -u
    elif awk -F '\t' -v t="$1" '$2 == t { found = 1 } END { exit !found }' "$db"; then
      awk -F '\t' -v t="$1" '$2 == t { print $1 }' "$db" | sort -u
    else
      echo "tmsu: no such tag '$1'" >&2
      exit 1
    fi
    ;;
  untagged)
    ;;
  tag)
    tags="${1#--tags=}"
    shift
    for f in "$@"; do
      for t in $tags; do
        printf '%s\t%s\n' "$f" "$t" >> "$db"
      done
    done
    ;;
  untag)
    tags="${1#--tags=}"
    shift
    status=0
    for f in "$@"; do
      for t in $tags; do
        if ! awk -F '\t' -v f="$f" -v t="$t" '$1 == f && $2 == t { found = 1 } END { exit !found }' "$db"; then
          echo "tmsu: $f: not tagged with '$t'" >&2
          status=1
          continue
        fi
        awk -F '\t' -v f="$f" -v t="$t" '!($1 == f && $2 == t)' "$db" > "$db.tmp"
        mv "$db.tmp" "$db"
      done
    done
    exit $status
    ;;
esac
"#;

const FAKE_EXIFTOOL: &str = r#"#!/bin/sh
for arg; do file="$arg"; done
echo "[File] FileName: $(basename "$file")"
echo "[File] FileSize: 12 bytes"
echo "[EXIF] Model: X100"
"#;

struct Fixture {
    dir: TempDir,
    registry: ToolRegistry,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            registry: ToolRegistry::new(),
        }
    }

    fn root(&self) -> PathBuf {
        self.dir.path().canonicalize().unwrap()
    }

    fn script(&self, tool: Tool, body: &str) -> PathBuf {
        let bin = self.root().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let path = bin.join(tool.default_binary());
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        self.registry.set(tool, &path).unwrap();
        path
    }

    fn files(&self, names: &[&str]) -> PathBuf {
        let data = self.root().join("data");
        fs::create_dir_all(&data).unwrap();
        for name in names {
            fs::write(data.join(name), "test content").unwrap();
        }
        data
    }

    fn backend(&self, timeout: Duration) -> Backend {
        Backend::new(
            Arc::new(SystemGateway::new(self.registry.clone())),
            CommandTable::default(),
        )
        .with_timeout(timeout)
    }
}

fn run(
    backend: &Backend,
    command: BackendCommand,
    bindings: &Bindings,
    cwd: &Path,
) -> tagpane::gateway::CommandResult {
    backend.call_in(command, bindings, cwd)
}

#[test]
fn test_timeout_kills_command() {
    let fx = Fixture::new();
    fx.script(Tool::TagBackend, "#!/bin/sh\nsleep 10\n");
    let backend = fx.backend(Duration::from_millis(300));

    let started = Instant::now();
    let result = run(&backend, BackendCommand::AllTags, &Bindings::new(), &fx.root());

    assert_eq!(result.status, CommandStatus::Timeout);
    assert!(result.payload.is_none());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_nonzero_exit_keeps_stderr() {
    let fx = Fixture::new();
    fx.script(Tool::TagBackend, "#!/bin/sh\necho 'database is locked' >&2\nexit 2\n");
    let backend = fx.backend(Duration::from_secs(10));

    let result = run(&backend, BackendCommand::AllTags, &Bindings::new(), &fx.root());

    assert_eq!(result.status, CommandStatus::NonzeroExit);
    assert_eq!(result.exit_code, Some(2));
    assert!(result.stderr.contains("database is locked"));
    assert!(result.payload.is_none());
}

#[test]
fn test_unknown_tag_is_an_empty_result() {
    let fx = Fixture::new();
    fx.script(Tool::TagBackend, FAKE_TMSU);
    let backend = fx.backend(Duration::from_secs(10));

    let result = run(
        &backend,
        BackendCommand::Query,
        &Bindings::new().query("nosuchtag"),
        &fx.root(),
    );

    assert_eq!(result.status, CommandStatus::Success);
    assert_eq!(result.exit_code, Some(1));
    assert!(result.payload.as_ref().is_none_or(tagpane::gateway::Payload::is_empty));
}

#[test]
fn test_missing_tool_is_not_spawned() {
    let fx = Fixture::new();
    let backend = fx.backend(Duration::from_secs(10));

    let result = run(&backend, BackendCommand::AllTags, &Bindings::new(), &fx.root());

    assert_eq!(result.status, CommandStatus::ToolMissing);
    assert_eq!(result.exit_code, None);
    assert_eq!(result.elapsed, Duration::ZERO);
}

#[test]
fn test_missing_tool_raises_one_prompt() {
    let fx = Fixture::new();
    let data = fx.files(&["a.txt"]);
    let engine = Engine::new(fx.backend(Duration::from_secs(10)), false);
    let mut controller = PaneController::new(&data);

    controller
        .dispatch_blocking(&engine, Event::NavigationChanged(NavigationNode::path(&data)))
        .unwrap();
    assert!(matches!(controller.files_pane(), PaneState::Failed(_)));
    assert_eq!(controller.take_tool_prompt(), Some(Tool::TagBackend));

    controller.dispatch_blocking(&engine, Event::Refresh).unwrap();
    assert_eq!(controller.take_tool_prompt(), None);
}

#[test]
fn test_navigate_tag_and_re_resolve() {
    let fx = Fixture::new();
    fx.script(Tool::TagBackend, FAKE_TMSU);
    let data = fx.files(&["a.jpg", "b.jpg"]);
    let engine = Engine::new(fx.backend(Duration::from_secs(10)), false);
    let mut controller = PaneController::new(&data);
    let a = data.join("a.jpg");

    controller
        .dispatch_blocking(&engine, Event::NavigationChanged(NavigationNode::path(&data)))
        .unwrap();
    assert_eq!(controller.files_pane(), &PaneState::Ready);
    assert_eq!(controller.records().len(), 2);
    assert!(controller.records().iter().all(|r| r.tags.is_empty()));
    assert!(controller.tags().is_empty());

    controller
        .dispatch_blocking(
            &engine,
            Event::TagEditRequested {
                paths: vec![a.clone()],
                tags: vec!["holiday".into(), "beach".into()],
                op: TagOp::Add,
            },
        )
        .unwrap();

    let record = controller.record(&a).unwrap();
    assert_eq!(record.tags.len(), 2);
    assert!(record.tags.iter().any(|t| t == "holiday"));
    assert!(controller.tags().contains("holiday"));
    assert!(controller.tags().contains("beach"));

    controller
        .dispatch_blocking(
            &engine,
            Event::NavigationChanged(NavigationNode::SavedQuery(SavedQuery::for_tag("holiday"))),
        )
        .unwrap();
    let paths: Vec<_> = controller.records().iter().map(|r| r.path.clone()).collect();
    assert_eq!(paths, vec![a.clone()]);

    controller
        .dispatch_blocking(
            &engine,
            Event::TagEditRequested {
                paths: vec![a.clone()],
                tags: vec!["holiday".into()],
                op: TagOp::Remove,
            },
        )
        .unwrap();
    assert!(controller.records().is_empty());
    assert_eq!(controller.files_pane(), &PaneState::Ready);
}

#[test]
fn test_select_file_fetches_metadata() {
    let fx = Fixture::new();
    fx.script(Tool::TagBackend, FAKE_TMSU);
    fx.script(Tool::MetadataTool, FAKE_EXIFTOOL);
    let data = fx.files(&["a.jpg"]);
    let engine = Engine::new(fx.backend(Duration::from_secs(10)), false);
    let mut controller = PaneController::new(&data);
    let a = data.join("a.jpg");

    controller
        .dispatch_blocking(&engine, Event::NavigationChanged(NavigationNode::path(&data)))
        .unwrap();
    controller
        .dispatch_blocking(&engine, Event::FileSelectionChanged(vec![a.clone()]))
        .unwrap();

    let snapshot = controller.metadata().unwrap();
    assert_eq!(snapshot.path, a);
    assert_eq!(snapshot.status, MetadataStatus::Ok);
    assert_eq!(snapshot.get("FileName"), Some("a.jpg"));
    assert_eq!(snapshot.get("EXIF:Model"), Some("X100"));
    assert_eq!(controller.inspector_pane(), &PaneState::Ready);
}

#[test]
fn test_removing_absent_tag_is_a_no_op_success() {
    let fx = Fixture::new();
    fx.script(Tool::TagBackend, FAKE_TMSU);
    let data = fx.files(&["a.pdf", "b.pdf"]);
    let mutator = TagMutator::new(fx.backend(Duration::from_secs(10)));
    let files = vec![data.join("a.pdf"), data.join("b.pdf")];
    let tags = vec!["urgent".to_string()];

    let added = mutator.add_tags(&files[..1], &tags, &data).unwrap();
    assert!(matches!(added.outcome(), MutationOutcome::Success { affected_count: 1, .. }));

    // b.pdf never carried the tag; the backend exits 1 with "not tagged"
    let removed = mutator.remove_tags(&files, &tags, &data).unwrap();
    assert!(matches!(removed.outcome(), MutationOutcome::Success { affected_count: 2, .. }));
    assert!(removed.failed().is_empty());

    let again = mutator.remove_tags(&files, &tags, &data).unwrap();
    assert!(matches!(again.outcome(), MutationOutcome::Success { .. }));
}
