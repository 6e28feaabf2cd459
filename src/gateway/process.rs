//! Gateway implementation that spawns real processes

use super::ProcessGateway;
use super::parse::{empty_payload, parse_output};
use super::result::{CommandResult, CommandStatus};
use super::table::CommandRequest;
use super::tools::ToolRegistry;
use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Spawns the configured executables with a hard timeout
#[derive(Debug, Clone)]
pub struct SystemGateway {
    tools: ToolRegistry,
}

enum Waited {
    Exited(ExitStatus),
    TimedOut,
    Failed(std::io::Error),
}

impl SystemGateway {
    #[must_use]
    pub const fn new(tools: ToolRegistry) -> Self {
        Self { tools }
    }

    #[must_use]
    pub const fn tools(&self) -> &ToolRegistry {
        &self.tools
    }
}

impl ProcessGateway for SystemGateway {
    fn run(&self, request: &CommandRequest) -> CommandResult {
        let Some(program) = self.tools.get(request.tool) else {
            debug!(command = %request.command, tool = %request.tool, "tool missing, not spawning");
            return CommandResult::tool_missing(request.tool);
        };

        debug!(
            command = %request.command,
            program = %program.display(),
            args = ?request.args,
            cwd = ?request.cwd,
            "running command"
        );

        let started = Instant::now();
        let mut command = Command::new(&program);
        command
            .args(&request.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if request.input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        if let Some(cwd) = &request.cwd {
            command.current_dir(cwd);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!(program = %program.display(), error = %e, "failed to launch tool");
                return CommandResult::failure(
                    CommandStatus::ToolMissing,
                    format!("failed to launch {}: {e}", program.display()),
                );
            }
        };

        if let (Some(input), Some(mut stdin)) = (request.input.clone(), child.stdin.take()) {
            thread::spawn(move || {
                let _ = stdin.write_all(input.as_bytes());
            });
        }

        let deadline = started + request.timeout;
        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        let status = match wait_until(&mut child, deadline) {
            Waited::Exited(status) => status,
            Waited::TimedOut => {
                error!(command = %request.command, timeout = ?request.timeout, "command timed out");
                // Readers are left detached: a grandchild may still hold the pipes open.
                let mut result = CommandResult::failure(
                    CommandStatus::Timeout,
                    format!("killed after {:?}", request.timeout),
                );
                result.elapsed = started.elapsed();
                return result;
            }
            Waited::Failed(e) => {
                error!(command = %request.command, error = %e, "failed waiting for command");
                let mut result =
                    CommandResult::failure(CommandStatus::NonzeroExit, format!("wait failed: {e}"));
                result.elapsed = started.elapsed();
                return result;
            }
        };

        // A background process left behind by the tool can keep the pipes open
        // after the tool itself exits.
        let (Some(stdout), Some(stderr)) = (
            collect_reader(stdout_reader, deadline),
            collect_reader(stderr_reader, deadline),
        ) else {
            error!(
                command = %request.command,
                timeout = ?request.timeout,
                "output still open at deadline"
            );
            let mut result = CommandResult::failure(
                CommandStatus::Timeout,
                format!("output not closed after {:?}", request.timeout),
            );
            result.exit_code = status.code();
            result.elapsed = started.elapsed();
            return result;
        };
        let exit_code = status.code();
        debug!(command = %request.command, ?exit_code, elapsed = ?started.elapsed(), "command finished");

        let mut result = CommandResult {
            status: CommandStatus::Success,
            stdout,
            stderr,
            exit_code,
            payload: None,
            elapsed: started.elapsed(),
        };

        if !status.success() {
            if request
                .policy
                .accepts_empty(exit_code, &result.stdout, &result.stderr)
            {
                debug!(command = %request.command, ?exit_code, "non-zero exit accepted as empty result");
                result.payload = Some(empty_payload(request.format));
            } else {
                warn!(
                    command = %request.command,
                    ?exit_code,
                    stderr = %result.stderr.trim(),
                    "command failed"
                );
                result.status = CommandStatus::NonzeroExit;
            }
            return result;
        }

        match parse_output(request.format, &result.stdout) {
            Ok(payload) => result.payload = Some(payload),
            Err(e) => {
                warn!(command = %request.command, error = %e, "unparseable command output");
                result.status = CommandStatus::ParseError;
                if result.stderr.trim().is_empty() {
                    result.stderr = e.to_string();
                }
            }
        }
        result
    }
}

fn spawn_reader<R>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = tx.send(buf);
        });
        rx
    })
}

/// Output of one pipe, or `None` if it is still open at `deadline`
///
/// On `None` the reader thread is left detached; it ends once the last
/// writer closes the pipe.
fn collect_reader(reader: Option<Receiver<Vec<u8>>>, deadline: Instant) -> Option<String> {
    let Some(rx) = reader else {
        return Some(String::new());
    };
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(RecvTimeoutError::Disconnected) => Some(String::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}

fn wait_until(child: &mut Child, deadline: Instant) -> Waited {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Waited::Exited(status),
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Waited::TimedOut;
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => return Waited::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::table::{Bindings, BackendCommand, CommandTable, Tool};
    use tempfile::TempDir;

    #[cfg(unix)]
    fn scripted(dir: &TempDir, body: &str) -> SystemGateway {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("tmsu");
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        let tools = ToolRegistry::new();
        tools.set(Tool::TagBackend, &path).unwrap();
        SystemGateway::new(tools)
    }

    fn all_tags(timeout: Duration) -> CommandRequest {
        CommandTable::default().request(BackendCommand::AllTags, &Bindings::new(), timeout, None)
    }

    #[cfg(unix)]
    #[test]
    fn test_open_pipes_after_exit_time_out() {
        let dir = TempDir::new().unwrap();
        let gateway = scripted(&dir, "#!/bin/sh\nsleep 4 &\necho report\n");

        let started = Instant::now();
        let result = gateway.run(&all_tags(Duration::from_millis(500)));

        assert_eq!(result.status, CommandStatus::Timeout);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.payload.is_none());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[cfg(unix)]
    #[test]
    fn test_input_written_to_stdin() {
        let dir = TempDir::new().unwrap();
        let gateway = scripted(&dir, "#!/bin/sh\ncat\n");

        let request = all_tags(Duration::from_secs(10)).with_input("holiday\nbeach\n");
        let result = gateway.run(&request);

        assert_eq!(result.status, CommandStatus::Success);
        assert_eq!(result.lines(), ["holiday", "beach"]);
    }

    #[test]
    fn test_unconfigured_tool_is_not_spawned() {
        let gateway = SystemGateway::new(ToolRegistry::new());
        let request = CommandTable::default().request(
            BackendCommand::AllTags,
            &Bindings::new(),
            Duration::from_secs(1),
            None,
        );
        let result = gateway.run(&request);
        assert_eq!(result.status, CommandStatus::ToolMissing);
        assert_eq!(result.elapsed, Duration::ZERO);
    }

    #[test]
    fn test_tool_checked_per_request() {
        let gateway = SystemGateway::new(ToolRegistry::new());
        let request = CommandTable::default().request(
            BackendCommand::Extract,
            &Bindings::new().file("/tmp/x.jpg"),
            Duration::from_secs(1),
            None,
        );
        assert_eq!(request.tool, Tool::MetadataTool);
        assert!(!gateway.run(&request).is_success());
    }
}
