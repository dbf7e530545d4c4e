//! Streaming transcoder child processes.
//!
//! A [`TranscodeProcess`] owns one encoder child for the lifetime of one
//! response. Its stdout is handed to the caller as a byte stream; its
//! stderr is drained in the background so the pipe never fills up. The
//! child is killed when the handle is dropped before the process has been
//! waited on, which covers client disconnects and error paths alike.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::task::JoinHandle;
use vidshelf_common::{Error, Result};

use crate::command::program_name;

/// Stderr lines kept for the failure message.
const STDERR_TAIL_LINES: usize = 16;

/// How long `finish` waits for the stderr drain after the child exits.
const STDERR_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// A running transcoder whose output is consumed as a stream.
#[derive(Debug)]
pub struct TranscodeProcess {
    child: Child,
    tool: String,
    input: PathBuf,
    stdout: Option<ChildStdout>,
    stderr_task: Option<JoinHandle<Vec<String>>>,
    exited: bool,
}

impl TranscodeProcess {
    /// Spawn `program` with fully substituted `args`, reading `input`.
    ///
    /// Must be called from within a tokio runtime (the stderr drain runs as
    /// a task).
    pub fn spawn(program: &Path, args: &[String], input: &Path) -> Result<Self> {
        let tool = program_name(program);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::tool(
                    &tool,
                    format!("failed to spawn for {}: {e}", input.display()),
                )
            })?;

        let stdout = child.stdout.take();
        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(drain_stderr(stderr, input.to_path_buf())));

        tracing::debug!(
            pid = ?child.id(),
            input = %input.display(),
            "Spawned {tool}"
        );

        Ok(Self {
            child,
            tool,
            input: input.to_path_buf(),
            stdout,
            stderr_task,
            exited: false,
        })
    }

    /// OS process id, while the child is still running.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Name of the tool being run.
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Take the child's stdout. Returns `None` on the second call.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// Wait for the child to exit.
    ///
    /// Returns `Ok(())` on a zero exit status, otherwise [`Error::Tool`]
    /// carrying the exit status and the tail of the child's stderr.
    pub async fn finish(&mut self) -> Result<()> {
        // An unread stdout would keep a chatty child blocked on a full pipe.
        self.stdout.take();

        let status = self.child.wait().await.map_err(|e| {
            Error::tool(&self.tool, format!("I/O error waiting for process: {e}"))
        })?;
        self.exited = true;

        let tail = match self.stderr_task.take() {
            Some(task) => match tokio::time::timeout(STDERR_FLUSH_TIMEOUT, task).await {
                Ok(Ok(lines)) => lines,
                _ => Vec::new(),
            },
            None => Vec::new(),
        };

        if status.success() {
            tracing::debug!(input = %self.input.display(), "{} finished", self.tool);
            Ok(())
        } else {
            Err(Error::tool(&self.tool, describe_failure(status, &tail)))
        }
    }
}

impl Drop for TranscodeProcess {
    fn drop(&mut self) {
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }

        if self.exited {
            return;
        }

        match self.child.try_wait() {
            Ok(Some(_)) => {}
            _ => {
                tracing::info!(
                    pid = ?self.child.id(),
                    input = %self.input.display(),
                    "Terminating {} before completion",
                    self.tool
                );
                if let Err(e) = self.child.start_kill() {
                    tracing::warn!("Failed to kill {}: {e}", self.tool);
                }
            }
        }
    }
}

/// Log every stderr line and keep the last few for error reporting.
async fn drain_stderr(stderr: ChildStderr, input: PathBuf) -> Vec<String> {
    let mut lines = BufReader::new(stderr).lines();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                tracing::debug!(input = %input.display(), "{line}");
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(input = %input.display(), "stderr read failed: {e}");
                break;
            }
        }
    }

    tail.into()
}

fn describe_failure(status: ExitStatus, stderr_tail: &[String]) -> String {
    let code = status
        .code()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string());
    let detail = stderr_tail
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" | ");

    if detail.is_empty() {
        format!("exited with code {code}")
    } else {
        format!("exited with code {code}: {detail}")
    }
}
