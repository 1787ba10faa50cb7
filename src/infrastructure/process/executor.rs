// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Subprocess execution with timeout and cancellation.
//!
//! The executor knows nothing about kind. It spawns a program, feeds the
//! optional stdin document, collects stdout/stderr and the exit code, and
//! guarantees the child is killed and reaped when the call times out, is
//! cancelled, or the future is dropped.
//!
//! On unix the child leads its own process group and the whole group is
//! killed, so helpers it forked (kind runs docker/podman) die with it.

use crate::shared::error::{KindError, Result};
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub stdin: Option<Vec<u8>>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Program and arguments joined for logs and error messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a process that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Runs external commands. A non-zero exit code is returned as data; only
/// failing to execute at all is an error.
#[async_trait::async_trait]
pub trait ProcessExecutor: Send + Sync {
    async fn run(
        &self,
        invocation: &Invocation,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput>;
}

/// [`ProcessExecutor`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessExecutor;

impl TokioProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

enum Outcome {
    Finished(Result<ProcessOutput>),
    TimedOut,
    Cancelled,
}

#[async_trait::async_trait]
impl ProcessExecutor for TokioProcessExecutor {
    async fn run(
        &self,
        invocation: &Invocation,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput> {
        let command_line = invocation.command_line();
        if cancel.is_cancelled() {
            return Err(KindError::Cancelled {
                command: command_line,
            });
        }

        debug!(
            command = %command_line,
            timeout_secs = timeout.as_secs(),
            "Spawning process"
        );

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|e| spawn_error(&invocation.program, e))?;
        // Declared after `child` so it drops first and takes the group down.
        let mut group = GroupKill::new(&child);

        let outcome = {
            let io = collect_output(&mut child, invocation.stdin.as_deref());
            tokio::select! {
                result = io => Outcome::Finished(result),
                _ = tokio::time::sleep(timeout) => Outcome::TimedOut,
                _ = cancel.cancelled() => Outcome::Cancelled,
            }
        };

        match outcome {
            Outcome::Finished(result) => {
                group.disarm();
                if let Ok(output) = &result {
                    debug!(
                        command = %command_line,
                        exit_code = output.exit_code,
                        "Process finished"
                    );
                }
                result
            }
            Outcome::TimedOut => {
                warn!(command = %command_line, "Process timed out, killing it");
                terminate(&mut child, &mut group, &command_line).await;
                Err(KindError::timeout(command_line, timeout))
            }
            Outcome::Cancelled => {
                warn!(command = %command_line, "Process cancelled, killing it");
                terminate(&mut child, &mut group, &command_line).await;
                Err(KindError::Cancelled {
                    command: command_line,
                })
            }
        }
    }
}

async fn collect_output(child: &mut Child, input: Option<&[u8]>) -> Result<ProcessOutput> {
    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (written, out, err) = tokio::join!(
        write_input(stdin, input),
        read_pipe(stdout),
        read_pipe(stderr)
    );
    written?;

    let status = child.wait().await?;
    Ok(ProcessOutput {
        stdout: out?,
        stderr: err?,
        // Killed by a signal
        exit_code: status.code().unwrap_or(-1),
    })
}

async fn write_input(pipe: Option<ChildStdin>, input: Option<&[u8]>) -> io::Result<()> {
    if let (Some(mut pipe), Some(bytes)) = (pipe, input) {
        // A child may exit without draining its input.
        if let Err(e) = pipe.write_all(bytes).await {
            if e.kind() != io::ErrorKind::BrokenPipe {
                return Err(e);
            }
        }
        // Dropping the handle closes the pipe and signals EOF.
    }
    Ok(())
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

async fn terminate(child: &mut Child, group: &mut GroupKill, command_line: &str) {
    group.kill();
    // kill() also waits, so the child is reaped and leaves no zombie.
    if let Err(e) = child.kill().await {
        warn!(command = %command_line, error = %e, "Failed to kill process");
    }
}

/// SIGKILLs the child's process group when dropped, unless disarmed after the
/// child ran to completion.
struct GroupKill {
    pgid: Option<i32>,
}

impl GroupKill {
    fn new(child: &Child) -> Self {
        Self {
            pgid: child.id().and_then(|id| i32::try_from(id).ok()),
        }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }
}

impl Drop for GroupKill {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_group(pgid: i32) {
    // SAFETY: kill(2) takes plain integers and touches no memory of ours.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        // ESRCH: every member already exited.
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!(pgid, error = %err, "Failed to kill process group");
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: i32) {}

fn spawn_error(program: &str, err: io::Error) -> KindError {
    match err.kind() {
        io::ErrorKind::NotFound => KindError::ExecutableNotFound {
            program: program.to_string(),
        },
        io::ErrorKind::PermissionDenied => KindError::RuntimeUnavailable {
            message: format!("permission denied executing '{}'", program),
            stderr: String::new(),
        },
        _ => KindError::Io(err),
    }
}
