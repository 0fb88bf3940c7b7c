//! Running external tools while streaming their output
//!
//! A child's stdout and stderr are separate pipes with bounded OS buffers. If only one
//! is read, the child blocks as soon as the other fills up. [`ProcessRunner`] therefore
//! drains stderr on a spawned task and stdout on the calling task for the whole
//! lifetime of the process, and only returns once the process has exited and both
//! streams reached end-of-file.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Size of the buffer used to copy tool output to the console
const DRAIN_BUFFER_SIZE: usize = 8 * 1024;

/// Pause after a failed read before trying the stream again
pub(crate) const READ_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Exit code reported when the process was terminated without one (e.g. by a signal)
pub const NO_EXIT_CODE: i32 = -1;

/// Something that can run an external program to completion
///
/// The production implementation is [`ProcessRunner`]. The seam exists so that the
/// downloader, archiver and pipeline can be driven by other runners (for example a
/// scripted one in tests).
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run `program` with `args` and return its exit code once it terminates
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the program cannot be started. A non-zero exit code
    /// is not an error at this level.
    async fn run(&self, program: &Path, args: &[String]) -> Result<i32>;
}

/// Runs tools as child processes, forwarding their output to the console in real time
#[derive(Clone, Debug)]
pub struct ProcessRunner {
    forward_output: bool,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    /// Runner that copies tool stdout/stderr to this process's stdout/stderr
    pub fn new() -> Self {
        Self {
            forward_output: true,
        }
    }

    /// Runner that still drains both streams but discards what it reads
    pub fn quiet() -> Self {
        Self {
            forward_output: false,
        }
    }

    fn sinks(
        &self,
    ) -> (
        Box<dyn AsyncWrite + Send + Unpin>,
        Box<dyn AsyncWrite + Send + Unpin>,
    ) {
        if self.forward_output {
            (Box::new(tokio::io::stdout()), Box::new(tokio::io::stderr()))
        } else {
            (Box::new(tokio::io::sink()), Box::new(tokio::io::sink()))
        }
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, program: &Path, args: &[String]) -> Result<i32> {
        let command_line = format_command_for_logs(program, args);
        info!(command = %command_line, "begin executing command");

        let spawn_error = |source| Error::Spawn {
            program: program.display().to_string(),
            source,
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_error(std::io::Error::other("stdout was not captured")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| spawn_error(std::io::Error::other("stderr was not captured")))?;

        let (stdout_sink, stderr_sink) = self.sinks();

        // Secondary stream on its own task, primary stream on this one
        let stderr_task = tokio::spawn(drain_stream(stderr, stderr_sink, "stderr"));
        let stdout_bytes = drain_stream(stdout, stdout_sink, "stdout").await;

        let status = child.wait().await?;

        let stderr_bytes = match stderr_task.await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "stderr drain task did not complete cleanly");
                0
            }
        };

        let exit_code = exit_code(status);
        info!(
            command = %command_line,
            exit_code,
            stdout_bytes,
            stderr_bytes,
            "execution finished"
        );
        Ok(exit_code)
    }
}

/// Copy everything from `reader` to `writer` until end-of-file
///
/// Read errors are not fatal: the loop backs off for [`READ_ERROR_BACKOFF`] and reads
/// again, since only the process's exit code decides whether the tool failed. Write
/// errors are logged and the data dropped, so a broken console never stalls the child.
///
/// Returns the number of bytes read.
pub(crate) async fn drain_stream<R, W>(mut reader: R, mut writer: W, stream: &'static str) -> u64
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; DRAIN_BUFFER_SIZE];
    let mut total = 0u64;
    let mut write_failed = false;

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                total += n as u64;
                if write_failed {
                    continue;
                }
                let written = async {
                    writer.write_all(&buf[..n]).await?;
                    writer.flush().await
                }
                .await;
                if let Err(e) = written {
                    warn!(stream, error = %e, "cannot forward tool output, discarding the rest");
                    write_failed = true;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!(stream, error = %e, "read error while draining tool output, retrying");
                tokio::time::sleep(READ_ERROR_BACKOFF).await;
            }
        }
    }

    total
}

fn exit_code(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => {
            warn!(%status, "process terminated without an exit code");
            NO_EXIT_CODE
        }
    }
}

/// Render a command line for logs, quoting arguments that need it
pub(crate) fn format_command_for_logs(program: &Path, args: &[String]) -> String {
    std::iter::once(shell_escape(&program.to_string_lossy()))
        .chain(args.iter().map(|arg| shell_escape(arg)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}
