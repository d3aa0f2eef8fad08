// src/exec/command.rs

//! Single-command execution with output streaming and kill-on-cancel.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::logging::{LogSink, Tag};
use crate::task::Command;

/// Failure to get a command off the ground. A command that starts and exits
/// non-zero is a *completion*, not an `ExecError`; the exit status is
/// reported through the log sink instead.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The program could not be started at all.
    #[error("spawning '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A stdio pipe could not be attached to the child.
    #[error("attaching {stream} pipe for '{program}'")]
    Pipe {
        program: String,
        stream: &'static str,
    },
}

/// Execute one command to completion or cancellation.
///
/// `cmd.cmd` is split on ASCII spaces into argv; the first token is the
/// program. The working directory is `cmd.dir` when non-empty, else the
/// process CWD. Stdout and stderr are always drained line-by-line so the OS
/// pipe buffers never fill; non-empty lines are forwarded to `sink` (tagged
/// `Out`/`Err`) only when `cmd.log` is set.
///
/// If `cancel` fires before the child exits, the child is hard-killed and
/// reaped. After either termination path a SIGINT is sent defensively
/// (idempotent if the process is already dead). A `Finished` record is
/// emitted on every path that got past spawning.
pub async fn exec(
    cmd: &Command,
    sink: &Arc<dyn LogSink>,
    cancel: &CancellationToken,
) -> Result<(), ExecError> {
    let mut argv = cmd.cmd.split(' ').filter(|s| !s.is_empty());
    let program = argv.next().unwrap_or_default().to_string();
    if program.is_empty() {
        return Err(ExecError::Spawn {
            program,
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        });
    }

    let mut command = TokioCommand::new(&program);
    command
        .args(argv)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = cmd.dir.as_deref().filter(|d| !d.is_empty()) {
        command.current_dir(dir);
    }

    let mut child = command.spawn().map_err(|source| ExecError::Spawn {
        program: program.clone(),
        source,
    })?;

    sink.record(Tag::Cmd, &format!("Running '{}'", cmd.display_name()));
    let started = Instant::now();
    let pid = child.id();

    let stdout = child.stdout.take().ok_or(ExecError::Pipe {
        program: program.clone(),
        stream: "stdout",
    })?;
    let stderr = child.stderr.take().ok_or(ExecError::Pipe {
        program: program.clone(),
        stream: "stderr",
    })?;

    let forward = cmd.log.then(|| Arc::clone(sink));
    let readers = [
        spawn_line_reader(BufReader::new(stdout), Tag::Out, forward.clone()),
        spawn_line_reader(BufReader::new(stderr), Tag::Err, forward),
    ];

    let status = tokio::select! {
        res = child.wait() => res.ok(),
        _ = cancel.cancelled() => None,
    };

    if status.is_none() {
        // Cancelled (or wait failed): hard-kill and reap.
        if let Err(err) = child.kill().await {
            debug!(program = %program, error = %err, "kill after cancellation failed");
        }
    }

    // Follow-up interrupt on the recorded pid; idempotent when the process
    // is already gone.
    #[cfg(unix)]
    if let Some(pid) = pid {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGINT);
    }
    #[cfg(not(unix))]
    let _ = pid;

    // The pipes are closed once the child is gone, so both readers finish.
    for reader in readers {
        let _ = reader.await;
    }

    if let Some(status) = status {
        if !status.success() {
            let code = status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            sink.record(
                Tag::Err,
                &format!("'{}' exited with status {code}", cmd.display_name()),
            );
        }
    }

    sink.record(
        Tag::Cmd,
        &format!(
            "Finished '{}' in {:.3}s",
            cmd.display_name(),
            started.elapsed().as_secs_f64()
        ),
    );

    Ok(())
}

/// Drain a child stream line-by-line, forwarding non-empty lines to the sink
/// when one is given. The task ends when the pipe closes.
fn spawn_line_reader<R>(
    reader: R,
    tag: Tag,
    sink: Option<Arc<dyn LogSink>>,
) -> JoinHandle<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = reader.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.is_empty() {
                continue;
            }
            if let Some(sink) = &sink {
                sink.record(tag, &line);
            }
        }
    })
}
