// src/logging.rs

//! Logging setup and the record/recovery sinks.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `WATCHRUN_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Besides the `tracing` subscriber, this module defines the two sinks the
//! engine writes through:
//!
//! - [`LogSink`]: one `record` call per tagged line (command lifecycle lines
//!   and, for commands with `log: true`, every line of child output).
//! - [`RecoverySink`]: a push-only queue for non-fatal trouble (unreadable
//!   paths, glob errors, watcher transients). Pushing never blocks.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::fmt as subscriber_fmt;

use crate::cli::LogLevel;

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("WATCHRUN_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    subscriber_fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

/// Tag attached to every record handed to a [`LogSink`] or [`RecoverySink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// A line of child stdout.
    Out,
    /// A line of child stderr, or a non-zero exit report.
    Err,
    /// Command lifecycle: "Running ..." / "Finished ...".
    Cmd,
    /// A failure while indexing watch roots.
    Indexing,
    /// A raw watcher event was observed (recovery sink only).
    FileChanged,
    /// A watched file was removed and the run restarted.
    Removed,
    /// A watched file changed and the run restarted.
    Changed,
    /// The watcher reported an error.
    WatchError,
    /// Anything else non-fatal (path resolution, glob errors, ...).
    Error,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tag::Out => "Out",
            Tag::Err => "Err",
            Tag::Cmd => "Cmd",
            Tag::Indexing => "Indexing",
            Tag::FileChanged => "File Changed",
            Tag::Removed => "Removed",
            Tag::Changed => "Changed",
            Tag::WatchError => "Watch Error",
            Tag::Error => "Error",
        };
        f.write_str(s)
    }
}

/// Destination for tagged record lines.
///
/// Implementations must be safe under concurrent writers: command readers,
/// the event loop, and parallel task branches all record through one shared
/// sink. Production uses [`TracingSink`]; tests substitute a recording impl.
pub trait LogSink: Send + Sync {
    fn record(&self, tag: Tag, line: &str);
}

/// `LogSink` that forwards records to the `tracing` subscriber.
#[derive(Debug, Default, Clone)]
pub struct TracingSink;

impl TracingSink {
    pub fn shared() -> Arc<dyn LogSink> {
        Arc::new(TracingSink)
    }
}

impl LogSink for TracingSink {
    fn record(&self, tag: Tag, line: &str) {
        match tag {
            Tag::Err | Tag::WatchError | Tag::Error => warn!(tag = %tag, "{line}"),
            _ => info!(tag = %tag, "{line}"),
        }
    }
}

/// Push-only queue for non-fatal errors and event traces.
///
/// `push` enqueues on an unbounded channel and returns immediately, so it can
/// be called from the event loop, reader tasks, and the matcher without ever
/// blocking or failing. The receiving half is either drained by a background
/// logger task ([`RecoverySink::spawn_logger`]) or inspected directly by
/// tests ([`RecoverySink::new`]).
#[derive(Debug, Clone)]
pub struct RecoverySink {
    tx: mpsc::UnboundedSender<(Tag, String)>,
}

impl RecoverySink {
    /// Create a sink plus the receiving half, for callers that want to
    /// consume the queue themselves.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(Tag, String)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Create a sink drained by a background task that logs every entry.
    pub fn spawn_logger() -> Self {
        let (sink, mut rx) = Self::new();
        tokio::spawn(async move {
            while let Some((tag, msg)) = rx.recv().await {
                match tag {
                    // Raw event traces are high-volume; keep them at debug.
                    Tag::FileChanged => debug!(tag = %tag, "{msg}"),
                    _ => warn!(tag = %tag, "{msg}"),
                }
            }
        });
        sink
    }

    /// Enqueue a tagged entry. Never blocks; a closed receiver is ignored.
    pub fn push(&self, tag: Tag, msg: impl fmt::Display) {
        let _ = self.tx.send((tag, msg.to_string()));
    }
}
