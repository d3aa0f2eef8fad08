// src/task/runner.rs

//! Task-tree execution under a shared cancellation token.

use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::exec;
use crate::logging::{LogSink, RecoverySink, Tag};
use crate::task::Task;

/// Everything one run of a task tree shares: the cancellation token that
/// every spawned command observes, and the sinks output flows into.
///
/// A context is minted per run and never reused: cancelling it is a one-shot
/// broadcast, and lingering readers from a cancelled run may still observe
/// the old token while they drain their pipes.
#[derive(Clone)]
pub struct RunContext {
    pub cancel: CancellationToken,
    pub sink: Arc<dyn LogSink>,
    pub recovery: RecoverySink,
}

impl RunContext {
    pub fn new(sink: Arc<dyn LogSink>, recovery: RecoverySink) -> Self {
        Self {
            cancel: CancellationToken::new(),
            sink,
            recovery,
        }
    }
}

/// Execute a task tree.
///
/// - `Leaf`: skipped when the token is already cancelled or the command is
///   empty; otherwise handed to [`exec::exec`]. Spawn/pipe failures are
///   reported and the walk continues.
/// - `Parallel`: all children start concurrently and are all awaited, even
///   ones that return early due to cancellation. Children never cancel each
///   other; only the shared token does.
/// - `Series`: children run in declared order; once the token fires, the
///   remaining children are skipped while the in-flight one is torn down
///   through the kill path in [`exec::exec`].
///
/// Cancellation is cooperative at exactly those two points; there is no
/// arbitrary-point abort.
pub fn run<'a>(task: &'a Task, ctx: &'a RunContext) -> BoxFuture<'a, ()> {
    async move {
        match task {
            Task::Leaf(cmd) => {
                if ctx.cancel.is_cancelled() || cmd.cmd.trim().is_empty() {
                    return;
                }
                if let Err(err) = exec::exec(cmd, &ctx.sink, &ctx.cancel).await {
                    ctx.recovery.push(Tag::Error, &err);
                }
            }
            Task::Parallel { tasks } => {
                join_all(tasks.iter().map(|t| run(t, ctx))).await;
            }
            Task::Series { tasks } => {
                for t in tasks {
                    if ctx.cancel.is_cancelled() {
                        break;
                    }
                    run(t, ctx).await;
                }
            }
        }
    }
    .boxed()
}
