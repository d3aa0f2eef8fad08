// src/engine/activity.rs

//! The activity loop: indexing, before/after phases, and debounced
//! restart-on-change of the main task tree.

use std::fs::Metadata;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::{ActivityConfig, Options};
use crate::logging::{LogSink, RecoverySink, Tag};
use crate::task::{self, RunContext, Task};
use crate::watch::filter::{absolute, ext_of};
use crate::watch::{FileWatcher, PathFilter, WatchEvent, WatchOp, WatcherSignal};

/// Coalesces bursts of filesystem events into at most one restart per
/// truncated wall-clock second.
///
/// `admit` is consulted for every event; only a file-change restart calls
/// `mark`, so removals and directory walks never push the watermark forward.
#[derive(Debug, Default)]
pub struct Debounce {
    last: u64,
}

impl Debounce {
    /// Admit events strictly after the watermark second.
    pub fn admit(&self, now: u64) -> bool {
        now > self.last
    }

    /// Move the watermark to the given (truncated) second.
    pub fn mark(&mut self, now: u64) {
        self.last = now;
    }
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// One watch-and-run unit: watch/ignore rules plus the three task trees.
///
/// The activity owns the watcher for its whole life; run contexts come and
/// go with every restart. At most one run context is current at a time: a
/// restart cancels the old context's token and mints a fresh one, while the
/// old tree finishes tearing itself down in the background task that owns
/// it.
pub struct Activity {
    filter: PathFilter,
    watch_paths: Vec<String>,
    before: Task,
    main: Arc<Task>,
    after: Task,
    options: Options,
    sink: Arc<dyn LogSink>,
    recovery: RecoverySink,
}

impl Activity {
    pub fn from_config(
        activity: ActivityConfig,
        sink: Arc<dyn LogSink>,
        recovery: RecoverySink,
    ) -> Self {
        let watch_paths = activity.watch.paths.clone();
        let filter = PathFilter::new(activity.watch, activity.ignore, recovery.clone());

        Self {
            filter,
            watch_paths,
            before: Task::from_list(activity.tasks_before),
            main: Arc::new(Task::from_list(activity.tasks)),
            after: Task::from_list(activity.tasks_after),
            options: activity.options,
            sink,
            recovery,
        }
    }

    /// Watch and run until the shutdown channel fires (or closes).
    ///
    /// Phases: index the watch roots while the `before` tree runs to
    /// completion; start the `main` tree; then loop on watcher signals,
    /// restarting `main` on every accepted change. On shutdown the current
    /// run is cancelled and the `after` tree runs once on a fresh token.
    pub async fn scan(self, mut shutdown: mpsc::Receiver<()>) -> Result<()> {
        let mut watcher =
            FileWatcher::new(self.options.legacy_watcher).context("creating file watcher")?;
        info!(legacy = self.options.legacy_watcher, "activity started");

        // Indexing and the before tree proceed concurrently; both are done
        // before the first main run starts. The before context is never
        // cancelled from outside.
        let before_ctx = RunContext::new(Arc::clone(&self.sink), self.recovery.clone());
        tokio::join!(
            async { self.index_roots(&mut watcher) },
            task::run(&self.before, &before_ctx),
        );

        let mut current = self.start_run();
        let mut debounce = Debounce::default();

        loop {
            tokio::select! {
                signal = watcher.recv() => {
                    match signal {
                        None => {
                            debug!("watcher stream ended");
                            break;
                        }
                        Some(WatcherSignal::Error(err)) => {
                            self.recovery.push(Tag::WatchError, err);
                        }
                        Some(WatcherSignal::Event(event)) => {
                            self.handle_event(event, &mut watcher, &mut current, &mut debounce);
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("shutdown requested, stopping activity");
                    break;
                }
            }
        }

        // The after tree runs exactly once, on a fresh never-cancelled
        // token, after the current run is cancelled.
        current.cancel.cancel();
        let after_ctx = RunContext::new(Arc::clone(&self.sink), self.recovery.clone());
        task::run(&self.after, &after_ctx).await;

        Ok(())
    }

    /// One before/main/after cycle with no watcher and no event loop.
    pub async fn run_once(self) -> Result<()> {
        for tree in [&self.before, self.main.as_ref(), &self.after] {
            let ctx = RunContext::new(Arc::clone(&self.sink), self.recovery.clone());
            task::run(tree, &ctx).await;
        }
        Ok(())
    }

    /// React to one watcher event.
    ///
    /// This runs on the event-loop task itself so that cancelling the old
    /// run and dispatching the new one are atomic with respect to event
    /// handling. The old tree is not awaited: its background task observes
    /// the cancelled token, kills its processes, and reaps them while the
    /// new run is already going.
    fn handle_event(
        &self,
        event: WatchEvent,
        watcher: &mut FileWatcher,
        current: &mut RunContext,
        debounce: &mut Debounce,
    ) {
        let name = event.path.to_string_lossy().into_owned();
        self.recovery.push(Tag::FileChanged, &name);

        let now = unix_seconds();
        if !debounce.admit(now) {
            return;
        }

        match event.op {
            WatchOp::Remove => {
                watcher.remove(&event.path);
                let (ok, _) = self.filter.validate(&name, false);
                if ok && !ext_of(&name).is_empty() {
                    current.cancel.cancel();
                    self.sink.record(Tag::Removed, &name);
                    *current = self.start_run();
                }
            }
            WatchOp::Create | WatchOp::Write | WatchOp::Rename => {
                let (ok, info) = self.filter.validate(&name, true);
                if !ok {
                    return;
                }
                if info.as_ref().is_some_and(Metadata::is_dir) {
                    // A new directory extends the watch set, nothing reruns.
                    if let Err(err) = watcher.walk(&event.path) {
                        self.recovery.push(Tag::Indexing, err);
                    }
                } else {
                    current.cancel.cancel();
                    self.sink.record(Tag::Changed, &name);
                    *current = self.start_run();
                    debounce.mark(now);
                }
            }
        }
    }

    /// Mint a fresh run context and dispatch the main tree on it.
    fn start_run(&self) -> RunContext {
        let ctx = RunContext::new(Arc::clone(&self.sink), self.recovery.clone());
        let tree = Arc::clone(&self.main);
        let run_ctx = ctx.clone();
        tokio::spawn(async move {
            task::run(&tree, &run_ctx).await;
        });
        ctx
    }

    /// Resolve every watch root, expand globs against the filesystem, and
    /// subscribe each existing expansion. A root that fails to index is
    /// reported and the remaining roots continue.
    fn index_roots(&self, watcher: &mut FileWatcher) {
        debug!(roots = self.watch_paths.len(), "indexing watch roots");
        for entry in &self.watch_paths {
            let abs = match absolute(entry) {
                Ok(p) => p,
                Err(err) => {
                    self.recovery
                        .push(Tag::Indexing, format!("resolving {entry:?}: {err}"));
                    continue;
                }
            };

            let expansions = match glob::glob(&abs.to_string_lossy()) {
                Ok(paths) => paths,
                Err(err) => {
                    self.recovery
                        .push(Tag::Indexing, format!("glob {entry:?}: {err}"));
                    continue;
                }
            };

            for expansion in expansions {
                match expansion {
                    Ok(path) => {
                        if path.exists() {
                            if let Err(err) = watcher.walk(&path) {
                                self.recovery.push(
                                    Tag::Indexing,
                                    format!("walking {}: {err}", path.display()),
                                );
                            }
                        }
                    }
                    Err(err) => {
                        self.recovery
                            .push(Tag::Indexing, format!("glob {entry:?}: {err}"));
                    }
                }
            }
        }
    }
}
