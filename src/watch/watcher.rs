// src/watch/watcher.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{
    Config, Event, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher,
};
use tokio::sync::mpsc;

use crate::errors::Result;

/// What happened to a watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOp {
    Create,
    Write,
    Rename,
    Remove,
}

/// One filesystem event, reduced to the four operations the engine acts on.
#[derive(Debug, Clone)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub op: WatchOp,
}

/// Either an event or a watcher-side error, merged into one stream so the
/// event loop has a single thing to select on.
#[derive(Debug)]
pub enum WatcherSignal {
    Event(WatchEvent),
    Error(notify::Error),
}

/// Uniform wrapper over the platform notification facility.
///
/// The `notify` callback runs on the watcher's own thread; it forwards into
/// the async world over an unbounded channel. Dropping the wrapper drops the
/// underlying watcher and releases all OS resources.
pub struct FileWatcher {
    inner: Box<dyn Watcher + Send>,
    rx: mpsc::UnboundedReceiver<WatcherSignal>,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher").finish()
    }
}

impl FileWatcher {
    /// Open a watcher. `legacy` selects the polling implementation for
    /// platforms whose native notification is unreliable.
    pub fn new(legacy: bool) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel::<WatcherSignal>();

        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Some(op) = map_op(&event.kind) {
                    for path in &event.paths {
                        let _ = tx.send(WatcherSignal::Event(WatchEvent {
                            path: path.clone(),
                            op,
                        }));
                    }
                }
            }
            Err(err) => {
                let _ = tx.send(WatcherSignal::Error(err));
            }
        };

        let inner: Box<dyn Watcher + Send> = if legacy {
            let config = Config::default().with_poll_interval(Duration::from_secs(1));
            Box::new(PollWatcher::new(handler, config)?)
        } else {
            Box::new(RecommendedWatcher::new(handler, Config::default())?)
        };

        Ok(Self { inner, rx })
    }

    /// Subscribe `root` and every descendant, one non-recursive watch per
    /// path. Directories appearing later are walked by the event loop when
    /// their create event arrives.
    pub fn walk(&mut self, root: &Path) -> Result<()> {
        self.inner.watch(root, RecursiveMode::NonRecursive)?;
        if root.is_dir() {
            for entry in fs::read_dir(root)? {
                self.walk(&entry?.path())?;
            }
        }
        Ok(())
    }

    /// Best-effort unsubscribe; a path the OS already forgot is not an error
    /// worth surfacing.
    pub fn remove(&mut self, path: &Path) {
        let _ = self.inner.unwatch(path);
    }

    /// Next event or error. `None` once the watcher thread is gone.
    pub async fn recv(&mut self) -> Option<WatcherSignal> {
        self.rx.recv().await
    }
}

/// Reduce `notify`'s event taxonomy to the engine's four operations.
/// Access and metadata-only events carry no content change and are dropped.
fn map_op(kind: &EventKind) -> Option<WatchOp> {
    match kind {
        EventKind::Create(_) => Some(WatchOp::Create),
        EventKind::Remove(_) => Some(WatchOp::Remove),
        EventKind::Modify(ModifyKind::Name(_)) => Some(WatchOp::Rename),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(WatchOp::Write),
        _ => None,
    }
}
