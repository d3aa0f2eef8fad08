// src/config/model.rs

use serde::Deserialize;

use crate::task::Task;
use crate::watch::{Ignore, Watch};

/// Top-level configuration as read from a YAML file.
///
/// ```yaml
/// activity:
///   watch:  { exts: [go], paths: ["src", "cmd/**/*.go"] }
///   ignore: { dot: true, paths: [vendor] }
///   tasks:
///     - cmd: "go build ./..."
///       log: true
///   tasks_before:
///     - cmd: "echo starting"
///   tasks_after:
///     - cmd: "echo bye"
///   options: { legacy_watcher: false }
/// ```
///
/// All sections are optional and default to empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub activity: ActivityConfig,
}

/// The `activity:` section: one watch-and-run unit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityConfig {
    #[serde(default)]
    pub watch: Watch,

    #[serde(default)]
    pub ignore: Ignore,

    /// The main task tree, restarted on every relevant change.
    #[serde(default)]
    pub tasks: Vec<Task>,

    /// Runs once, to completion, before the first main run.
    #[serde(default)]
    pub tasks_before: Vec<Task>,

    /// Runs once, on shutdown, after the last main run is cancelled.
    #[serde(default)]
    pub tasks_after: Vec<Task>,

    #[serde(default)]
    pub options: Options,
}

/// Behaviour toggles for the activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Options {
    /// Use the polling watcher instead of the platform's native
    /// notification facility.
    #[serde(default)]
    pub legacy_watcher: bool,
}
