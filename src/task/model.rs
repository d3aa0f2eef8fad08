// src/task/model.rs

use serde::Deserialize;

/// One shell command in a task tree.
///
/// `cmd` is tokenized on spaces at execution time; there is no shell
/// interpretation and no quoting. `dir` overrides the working directory
/// (process CWD when absent). `log` forwards the child's output lines to the
/// log sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Command {
    pub cmd: String,

    #[serde(default)]
    pub dir: Option<String>,

    #[serde(default)]
    pub log: bool,
}

impl Command {
    /// Short display form used in lifecycle records: everything before the
    /// first ` -`, so `go build -v ./...` shows as `go build`.
    pub fn display_name(&self) -> &str {
        self.cmd.split(" -").next().unwrap_or(&self.cmd)
    }
}

/// A node in a task tree.
///
/// Trees nest arbitrarily: a `Series` runs children left-to-right, each one
/// fully completing before the next starts; a `Parallel` starts all children
/// concurrently and completes when all have completed.
///
/// The YAML shape is one mapping per node:
///
/// ```yaml
/// - cmd: "go build ./..."
///   log: true
/// - parallel:
///     - cmd: "go vet ./..."
///     - sequence:
///         - cmd: "go test ./core"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Task {
    Parallel {
        #[serde(rename = "parallel")]
        tasks: Vec<Task>,
    },
    Series {
        #[serde(rename = "sequence")]
        tasks: Vec<Task>,
    },
    Leaf(Command),
}

impl Task {
    /// Wrap a configured list of nodes into a single tree. A configured list
    /// runs with series semantics at the top level.
    pub fn from_list(nodes: Vec<Task>) -> Task {
        Task::Series { tasks: nodes }
    }

    /// True when the tree contains no runnable command at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Task::Leaf(c) => c.cmd.trim().is_empty(),
            Task::Parallel { tasks } | Task::Series { tasks } => {
                tasks.iter().all(Task::is_empty)
            }
        }
    }
}
