// src/config/validate.rs

use anyhow::{anyhow, Result};

use crate::config::model::ConfigFile;
use crate::task::Task;

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - there is something to run (at least one non-empty task tree)
/// - every leaf carries a non-empty `cmd`
/// - path rules carrying glob metacharacters compile as glob patterns
///
/// It does **not** check that watched paths exist; missing roots are a
/// runtime condition handled by the indexing phase.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    let activity = &cfg.activity;

    if activity.tasks.is_empty()
        && activity.tasks_before.is_empty()
        && activity.tasks_after.is_empty()
    {
        return Err(anyhow!(
            "activity has no tasks, tasks_before, or tasks_after; nothing to run"
        ));
    }

    for (section, trees) in [
        ("tasks", &activity.tasks),
        ("tasks_before", &activity.tasks_before),
        ("tasks_after", &activity.tasks_after),
    ] {
        for tree in trees.iter() {
            validate_tree(section, tree)?;
        }
    }

    for rule in activity.watch.paths.iter().chain(&activity.ignore.paths) {
        if rule.contains('*') {
            glob::Pattern::new(rule)
                .map_err(|e| anyhow!("invalid glob pattern {rule:?}: {e}"))?;
        }
    }

    Ok(())
}

fn validate_tree(section: &str, task: &Task) -> Result<()> {
    match task {
        Task::Leaf(cmd) => {
            if cmd.cmd.trim().is_empty() {
                return Err(anyhow!("{section}: leaf command with empty `cmd`"));
            }
            Ok(())
        }
        Task::Parallel { tasks } | Task::Series { tasks } => {
            for t in tasks {
                validate_tree(section, t)?;
            }
            Ok(())
        }
    }
}
