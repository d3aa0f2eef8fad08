// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod task;
pub mod watch;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, ConfigFile};
use crate::engine::Activity;
use crate::logging::{RecoverySink, TracingSink};
use crate::task::Task;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the sinks
/// - the activity (watcher + filter + task runner)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let sink = TracingSink::shared();
    let recovery = RecoverySink::spawn_logger();

    let mut activity_cfg = cfg.activity;
    if args.poll {
        activity_cfg.options.legacy_watcher = true;
    }

    let activity = Activity::from_config(activity_cfg, sink, recovery);

    if args.once {
        info!("running once, no watching");
        return join_activity(tokio::spawn(activity.run_once())).await;
    }

    // Ctrl-C → graceful shutdown.
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = shutdown_tx.send(()).await;
    });

    join_activity(tokio::spawn(activity.scan(shutdown_rx))).await
}

/// Await the spawned activity, converting a panic inside it into a returned
/// error at this boundary.
async fn join_activity(handle: tokio::task::JoinHandle<Result<()>>) -> Result<()> {
    match handle.await {
        Ok(res) => res,
        Err(err) if err.is_panic() => Err(anyhow!("activity panicked: {err}")),
        Err(err) => Err(anyhow!(err)),
    }
}

/// Simple dry-run output: print rules and task trees.
fn print_dry_run(cfg: &ConfigFile) {
    let a = &cfg.activity;

    println!("watchrun dry-run");
    println!("  watch.exts   = {:?}", a.watch.exts);
    println!("  watch.paths  = {:?}", a.watch.paths);
    println!("  ignore.dot   = {}", a.ignore.dot);
    println!("  ignore.exts  = {:?}", a.ignore.exts);
    println!("  ignore.paths = {:?}", a.ignore.paths);
    println!("  options.legacy_watcher = {}", a.options.legacy_watcher);
    println!();

    for (name, trees) in [
        ("tasks_before", &a.tasks_before),
        ("tasks", &a.tasks),
        ("tasks_after", &a.tasks_after),
    ] {
        if trees.is_empty() {
            continue;
        }
        println!("{name}:");
        print_tree(trees, 1);
    }

    debug!("dry-run complete (no execution)");
}

fn print_tree(nodes: &[Task], depth: usize) {
    let pad = "  ".repeat(depth);
    for node in nodes {
        match node {
            Task::Leaf(c) => {
                print!("{pad}- cmd: {}", c.cmd);
                if let Some(dir) = c.dir.as_deref().filter(|d| !d.is_empty()) {
                    print!(" (dir: {dir})");
                }
                if c.log {
                    print!(" [log]");
                }
                println!();
            }
            Task::Parallel { tasks } => {
                println!("{pad}- parallel:");
                print_tree(tasks, depth + 1);
            }
            Task::Series { tasks } => {
                println!("{pad}- sequence:");
                print_tree(tasks, depth + 1);
            }
        }
    }
}
