mod common;

use std::error::Error;
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use common::{init_tracing, RecordingSink};
use watchrun::exec::{exec, ExecError};
use watchrun::logging::{RecoverySink, Tag};
use watchrun::task::{run, Command, RunContext, Task};

type TestResult = Result<(), Box<dyn Error>>;

fn leaf(cmd: &str, log: bool) -> Task {
    Task::Leaf(Command {
        cmd: cmd.into(),
        dir: None,
        log,
    })
}

fn context(sink: &RecordingSink) -> RunContext {
    let (recovery, _rx) = RecoverySink::new();
    RunContext::new(sink.shared(), recovery)
}

#[tokio::test]
async fn series_runs_children_in_declared_order() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();
    let tree = Task::Series {
        tasks: vec![leaf("echo a", true), leaf("echo b", true)],
    };

    run(&tree, &context(&sink)).await;

    let cmd_lines = sink.lines_with_tag(Tag::Cmd);
    assert_eq!(cmd_lines.len(), 4, "records: {cmd_lines:?}");
    assert_eq!(cmd_lines[0], "Running 'echo a'");
    assert!(cmd_lines[1].starts_with("Finished 'echo a' in "));
    assert_eq!(cmd_lines[2], "Running 'echo b'");
    assert!(cmd_lines[3].starts_with("Finished 'echo b' in "));

    assert_eq!(sink.lines_with_tag(Tag::Out), vec!["a", "b"]);
    Ok(())
}

#[tokio::test]
async fn parallel_children_overlap_and_die_on_cancellation() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();
    let tree = Task::Parallel {
        tasks: vec![leaf("sleep 10", false), leaf("sleep 10", false)],
    };

    let ctx = context(&sink);
    let cancel = ctx.cancel.clone();
    let started = Instant::now();

    let run_ctx = ctx.clone();
    let handle = tokio::spawn(async move {
        run(&tree, &run_ctx).await;
    });

    // Both children start before either finishes.
    assert!(
        common::wait_for(
            || sink.count_matching(Tag::Cmd, "Running 'sleep 10'") == 2,
            Duration::from_secs(2),
        )
        .await,
        "records: {:?}",
        sink.records()
    );
    assert_eq!(sink.count_matching(Tag::Cmd, "Finished 'sleep 10'"), 0);

    cancel.cancel();
    timeout(Duration::from_secs(2), handle).await??;
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "cancellation did not tear the children down promptly"
    );

    assert_eq!(sink.count_matching(Tag::Cmd, "Finished 'sleep 10'"), 2);
    Ok(())
}

#[tokio::test]
async fn pre_cancelled_run_spawns_nothing() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();
    let tree = Task::Series {
        tasks: vec![
            leaf("echo never", true),
            Task::Parallel {
                tasks: vec![leaf("echo also-never", true)],
            },
        ],
    };

    let ctx = context(&sink);
    ctx.cancel.cancel();
    run(&tree, &ctx).await;

    assert!(sink.records().is_empty(), "records: {:?}", sink.records());
    Ok(())
}

#[tokio::test]
async fn spawn_failure_does_not_abort_the_series() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();
    let (recovery, mut recovery_rx) = RecoverySink::new();
    let ctx = RunContext::new(sink.shared(), recovery);

    let tree = Task::Series {
        tasks: vec![
            leaf("definitely-not-a-real-program-zzz", false),
            leaf("echo after", true),
        ],
    };
    run(&tree, &ctx).await;

    // The broken leaf never got a lifecycle record, the next leaf ran.
    assert_eq!(sink.count_matching(Tag::Cmd, "definitely-not"), 0);
    assert_eq!(sink.lines_with_tag(Tag::Out), vec!["after"]);

    let (tag, msg) = recovery_rx.try_recv()?;
    assert_eq!(tag, Tag::Error);
    assert!(msg.contains("spawning"), "unexpected recovery entry: {msg}");
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_is_a_completion_not_an_error() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();
    let tree = Task::Series {
        tasks: vec![leaf("false", false), leaf("echo next", true)],
    };

    run(&tree, &context(&sink)).await;

    assert_eq!(sink.count_matching(Tag::Err, "'false' exited with status 1"), 1);
    assert_eq!(sink.count_matching(Tag::Cmd, "Finished 'false'"), 1);
    assert_eq!(sink.lines_with_tag(Tag::Out), vec!["next"]);
    Ok(())
}

#[tokio::test]
async fn command_runs_in_its_configured_dir() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let dir = tmp.path().canonicalize()?;

    let sink = RecordingSink::new();
    let sink_arc = sink.shared();
    let cmd = Command {
        cmd: "pwd".into(),
        dir: Some(dir.display().to_string()),
        log: true,
    };

    exec(&cmd, &sink_arc, &CancellationToken::new()).await?;

    assert_eq!(sink.lines_with_tag(Tag::Out), vec![dir.display().to_string()]);
    Ok(())
}

#[tokio::test]
async fn empty_command_is_a_spawn_error() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();
    let sink_arc = sink.shared();
    let cmd = Command {
        cmd: "   ".into(),
        dir: None,
        log: false,
    };

    let err = exec(&cmd, &sink_arc, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExecError::Spawn { .. }));
    assert!(sink.records().is_empty());
    Ok(())
}

#[tokio::test]
async fn output_is_not_forwarded_without_log() -> TestResult {
    init_tracing();
    let sink = RecordingSink::new();

    run(&leaf("echo silent", false), &context(&sink)).await;

    assert!(sink.lines_with_tag(Tag::Out).is_empty());
    // Lifecycle records are emitted regardless.
    assert_eq!(sink.count_matching(Tag::Cmd, "Running 'echo silent'"), 1);
    Ok(())
}
