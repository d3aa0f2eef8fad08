#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use watchrun::logging::{LogSink, Tag};

/// Initialise tracing once for the whole test binary.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// `LogSink` that records every tagged line for later assertions.
#[derive(Clone, Default)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<(Tag, String)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(&self) -> Arc<dyn LogSink> {
        Arc::new(self.clone())
    }

    pub fn records(&self) -> Vec<(Tag, String)> {
        self.records.lock().unwrap().clone()
    }

    pub fn lines_with_tag(&self, tag: Tag) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(t, _)| *t == tag)
            .map(|(_, line)| line)
            .collect()
    }

    pub fn count_matching(&self, tag: Tag, needle: &str) -> usize {
        self.lines_with_tag(tag)
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }
}

impl LogSink for RecordingSink {
    fn record(&self, tag: Tag, line: &str) {
        self.records.lock().unwrap().push((tag, line.to_string()));
    }
}

/// Poll `cond` until it holds or the timeout elapses; returns the final
/// evaluation.
pub async fn wait_for<F>(cond: F, timeout: Duration) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    cond()
}
