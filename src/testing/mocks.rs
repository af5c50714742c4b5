//! Mock implementations of the worker seam.
//!
//! These mocks provide controllable test doubles for the external worker
//! process, enabling deterministic unit tests of the loop controller.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{Result, WorkloopError};
use crate::worker::{WorkerOutcome, WorkerProcess, COMPLETION_MARKER};

/// Mock worker that replays a scripted sequence of outcomes.
///
/// # Example
///
/// ```rust,ignore
/// let worker = MockWorker::new()
///     .then_output("still working")
///     .then_complete();
/// ```
#[derive(Debug, Default)]
pub struct MockWorker {
    script: Mutex<Vec<WorkerOutcome>>,
    invocations: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockWorker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an invocation that produces plain output without the marker.
    #[must_use]
    pub fn then_output(self, output: &str) -> Self {
        self.push(WorkerOutcome {
            output: output.to_string(),
            timed_out: false,
            exit_code: Some(0),
        })
    }

    /// Queue an invocation that emits the completion marker.
    #[must_use]
    pub fn then_complete(self) -> Self {
        self.push(WorkerOutcome {
            output: format!("all done\n{}\n", COMPLETION_MARKER),
            timed_out: false,
            exit_code: Some(0),
        })
    }

    /// Queue an invocation that times out after producing partial output.
    #[must_use]
    pub fn then_timeout(self, partial_output: &str) -> Self {
        self.push(WorkerOutcome {
            output: partial_output.to_string(),
            timed_out: true,
            exit_code: None,
        })
    }

    fn push(self, outcome: WorkerOutcome) -> Self {
        self.script.lock().unwrap().push(outcome);
        self
    }

    /// How many times the worker was invoked.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// The prompts the worker received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkerProcess for MockWorker {
    async fn invoke(&self, prompt: &str) -> Result<WorkerOutcome> {
        let index = self.invocations.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        let script = self.script.lock().unwrap();
        match script.get(index) {
            Some(outcome) => Ok(outcome.clone()),
            None => Err(WorkloopError::worker(format!(
                "mock script exhausted at invocation {}",
                index + 1
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_replays_script_in_order() {
        let worker = MockWorker::new().then_output("one").then_complete();

        let first = worker.invoke("p1").await.unwrap();
        assert!(!first.is_complete());

        let second = worker.invoke("p2").await.unwrap();
        assert!(second.is_complete());

        assert_eq!(worker.invocations(), 2);
        assert_eq!(worker.prompts(), vec!["p1".to_string(), "p2".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_timeout_outcome() {
        let worker = MockWorker::new().then_timeout("half finished");
        let outcome = worker.invoke("p").await.unwrap();
        assert!(outcome.timed_out);
        assert!(outcome.output.contains("half finished"));
    }

    #[tokio::test]
    async fn test_exhausted_script_errors() {
        let worker = MockWorker::new();
        assert!(worker.invoke("p").await.is_err());
    }
}
