//! Fan-out executor: launch a fixed batch of tasks, join on all of them
//!
//! Each slot runs as its own tokio task inside a `JoinSet`. Outcomes are put
//! back by slot index, so outcome `i` always belongs to slot `i` no matter
//! which task finishes first. A failing or panicking task never cancels its
//! siblings. Dropping the `run` future aborts every task still in flight.

use super::types::ExtractionOutcome;
use crate::events::{EventSink, PipelineEvent};
use crate::tasks::ExtractionError;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Boxed future for one slot. Owns its input, so it can be spawned.
pub type SlotFuture<T> = Pin<Box<dyn Future<Output = Result<T, ExtractionError>> + Send + 'static>>;

/// A named unit of work in a fan-out batch.
pub struct Slot<T> {
    name: String,
    future: SlotFuture<T>,
}

impl<T> Slot<T> {
    pub fn new<F>(name: impl Into<String>, future: F) -> Self
    where
        F: Future<Output = Result<T, ExtractionError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            future: Box::pin(future),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Runs slots concurrently and collects every outcome.
#[derive(Clone)]
pub struct FanOutExecutor {
    sink: Arc<dyn EventSink>,
}

impl FanOutExecutor {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Launch all slots, then wait until every one has settled.
    ///
    /// Returns one outcome per slot, in slot order. Nothing is retried.
    pub async fn run<T>(&self, slots: Vec<Slot<T>>) -> Vec<ExtractionOutcome<T>>
    where
        T: Send + 'static,
    {
        let mut set = JoinSet::new();
        let mut names = Vec::with_capacity(slots.len());
        let mut slot_of = HashMap::new();

        for (index, slot) in slots.into_iter().enumerate() {
            self.sink.emit(PipelineEvent::TaskStarted {
                slot: slot.name.clone(),
            });
            let sink = self.sink.clone();
            let name = slot.name.clone();
            let future = slot.future;
            let handle = set.spawn(async move {
                let result = future.await;
                sink.emit(PipelineEvent::TaskSettled {
                    slot: name,
                    succeeded: result.is_ok(),
                    reason: result.as_ref().err().map(|e| e.to_string()),
                });
                result
            });
            slot_of.insert(handle.id(), index);
            names.push(slot.name);
        }

        let mut settled: Vec<Option<ExtractionOutcome<T>>> = names.iter().map(|_| None).collect();
        while let Some(joined) = set.join_next_with_id().await {
            let (id, result) = match joined {
                Ok(joined) => joined,
                Err(join_error) => {
                    let error = if join_error.is_panic() {
                        ExtractionError::Panicked
                    } else {
                        ExtractionError::Cancelled
                    };
                    // The task never reached its own settle event
                    if let Some(&index) = slot_of.get(&join_error.id()) {
                        self.sink.emit(PipelineEvent::TaskSettled {
                            slot: names[index].clone(),
                            succeeded: false,
                            reason: Some(error.to_string()),
                        });
                    }
                    (join_error.id(), Err(error))
                }
            };
            let Some(&index) = slot_of.get(&id) else {
                continue;
            };
            let name = names[index].clone();
            settled[index] = Some(match result {
                Ok(value) => ExtractionOutcome::success(name, value),
                Err(e) => ExtractionOutcome::failure(name, e.to_string()),
            });
        }

        settled
            .into_iter()
            .zip(names)
            .map(|(outcome, name)| {
                outcome.unwrap_or_else(|| {
                    ExtractionOutcome::failure(name, ExtractionError::Cancelled.to_string())
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;
    use crate::inference::InferenceError;
    use std::time::Duration;

    fn explode() -> Result<u8, ExtractionError> {
        panic!("extraction blew up")
    }

    fn executor() -> (FanOutExecutor, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        (FanOutExecutor::new(sink.clone()), sink)
    }

    #[tokio::test]
    async fn outcomes_follow_slot_order_not_completion_order() {
        let (executor, _) = executor();
        let slots = vec![
            Slot::new("slow", async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(1)
            }),
            Slot::new("fast", async { Ok(2) }),
        ];

        let outcomes = executor.run(slots).await;
        assert_eq!(outcomes[0].slot(), "slow");
        assert_eq!(outcomes[1].slot(), "fast");
        assert_eq!(outcomes[0].clone().into_value(), Some(1));
    }

    #[tokio::test]
    async fn failure_does_not_cancel_siblings() {
        let (executor, _) = executor();
        let slots: Vec<Slot<&str>> = vec![
            Slot::new("fails", async {
                Err(ExtractionError::Inference(InferenceError::InvocationFailed(
                    "boom".into(),
                )))
            }),
            Slot::new("later", async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok("done")
            }),
        ];

        let outcomes = executor.run(slots).await;
        assert_eq!(outcomes[0].failure_reason(), Some("invocation failed: boom"));
        assert!(outcomes[1].is_success());
    }

    #[tokio::test]
    async fn panic_becomes_failure() {
        let (executor, sink) = executor();
        let slots: Vec<Slot<u8>> = vec![
            Slot::new("panics", async { explode() }),
            Slot::new("fine", async { Ok(7) }),
        ];

        let outcomes = executor.run(slots).await;
        assert_eq!(outcomes[0].failure_reason(), Some("task panicked"));
        assert_eq!(outcomes[1].clone().into_value(), Some(7));

        let settled = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, PipelineEvent::TaskSettled { .. }))
            .count();
        assert_eq!(settled, 2);
    }

    #[tokio::test]
    async fn every_slot_emits_started_then_settled() {
        let (executor, sink) = executor();
        let slots = vec![Slot::new("only", async { Ok(()) })];

        executor.run(slots).await;
        assert_eq!(sink.names(), vec!["task_started", "task_settled"]);
    }

    #[tokio::test]
    async fn dropping_the_batch_aborts_in_flight_slots() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let (executor, _) = executor();
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        let slots = vec![Slot::new("slow", async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })];

        let result = tokio::time::timeout(Duration::from_millis(10), executor.run(slots)).await;
        assert!(result.is_err());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn two_panics_keep_their_own_slots() {
        let (executor, _) = executor();
        let slots: Vec<Slot<u8>> = vec![
            Slot::new("first", async { explode() }),
            Slot::new("ok", async { Ok(3) }),
            Slot::new("second", async { explode() }),
        ];

        let outcomes = executor.run(slots).await;
        assert_eq!(outcomes[0].slot(), "first");
        assert_eq!(outcomes[0].failure_reason(), Some("task panicked"));
        assert_eq!(outcomes[1].clone().into_value(), Some(3));
        assert_eq!(outcomes[2].slot(), "second");
        assert_eq!(outcomes[2].failure_reason(), Some("task panicked"));
    }

    #[tokio::test]
    async fn empty_batch_returns_empty() {
        let (executor, _) = executor();
        let outcomes: Vec<ExtractionOutcome<()>> = executor.run(Vec::new()).await;
        assert!(outcomes.is_empty());
    }
}
