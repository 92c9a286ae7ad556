//! Background remote calls with single-consumer completion delivery
//!
//! Every remote call runs on its own tokio task and sends exactly one
//! [`Completion`] through an unbounded channel. The receiving loop is the only
//! writer of session state; it asks [`TaskQueue::accept`] whether a completion
//! still matters before applying it.
//!
//! Policy: the latest request of each kind wins. Issuing a schema request also
//! supersedes any outstanding series request, since the series belonged to
//! the previously chosen dataflow. Superseded tasks are not cancelled; their
//! results are dropped on arrival.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::app::client::DataSource;
use crate::app::models::{ClassificationLists, DataflowSummary, SeriesTable};
use crate::app::query::SeriesQuery;
use crate::errors::RemoteResult;

/// Kind of remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Catalog,
    Schema,
    Series,
}

impl TaskKind {
    fn index(self) -> usize {
        match self {
            TaskKind::Catalog => 0,
            TaskKind::Schema => 1,
            TaskKind::Series => 2,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskKind::Catalog => "catalog",
            TaskKind::Schema => "schema",
            TaskKind::Series => "series",
        };
        f.write_str(name)
    }
}

/// Identity of one issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub kind: TaskKind,
    pub generation: u64,
}

/// Result carried back by a background task
#[derive(Debug)]
pub enum TaskOutcome {
    Catalog(RemoteResult<Vec<DataflowSummary>>),
    Schema(RemoteResult<ClassificationLists>),
    Series(RemoteResult<Vec<SeriesTable>>),
}

/// Message delivered to the completion receiver
#[derive(Debug)]
pub struct Completion {
    pub ticket: Ticket,
    pub outcome: TaskOutcome,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    generation: u64,
    pending: bool,
}

/// Spawns remote calls and tracks which of them are still current
pub struct TaskQueue<S: DataSource> {
    source: Arc<S>,
    sender: mpsc::UnboundedSender<Completion>,
    slots: [Slot; 3],
}

impl<S: DataSource> TaskQueue<S> {
    /// Create a queue and the receiver its completions are delivered to
    pub fn new(source: Arc<S>) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let queue = Self {
            source,
            sender,
            slots: [Slot::default(); 3],
        };
        (queue, receiver)
    }

    fn issue(&mut self, kind: TaskKind) -> Ticket {
        let slot = &mut self.slots[kind.index()];
        slot.generation += 1;
        slot.pending = true;
        Ticket {
            kind,
            generation: slot.generation,
        }
    }

    /// Drop interest in any outstanding request of `kind`
    pub fn invalidate(&mut self, kind: TaskKind) {
        let slot = &mut self.slots[kind.index()];
        if slot.pending {
            tracing::debug!("Superseding outstanding {} request", kind);
        }
        slot.generation += 1;
        slot.pending = false;
    }

    fn spawn<F>(&mut self, kind: TaskKind, call: F) -> Ticket
    where
        F: FnOnce(Arc<S>) -> futures::future::BoxFuture<'static, TaskOutcome>,
    {
        let ticket = self.issue(kind);
        let sender = self.sender.clone();
        let future = call(Arc::clone(&self.source));

        tokio::spawn(async move {
            let outcome = future.await;
            if sender.send(Completion { ticket, outcome }).is_err() {
                tracing::debug!("Completion receiver gone, dropping {} result", ticket.kind);
            }
        });

        tracing::debug!("Spawned {} request #{}", kind, ticket.generation);
        ticket
    }

    pub fn spawn_catalog(&mut self) -> Ticket {
        self.spawn(TaskKind::Catalog, |source| {
            Box::pin(async move { TaskOutcome::Catalog(source.list_dataflows().await) })
        })
    }

    /// Request the schema of `key_family_id`, superseding outstanding series
    pub fn spawn_schema(&mut self, key_family_id: String) -> Ticket {
        self.invalidate(TaskKind::Series);
        self.spawn(TaskKind::Schema, move |source| {
            Box::pin(async move { TaskOutcome::Schema(source.fetch_schema(&key_family_id).await) })
        })
    }

    pub fn spawn_series(&mut self, query: SeriesQuery) -> Ticket {
        self.spawn(TaskKind::Series, move |source| {
            Box::pin(async move { TaskOutcome::Series(source.fetch_series(&query).await) })
        })
    }

    /// Whether `ticket` is the latest request of its kind
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.slots[ticket.kind.index()].generation == ticket.generation
    }

    /// Whether a current request of `kind` has not completed yet
    pub fn is_pending(&self, kind: TaskKind) -> bool {
        self.slots[kind.index()].pending
    }

    /// Settle a completion; returns `false` if it was superseded and must be
    /// discarded
    pub fn accept(&mut self, ticket: Ticket) -> bool {
        let slot = &mut self.slots[ticket.kind.index()];
        if slot.pending && slot.generation == ticket.generation {
            slot.pending = false;
            true
        } else {
            tracing::debug!(
                "Discarding stale {} result #{} (latest #{})",
                ticket.kind,
                ticket.generation,
                slot.generation
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RemoteError;
    use async_trait::async_trait;

    struct StaticSource;

    #[async_trait]
    impl DataSource for StaticSource {
        async fn list_dataflows(&self) -> RemoteResult<Vec<DataflowSummary>> {
            Ok(vec![DataflowSummary::new("Balance of Payments", "BOP")])
        }

        async fn fetch_schema(&self, key_family_id: &str) -> RemoteResult<ClassificationLists> {
            Ok(ClassificationLists::new(key_family_id))
        }

        async fn fetch_series(&self, _query: &SeriesQuery) -> RemoteResult<Vec<SeriesTable>> {
            Err(RemoteError::Timeout {
                url: "http://localhost/CompactData".to_string(),
                seconds: 10,
            })
        }
    }

    #[tokio::test]
    async fn test_completion_delivered_once() {
        let (mut queue, mut receiver) = TaskQueue::new(Arc::new(StaticSource));
        let ticket = queue.spawn_catalog();
        assert!(queue.is_pending(TaskKind::Catalog));

        let completion = receiver.recv().await.unwrap();
        assert_eq!(completion.ticket, ticket);
        assert!(matches!(completion.outcome, TaskOutcome::Catalog(Ok(ref d)) if d.len() == 1));

        assert!(queue.accept(ticket));
        assert!(!queue.is_pending(TaskKind::Catalog));
        // A second delivery of the same ticket is not applied twice
        assert!(!queue.accept(ticket));
    }

    #[tokio::test]
    async fn test_latest_request_wins() {
        let (mut queue, mut receiver) = TaskQueue::new(Arc::new(StaticSource));
        let first = queue.spawn_catalog();
        let second = queue.spawn_catalog();
        assert!(!queue.is_current(first));
        assert!(queue.is_current(second));

        let mut accepted = Vec::new();
        for _ in 0..2 {
            let completion = receiver.recv().await.unwrap();
            if queue.accept(completion.ticket) {
                accepted.push(completion.ticket);
            }
        }
        assert_eq!(accepted, vec![second]);
    }

    #[tokio::test]
    async fn test_schema_supersedes_series() {
        let (mut queue, mut receiver) = TaskQueue::new(Arc::new(StaticSource));
        let series = queue.spawn_series(SeriesQuery::from_values(
            "BOP",
            vec![],
            vec![],
            vec!["X".to_string()],
        ));
        let schema = queue.spawn_schema("IFS".to_string());

        assert!(!queue.is_current(series));
        assert!(!queue.is_pending(TaskKind::Series));
        assert!(queue.is_pending(TaskKind::Schema));

        for _ in 0..2 {
            let completion = receiver.recv().await.unwrap();
            let accepted = queue.accept(completion.ticket);
            assert_eq!(accepted, completion.ticket == schema);
            if let TaskOutcome::Series(result) = completion.outcome {
                assert!(result.unwrap_err().is_timeout());
            }
        }
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_panic() {
        let (mut queue, receiver) = TaskQueue::new(Arc::new(StaticSource));
        drop(receiver);
        queue.spawn_catalog();
        tokio::task::yield_now().await;
    }
}
