//! Summarization backlog queue.
//!
//! Summaries are generated out of band by a single worker (a background
//! task or a chat-model call), so the backlog is an explicit value object
//! owned by whatever coordinates that worker, never shared mutable
//! module state. The queue itself performs no I/O: it tracks which
//! documents still need a summary and reports progress through a pure
//! status accessor.

use crate::store::DocId;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// FIFO backlog of documents awaiting summarization.
///
/// Enqueueing is idempotent while a document is pending or in flight; a
/// completed or failed document may be enqueued again (e.g. after its
/// content changed).
#[derive(Debug, Default)]
pub struct SummaryQueue {
    pending: VecDeque<DocId>,
    // Pending plus in-flight; guards against double-enqueue.
    queued: HashSet<DocId>,
    in_flight: HashSet<DocId>,
    completed: usize,
    failed: usize,
}

/// Point-in-time snapshot of queue progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStatus {
    /// Documents waiting to be pulled
    pub pending: usize,
    /// Documents pulled but not yet completed or failed
    pub in_flight: usize,
    /// Documents summarized successfully since queue creation
    pub completed: usize,
    /// Documents whose summarization failed since queue creation
    pub failed: usize,
}

impl QueueStatus {
    /// True when nothing is waiting or in flight.
    pub fn is_idle(&self) -> bool {
        self.pending == 0 && self.in_flight == 0
    }
}

impl SummaryQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document to the backlog.
    ///
    /// Returns `false` when the document is already pending or in flight.
    pub fn enqueue(&mut self, doc_id: DocId) -> bool {
        if !self.queued.insert(doc_id) {
            return false;
        }
        self.pending.push_back(doc_id);
        debug!(doc_id = doc_id.as_u64(), pending = self.pending.len(), "Enqueued for summarization");
        true
    }

    /// Pulls the next document for the worker, marking it in flight.
    pub fn next(&mut self) -> Option<DocId> {
        let doc_id = self.pending.pop_front()?;
        self.in_flight.insert(doc_id);
        Some(doc_id)
    }

    /// Marks an in-flight document as summarized.
    ///
    /// Unknown ids are ignored; the worker may report a document that was
    /// cleared from the queue in the meantime.
    pub fn complete(&mut self, doc_id: DocId) {
        if self.in_flight.remove(&doc_id) {
            self.queued.remove(&doc_id);
            self.completed += 1;
        }
    }

    /// Marks an in-flight document as failed.
    ///
    /// The document leaves the queue; the coordinator decides whether to
    /// enqueue it again (typically behind [`crate::retry::with_retry`]).
    pub fn fail(&mut self, doc_id: DocId) {
        if self.in_flight.remove(&doc_id) {
            self.queued.remove(&doc_id);
            self.failed += 1;
        }
    }

    /// Drops all pending and in-flight work, keeping the counters.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.queued.clear();
        self.in_flight.clear();
    }

    /// Current progress snapshot.
    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            pending: self.pending.len(),
            in_flight: self.in_flight.len(),
            completed: self.completed,
            failed: self.failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> DocId {
        DocId::from_u64(n)
    }

    #[test]
    fn pulls_in_fifo_order() {
        let mut queue = SummaryQueue::new();
        queue.enqueue(id(1));
        queue.enqueue(id(2));
        queue.enqueue(id(3));

        assert_eq!(queue.next(), Some(id(1)));
        assert_eq!(queue.next(), Some(id(2)));
        assert_eq!(queue.next(), Some(id(3)));
        assert_eq!(queue.next(), None);
    }

    #[test]
    fn enqueue_deduplicates_pending_and_in_flight() {
        let mut queue = SummaryQueue::new();
        assert!(queue.enqueue(id(1)));
        assert!(!queue.enqueue(id(1)), "already pending");

        queue.next();
        assert!(!queue.enqueue(id(1)), "already in flight");

        queue.complete(id(1));
        assert!(queue.enqueue(id(1)), "finished work may be redone");
    }

    #[test]
    fn status_tracks_the_lifecycle() {
        let mut queue = SummaryQueue::new();
        queue.enqueue(id(1));
        queue.enqueue(id(2));
        assert_eq!(queue.status().pending, 2);
        assert!(!queue.status().is_idle());

        let first = queue.next().unwrap();
        let status = queue.status();
        assert_eq!(status.pending, 1);
        assert_eq!(status.in_flight, 1);

        queue.complete(first);
        let second = queue.next().unwrap();
        queue.fail(second);

        let status = queue.status();
        assert_eq!(status.completed, 1);
        assert_eq!(status.failed, 1);
        assert!(status.is_idle());
    }

    #[test]
    fn completing_an_unknown_id_is_a_noop() {
        let mut queue = SummaryQueue::new();
        queue.complete(id(42));
        queue.fail(id(42));
        assert_eq!(queue.status().completed, 0);
        assert_eq!(queue.status().failed, 0);
    }

    #[test]
    fn clear_drops_work_but_keeps_counters() {
        let mut queue = SummaryQueue::new();
        queue.enqueue(id(1));
        let pulled = queue.next().unwrap();
        queue.complete(pulled);
        queue.enqueue(id(2));
        queue.enqueue(id(3));
        queue.next();

        queue.clear();
        let status = queue.status();
        assert!(status.is_idle());
        assert_eq!(status.completed, 1);
    }
}
