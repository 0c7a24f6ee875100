//! The routing slip: the saga's self-contained forward/backward document.

use std::collections::VecDeque;

use tracing::instrument;
use uuid::Uuid;

use crate::{Activity, Error, WorkItem, WorkLog};

/// The central saga document: an ordered pending queue and a completed
/// stack, mutated by exactly one host at a time.
///
/// Invariants:
/// - every transition moves exactly one item between `pending` and `completed`;
/// - forward execution appends to `completed` from the front of `pending`;
///   backward execution pops from `completed` and never pushes back to
///   `pending` *except* when an activity's `Compensate` pivots (returns
///   `false`), which explicitly appends new pending work;
/// - the slip alone is sufficient to resume execution on any host that can
///   resolve the names it references.
#[derive(Debug, Clone)]
pub struct RoutingSlip {
    operation_id: Uuid,
    pending: VecDeque<WorkItem>,
    completed: Vec<WorkLog>,
}

impl RoutingSlip {
    /// Construct a slip with the given ordered pending sequence (possibly
    /// empty). `completed` starts empty. Generates a fresh correlation id.
    pub fn new(pending: impl IntoIterator<Item = WorkItem>) -> Self {
        Self {
            operation_id: Uuid::new_v4(),
            pending: pending.into_iter().collect(),
            completed: Vec::new(),
        }
    }

    /// Reconstruct a slip with an explicit correlation id (used by the
    /// serialization module when rebuilding a slip that crossed the wire).
    pub fn from_parts(operation_id: Uuid, pending: VecDeque<WorkItem>, completed: Vec<WorkLog>) -> Self {
        Self {
            operation_id,
            pending,
            completed,
        }
    }

    /// A stable id correlating this slip across hosts and log lines. Not
    /// part of the forward/backward state machine — metadata alongside it.
    pub fn operation_id(&self) -> Uuid {
        self.operation_id
    }

    /// `true` iff `pending` is empty (the saga completed successfully, or
    /// was fully compensated and never retried).
    pub fn is_completed(&self) -> bool {
        self.pending.is_empty()
    }

    /// `true` iff `completed` is non-empty (at least one step has run).
    pub fn is_in_progress(&self) -> bool {
        !self.completed.is_empty()
    }

    /// The queue address of the next work item, or empty when completed.
    pub fn progress_uri(&self) -> String {
        self.pending
            .front()
            .map(|item| item.queue_address().to_string())
            .unwrap_or_default()
    }

    /// The compensation address of the most recently completed work, or
    /// empty when not in progress.
    pub fn compensation_uri(&self) -> String {
        self.completed
            .last()
            .map(|log| log.compensation_queue_address().to_string())
            .unwrap_or_default()
    }

    /// Remaining pending work items, in execution order.
    pub fn pending(&self) -> impl Iterator<Item = &WorkItem> {
        self.pending.iter()
    }

    /// Completed work logs, bottom of stack (oldest) first.
    pub fn completed(&self) -> impl Iterator<Item = &WorkLog> {
        self.completed.iter()
    }

    /// Number of remaining pending items.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of completed items.
    pub fn completed_len(&self) -> usize {
        self.completed.len()
    }

    /// Pop the head of `pending`. Fails with [`Error::NoPendingWork`] when
    /// completed.
    pub fn next_work_item(&mut self) -> Result<WorkItem, Error> {
        self.pending.pop_front().ok_or(Error::NoPendingWork)
    }

    /// Push a completed work log onto `completed`.
    pub fn add_completed_work(&mut self, log: WorkLog) {
        self.completed.push(log);
    }

    /// Pop the top of `completed`. Fails with [`Error::NoCompletedWork`]
    /// when not in progress.
    pub fn last_completed_work(&mut self) -> Result<WorkLog, Error> {
        self.completed.pop().ok_or(Error::NoCompletedWork)
    }

    /// Append new work items to the front of `pending`, ahead of whatever is
    /// already queued. Used by a pivoting compensation (`Compensate`
    /// returning `false`) to enqueue an alternate forward continuation.
    pub fn push_pending_front(&mut self, items: impl IntoIterator<Item = WorkItem>) {
        let items: Vec<WorkItem> = items.into_iter().collect();
        for item in items.into_iter().rev() {
            self.pending.push_front(item);
        }
    }

    /// Peek the head of `pending` without removing it.
    pub fn peek_next(&self) -> Option<&WorkItem> {
        self.pending.front()
    }

    /// Peek the top of `completed` without removing it.
    pub fn peek_last_completed(&self) -> Option<&WorkLog> {
        self.completed.last()
    }

    /// Convenience forward driver: peeks the head, resolves the activity via
    /// `resolve`, invokes `DoWork`. On success, pushes the returned log and
    /// remains forward; on failure (including an `Err`), the failing item is
    /// discarded without a log and the slip transitions backward. Returns
    /// `true` iff the step succeeded. Fails with [`Error::NoPendingWork`] if
    /// already completed.
    #[instrument(skip(self, resolve), fields(operation_id = %self.operation_id))]
    pub async fn process_next<R>(
        &mut self,
        ctx: &crate::Context,
        resolve: R,
    ) -> Result<bool, Error>
    where
        R: Fn(&WorkItem) -> Box<dyn Activity>,
    {
        let item = self.next_work_item()?;
        let activity = resolve(&item);
        match activity.do_work(ctx, &item).await {
            Ok(crate::DoWorkOutcome::Success(log)) => {
                tracing::debug!(queue = item.queue_address(), "activity succeeded");
                self.add_completed_work(log);
                Ok(true)
            }
            Ok(crate::DoWorkOutcome::Failure) => {
                tracing::info!(queue = item.queue_address(), "activity reported failure, reversing direction");
                Ok(false)
            }
            Err(error) => {
                tracing::warn!(queue = item.queue_address(), %error, "activity error, treated as failure");
                Ok(false)
            }
        }
    }

    /// Convenience backward driver: peeks the top, resolves the activity via
    /// `resolve`, invokes `Compensate`. `true` means continue backward
    /// unchanged; `false` means the activity pivoted (pushed new forward
    /// work) and direction reverses. Fails with [`Error::NoCompletedWork`]
    /// if nothing is in progress, or [`Error::CompensationFailed`] if the
    /// activity errors — a fatal, non-recoverable condition.
    #[instrument(skip(self, resolve), fields(operation_id = %self.operation_id))]
    pub async fn undo_last<R>(&mut self, ctx: &crate::Context, resolve: R) -> Result<bool, Error>
    where
        R: Fn(&WorkLog) -> Box<dyn Activity>,
    {
        let log = self.last_completed_work()?;
        let activity = resolve(&log);
        let queue = log.compensation_queue_address().to_string();
        match activity.compensate(ctx, &log, self).await {
            Ok(true) => {
                tracing::debug!(%queue, "compensation complete, continuing backward");
                Ok(true)
            }
            Ok(false) => {
                tracing::info!(%queue, "compensation pivoted, reversing to forward");
                Ok(false)
            }
            Err(source) => {
                tracing::error!(%queue, "compensation failed, saga stuck");
                Err(Error::CompensationFailed { queue, source })
            }
        }
    }
}

impl PartialEq for RoutingSlip {
    /// Compares the ordered `pending`/`completed` sequences only.
    /// `operation_id` is correlation metadata (see [`Self::operation_id`]),
    /// not part of the saga's logical state, so two slips with the same
    /// work but different ids are still equal — the round-trip property
    /// this backs needs exactly that.
    fn eq(&self, other: &Self) -> bool {
        self.pending == other.pending && self.completed == other.completed
    }
}
