//! The activity contract every saga participant implements.

use async_trait::async_trait;

use crate::{ActivityType, Context, RoutingSlip, WorkItem, WorkLog};

/// Boxed error type returned by [`Activity::do_work`] and
/// [`Activity::compensate`] for unexpected conditions.
///
/// Callers treat any `Err` from `do_work` identically to `Ok(DoWorkOutcome::Failure)`
/// — the distinction exists only so an activity can carry a diagnostic
/// payload, not to change control flow.
pub type ActivityError = Box<dyn std::error::Error + Send + Sync>;

/// The result of a [`Activity::do_work`] call.
#[derive(Debug)]
pub enum DoWorkOutcome {
    /// The activity produced its effect. Carries the work log the runtime
    /// should push onto the slip's completed stack.
    Success(WorkLog),
    /// The activity could not produce its effect. The saga should transition
    /// to its backward path.
    Failure,
}

/// One saga step.
///
/// For a given activity type, every instance must return the same pair of
/// queue addresses and an [`ActivityType`] extensionally equal to the one
/// that produced it (identity for resolver lookup) — `DoWork`/`Compensate`
/// are the only methods allowed to vary between instances.
#[async_trait]
pub trait Activity: Send + Sync {
    /// Attempt to produce this step's effect.
    ///
    /// On success, returns a [`WorkLog`] carrying this activity's
    /// compensation address and a result map. On failure — including any
    /// `Err` — the caller transitions the slip to its backward path.
    async fn do_work(
        &self,
        ctx: &Context,
        work_item: &WorkItem,
    ) -> Result<DoWorkOutcome, ActivityError>;

    /// Undo this step's effect.
    ///
    /// Returns `true` to continue backward unchanged, or `false` if this
    /// call appended new work to `slip`'s pending queue and the direction
    /// must reverse to forward (a "pivot": compensation-by-forward-action).
    /// Errors here are fatal — the saga cannot self-heal mid-compensation.
    async fn compensate(
        &self,
        ctx: &Context,
        work_log: &WorkLog,
        slip: &mut RoutingSlip,
    ) -> Result<bool, ActivityError>;

    /// The stable forward queue address for this activity type.
    fn work_item_queue_address(&self) -> String;

    /// The stable compensation queue address for this activity type. Must
    /// differ from [`Self::work_item_queue_address`].
    fn compensation_queue_address(&self) -> String;

    /// The factory that constructs instances of this activity's type.
    fn activity_type(&self) -> ActivityType;

    /// Expose the [`NamedActivity`] capability, if this activity type has
    /// one. Used by the registry as a fallback name source when a factory
    /// was never explicitly registered under a string name.
    fn as_named(&self) -> Option<&dyn NamedActivity> {
        None
    }
}

/// Optional capability exposing a stable type name for serialization
/// fallback, for activity types that were not registered explicitly with an
/// [`ActivityRegistry`](crate::ActivityRegistry).
pub trait NamedActivity {
    /// A name stable across instances (and, ideally, process versions) of
    /// this activity type.
    fn type_name(&self) -> String;
}
