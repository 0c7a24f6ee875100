//! Sequential fallback composition: try alternatives in order, self-healing
//! a failed one before moving to the next.

use async_trait::async_trait;

use routingslip_core::{
    Activity, ActivityError, ActivityType, Context, DoWorkOutcome, RoutingSlip, WorkItem,
    WorkItemArguments, WorkLog, WorkResult,
};

use crate::driver::{drive_forward, drive_from, Direction};

const QUEUE_ADDRESS: &str = "sb://./fallback";
const COMPENSATION_QUEUE_ADDRESS: &str = "sb://./fallback-compensate";
const ALTERNATIVES_ARG_KEY: &str = "alternatives";
const SUCCEEDED_KEY: &str = "_succeeded";

/// An activity that tries a sequence of alternative sub-slips, carried in
/// the pending work item's `alternatives` argument, committing to the first
/// one that reaches its own terminal success.
///
/// Per spec.md §3/§4.4, alternatives live in `WorkItem::arguments()`, not in
/// state private to the activity instance — see [`super::ParallelActivity`]'s
/// docs for why: an `ActivityType` is a nullary factory with no per-instance
/// payload, so a pending fallback step's alternatives must be fully
/// described by its wire `arguments` or they would not survive a
/// serialization round-trip.
///
/// An alternative that fails is compensated in place before the next one is
/// attempted, so a half-applied attempt never lingers once a later
/// alternative is tried. If every alternative fails, the step itself fails
/// (every alternative has already been compensated, so there is nothing
/// left for [`Self::compensate`] to do). The winning alternative — its
/// actual executed form, which may differ from the construction-time one if
/// it pivoted — is stored under the reserved `_succeeded` result key.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackActivity;

impl FallbackActivity {
    /// A fallback activity instance. Carries no alternatives itself — see
    /// the type-level docs.
    pub fn new() -> Self {
        Self
    }

    /// Build the pending [`WorkItem`] for a fallback step trying
    /// `alternatives` in order. This is the only place alternatives enter
    /// the saga: they live in the item's `arguments`, under
    /// [`ALTERNATIVES_ARG_KEY`](ALTERNATIVES_ARG_KEY), not in the activity.
    pub fn work_item(alternatives: Vec<RoutingSlip>) -> WorkItem {
        WorkItem::new(
            ActivityType::new(|| Box::new(FallbackActivity)),
            WorkItemArguments::new().with(ALTERNATIVES_ARG_KEY, alternatives),
        )
    }
}

#[async_trait]
impl Activity for FallbackActivity {
    async fn do_work(
        &self,
        ctx: &Context,
        work_item: &WorkItem,
    ) -> Result<DoWorkOutcome, ActivityError> {
        let alternatives = work_item
            .arguments()
            .get(ALTERNATIVES_ARG_KEY)
            .and_then(|v| v.as_slip_list())
            .ok_or("fallback work item missing `alternatives`")?
            .to_vec();

        for (index, alternative) in alternatives.iter().cloned().enumerate() {
            let mut alternative = alternative;
            if drive_forward(&mut alternative, ctx).await? {
                tracing::debug!(alternative = index, "fallback alternative succeeded");
                return Ok(DoWorkOutcome::Success(WorkLog::new(
                    self.activity_type(),
                    WorkResult::new().with(SUCCEEDED_KEY, alternative),
                )));
            }
            tracing::info!(alternative = index, "fallback alternative failed, compensating it");
            drive_from(&mut alternative, ctx, Direction::Backward).await?;
        }
        tracing::warn!(alternatives = alternatives.len(), "every fallback alternative failed");
        Ok(DoWorkOutcome::Failure)
    }

    async fn compensate(
        &self,
        ctx: &Context,
        work_log: &WorkLog,
        _slip: &mut RoutingSlip,
    ) -> Result<bool, ActivityError> {
        let succeeded = work_log
            .result()
            .get(SUCCEEDED_KEY)
            .and_then(|v| v.as_slip())
            .ok_or("fallback work log missing `_succeeded`")?
            .clone();
        let mut succeeded = succeeded;
        drive_from(&mut succeeded, ctx, Direction::Backward).await?;
        Ok(true)
    }

    fn work_item_queue_address(&self) -> String {
        QUEUE_ADDRESS.to_string()
    }

    fn compensation_queue_address(&self) -> String {
        COMPENSATION_QUEUE_ADDRESS.to_string()
    }

    fn activity_type(&self) -> ActivityType {
        ActivityType::new(|| Box::new(FallbackActivity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routingslip_core::test_utils::{always_fail, always_succeed, call_counts};
    use routingslip_core::WorkItemArguments;

    fn leaf(activity_type: ActivityType) -> RoutingSlip {
        RoutingSlip::new([WorkItem::new(activity_type, WorkItemArguments::new())])
    }

    #[tokio::test]
    async fn second_alternative_wins_after_first_fails() {
        let counts = call_counts();
        let fallback = FallbackActivity::new();
        let work_item = FallbackActivity::work_item(vec![
            leaf(always_fail("primary", counts.clone())),
            leaf(always_succeed("secondary", counts.clone())),
        ]);
        let ctx = Context::new();
        let outcome = fallback.do_work(&ctx, &work_item).await.unwrap();

        match outcome {
            DoWorkOutcome::Success(log) => {
                let slip = log.result().get(SUCCEEDED_KEY).unwrap().as_slip().unwrap();
                assert!(slip.is_completed());
            }
            DoWorkOutcome::Failure => panic!("expected success via second alternative"),
        }
        let seen = counts.lock().unwrap().clone();
        assert_eq!(seen.get("do_work:primary"), Some(&1));
        // `primary` fails without ever producing a work log, so it has
        // nothing for its own backward pass to undo (spec.md §8 scenario 5).
        assert_eq!(seen.get("compensate:primary"), None);
        assert_eq!(seen.get("do_work:secondary"), Some(&1));
        assert_eq!(seen.get("compensate:secondary"), None);
    }

    #[tokio::test]
    async fn every_alternative_failing_fails_the_step() {
        let counts = call_counts();
        let fallback = FallbackActivity::new();
        let work_item = FallbackActivity::work_item(vec![
            leaf(always_fail("a", counts.clone())),
            leaf(always_fail("b", counts.clone())),
        ]);
        let ctx = Context::new();
        let outcome = fallback.do_work(&ctx, &work_item).await.unwrap();

        assert!(matches!(outcome, DoWorkOutcome::Failure));
    }
}
