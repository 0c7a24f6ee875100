//! Fork/join composition: run a fixed set of sub-slips concurrently and
//! fail the whole step if any branch fails.

use async_trait::async_trait;
use tokio::task::JoinSet;

use routingslip_core::{
    Activity, ActivityError, ActivityType, Context, DoWorkOutcome, RoutingSlip, WorkItem,
    WorkItemArguments, WorkLog, WorkResult,
};

use crate::driver::{drive_forward, drive_from, Direction};

const QUEUE_ADDRESS: &str = "sb://./parallel";
const COMPENSATION_QUEUE_ADDRESS: &str = "sb://./parallel-compensate";
const BRANCHES_ARG_KEY: &str = "branches";
const BRANCHES_RESULT_KEY: &str = "_branches";

/// An activity that runs a set of branch sub-slips, carried in the pending
/// work item's `branches` argument, concurrently.
///
/// Per spec.md §3/§4.3, branches live in `WorkItem::arguments()`, not in any
/// state private to the activity instance: an `ActivityType` is a nullary
/// factory (design note 9) with no per-instance payload of its own, so a
/// pending parallel step's branches must be fully described by its wire
/// `arguments` the same way a leaf activity's are, or they would not survive
/// a serialization round-trip.
///
/// Every branch runs forward independently; a panicking or failing branch
/// never blocks its siblings. If every branch reaches its own terminal
/// success, the step as a whole succeeds and the executed branches (not the
/// construction-time ones — a branch may have pivoted mid-run) are stored
/// under the reserved `_branches` result key so [`Self::compensate`] can
/// unwind exactly what ran. If any branch fails, every branch — including
/// ones that already succeeded — is compensated concurrently and the step
/// reports [`DoWorkOutcome::Failure`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelActivity;

impl ParallelActivity {
    /// A parallel activity instance. Carries no branches itself — see the
    /// type-level docs.
    pub fn new() -> Self {
        Self
    }

    /// Build the pending [`WorkItem`] for a parallel step over `branches`,
    /// each an independent sub-slip. This is the only place branches enter
    /// the saga: they live in the item's `arguments`, under
    /// [`BRANCHES_ARG_KEY`](BRANCHES_ARG_KEY), not in the activity.
    pub fn work_item(branches: Vec<RoutingSlip>) -> WorkItem {
        WorkItem::new(
            ActivityType::new(|| Box::new(ParallelActivity)),
            WorkItemArguments::new().with(BRANCHES_ARG_KEY, branches),
        )
    }
}

#[async_trait]
impl Activity for ParallelActivity {
    async fn do_work(
        &self,
        ctx: &Context,
        work_item: &WorkItem,
    ) -> Result<DoWorkOutcome, ActivityError> {
        let branches = work_item
            .arguments()
            .get(BRANCHES_ARG_KEY)
            .and_then(|v| v.as_slip_list())
            .ok_or("parallel work item missing `branches`")?
            .to_vec();

        let mut set = JoinSet::new();
        for (index, branch) in branches.iter().cloned().enumerate() {
            let branch_ctx = ctx.child();
            set.spawn(async move {
                let mut branch = branch;
                let ok = drive_forward(&mut branch, &branch_ctx).await;
                (index, branch, ok)
            });
        }

        let mut ran: Vec<Option<RoutingSlip>> = vec![None; branches.len()];
        let mut any_failed = false;
        while let Some(joined) = set.join_next().await {
            let (index, branch, ok) = joined.map_err(|e| Box::new(e) as ActivityError)?;
            any_failed = any_failed || !ok?;
            ran[index] = Some(branch);
        }
        let ran: Vec<RoutingSlip> = ran.into_iter().map(|b| b.expect("every branch joined")).collect();

        if any_failed {
            tracing::info!(branches = ran.len(), "parallel step failed, compensating every branch");
            let mut rollback = JoinSet::new();
            for branch in ran {
                let branch_ctx = ctx.child();
                rollback.spawn(async move {
                    let mut branch = branch;
                    drive_from(&mut branch, &branch_ctx, Direction::Backward).await
                });
            }
            while let Some(joined) = rollback.join_next().await {
                joined.map_err(|e| Box::new(e) as ActivityError)??;
            }
            return Ok(DoWorkOutcome::Failure);
        }

        tracing::debug!(branches = ran.len(), "parallel step succeeded");
        Ok(DoWorkOutcome::Success(WorkLog::new(
            self.activity_type(),
            WorkResult::new().with(BRANCHES_RESULT_KEY, ran),
        )))
    }

    async fn compensate(
        &self,
        ctx: &Context,
        work_log: &WorkLog,
        _slip: &mut RoutingSlip,
    ) -> Result<bool, ActivityError> {
        let branches = work_log
            .result()
            .get(BRANCHES_RESULT_KEY)
            .and_then(|v| v.as_slip_list())
            .ok_or("parallel work log missing `_branches`")?
            .to_vec();

        let mut rollback = JoinSet::new();
        for branch in branches {
            let branch_ctx = ctx.child();
            rollback.spawn(async move {
                let mut branch = branch;
                drive_from(&mut branch, &branch_ctx, Direction::Backward).await
            });
        }
        while let Some(joined) = rollback.join_next().await {
            joined.map_err(|e| Box::new(e) as ActivityError)??;
        }
        Ok(true)
    }

    fn work_item_queue_address(&self) -> String {
        QUEUE_ADDRESS.to_string()
    }

    fn compensation_queue_address(&self) -> String {
        COMPENSATION_QUEUE_ADDRESS.to_string()
    }

    fn activity_type(&self) -> ActivityType {
        ActivityType::new(|| Box::new(ParallelActivity))
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
    async fn all_branches_succeed() {
        let counts = call_counts();
        let parallel = ParallelActivity::new();
        let work_item = ParallelActivity::work_item(vec![
            leaf(always_succeed("a", counts.clone())),
            leaf(always_succeed("b", counts.clone())),
        ]);
        let ctx = Context::new();
        let outcome = parallel.do_work(&ctx, &work_item).await.unwrap();

        match outcome {
            DoWorkOutcome::Success(log) => {
                let branches = log.result().get(BRANCHES_RESULT_KEY).unwrap().as_slip_list().unwrap();
                assert_eq!(branches.len(), 2);
                assert!(branches.iter().all(|b| b.is_completed()));
            }
            DoWorkOutcome::Failure => panic!("expected success"),
        }
    }

    #[tokio::test]
    async fn one_branch_failing_compensates_every_branch() {
        let counts = call_counts();
        let parallel = ParallelActivity::new();
        let work_item = ParallelActivity::work_item(vec![
            leaf(always_succeed("a", counts.clone())),
            leaf(always_fail("b", counts.clone())),
        ]);
        let ctx = Context::new();
        let outcome = parallel.do_work(&ctx, &work_item).await.unwrap();

        assert!(matches!(outcome, DoWorkOutcome::Failure));
        let seen = counts.lock().unwrap().clone();
        assert_eq!(seen.get("compensate:a"), Some(&1));
    }

    #[tokio::test]
    async fn multi_step_branches_compensate_in_branch_local_lifo_order() {
        let counts = call_counts();
        let a1 = always_succeed("a1", counts.clone());
        let a2 = always_succeed("a2", counts.clone());
        let b1 = always_succeed("b1", counts.clone());
        let fail = always_fail("fail", counts.clone());

        let s1 = RoutingSlip::new([
            WorkItem::new(a1, WorkItemArguments::new()),
            WorkItem::new(a2, WorkItemArguments::new()),
        ]);
        let s2 = RoutingSlip::new([
            WorkItem::new(b1, WorkItemArguments::new()),
            WorkItem::new(fail, WorkItemArguments::new()),
        ]);

        let parallel = ParallelActivity::new();
        let work_item = ParallelActivity::work_item(vec![s1, s2]);
        let ctx = Context::new();
        let outcome = parallel.do_work(&ctx, &work_item).await.unwrap();

        assert!(matches!(outcome, DoWorkOutcome::Failure));
        let seen = counts.lock().unwrap().clone();
        assert_eq!(seen.get("do_work:a1"), Some(&1));
        assert_eq!(seen.get("do_work:a2"), Some(&1));
        assert_eq!(seen.get("compensate:a2"), Some(&1));
        assert_eq!(seen.get("compensate:a1"), Some(&1));
        // b1 completed before its sibling's failing step discarded `fail`
        // without a log, so it also has exactly one thing to undo.
        assert_eq!(seen.get("compensate:b1"), Some(&1));
    }
}
