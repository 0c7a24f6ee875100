//! Canned activities shared by this crate's and the engine crate's test
//! suites, so neither has to hand-roll mock activities per test file.
//!
//! Gated behind the `test-utils` feature (mirroring the teacher workspace's
//! own `test-utils` feature, used the same way: compiled in for this
//! crate's own tests and importable by downstream crates that enable it).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{
    Activity, ActivityError, ActivityType, Context, DoWorkOutcome, RoutingSlip, WorkItem,
    WorkItemArguments, WorkLog, WorkResult,
};

/// Shared call-count ledger, keyed `"do_work:<name>"` / `"compensate:<name>"`.
pub type CallCounts = Arc<Mutex<HashMap<String, u32>>>;

/// A fresh, empty call-count ledger.
pub fn call_counts() -> CallCounts {
    Arc::new(Mutex::new(HashMap::new()))
}

fn bump(counts: &CallCounts, key: String) {
    let mut guard = counts.lock().expect("call count lock poisoned");
    *guard.entry(key).or_insert(0) += 1;
}

/// An activity whose `DoWork` always succeeds and whose `Compensate` always
/// returns `true` (plain undo, no pivot).
#[derive(Clone)]
struct AlwaysSucceed {
    name: &'static str,
    counts: CallCounts,
}

#[async_trait]
impl Activity for AlwaysSucceed {
    async fn do_work(&self, _ctx: &Context, _work_item: &WorkItem) -> Result<DoWorkOutcome, ActivityError> {
        bump(&self.counts, format!("do_work:{}", self.name));
        Ok(DoWorkOutcome::Success(WorkLog::new(
            self.activity_type(),
            WorkResult::new().with("activity", self.name),
        )))
    }

    async fn compensate(
        &self,
        _ctx: &Context,
        _work_log: &WorkLog,
        _slip: &mut RoutingSlip,
    ) -> Result<bool, ActivityError> {
        bump(&self.counts, format!("compensate:{}", self.name));
        Ok(true)
    }

    fn work_item_queue_address(&self) -> String {
        format!("sb://./{}", self.name)
    }

    fn compensation_queue_address(&self) -> String {
        format!("sb://./{}-compensate", self.name)
    }

    fn activity_type(&self) -> ActivityType {
        let name = self.name;
        let counts = self.counts.clone();
        ActivityType::new(move || {
            Box::new(AlwaysSucceed {
                name,
                counts: counts.clone(),
            })
        })
    }
}

/// Build an [`ActivityType`] for a fresh [`AlwaysSucceed`] activity named
/// `name`, sharing `counts` across every instance it produces.
pub fn always_succeed(name: &'static str, counts: CallCounts) -> ActivityType {
    ActivityType::new(move || Box::new(AlwaysSucceed { name, counts: counts.clone() }))
}

/// An activity whose `DoWork` always fails. Never produces a log, so it has
/// nothing to compensate (its `Compensate` is never called in a correct
/// saga, but is implemented to return `true` defensively).
#[derive(Clone)]
struct AlwaysFail {
    name: &'static str,
    counts: CallCounts,
}

#[async_trait]
impl Activity for AlwaysFail {
    async fn do_work(&self, _ctx: &Context, _work_item: &WorkItem) -> Result<DoWorkOutcome, ActivityError> {
        bump(&self.counts, format!("do_work:{}", self.name));
        Ok(DoWorkOutcome::Failure)
    }

    async fn compensate(
        &self,
        _ctx: &Context,
        _work_log: &WorkLog,
        _slip: &mut RoutingSlip,
    ) -> Result<bool, ActivityError> {
        bump(&self.counts, format!("compensate:{}", self.name));
        Ok(true)
    }

    fn work_item_queue_address(&self) -> String {
        format!("sb://./{}", self.name)
    }

    fn compensation_queue_address(&self) -> String {
        format!("sb://./{}-compensate", self.name)
    }

    fn activity_type(&self) -> ActivityType {
        let name = self.name;
        let counts = self.counts.clone();
        ActivityType::new(move || {
            Box::new(AlwaysFail {
                name,
                counts: counts.clone(),
            })
        })
    }
}

/// Build an [`ActivityType`] for a fresh [`AlwaysFail`] activity named
/// `name`, sharing `counts` across every instance it produces.
pub fn always_fail(name: &'static str, counts: CallCounts) -> ActivityType {
    ActivityType::new(move || Box::new(AlwaysFail { name, counts: counts.clone() }))
}

/// An activity whose `Compensate` pivots: instead of undoing, it enqueues a
/// single follow-up work item (built from `follow_up`) and returns `false`.
#[derive(Debug, Clone)]
pub struct PivotOnCompensate {
    name: &'static str,
    follow_up: ActivityType,
    counts: CallCounts,
}

#[async_trait]
impl Activity for PivotOnCompensate {
    async fn do_work(&self, _ctx: &Context, _work_item: &WorkItem) -> Result<DoWorkOutcome, ActivityError> {
        bump(&self.counts, format!("do_work:{}", self.name));
        Ok(DoWorkOutcome::Success(WorkLog::new(
            self.activity_type(),
            WorkResult::new(),
        )))
    }

    async fn compensate(
        &self,
        _ctx: &Context,
        _work_log: &WorkLog,
        slip: &mut RoutingSlip,
    ) -> Result<bool, ActivityError> {
        bump(&self.counts, format!("compensate:{}", self.name));
        slip.push_pending_front([WorkItem::new(self.follow_up.clone(), WorkItemArguments::new())]);
        Ok(false)
    }

    fn work_item_queue_address(&self) -> String {
        format!("sb://./{}", self.name)
    }

    fn compensation_queue_address(&self) -> String {
        format!("sb://./{}-compensate", self.name)
    }

    fn activity_type(&self) -> ActivityType {
        let name = self.name;
        let follow_up = self.follow_up.clone();
        let counts = self.counts.clone();
        ActivityType::new(move || {
            Box::new(PivotOnCompensate {
                name,
                follow_up: follow_up.clone(),
                counts: counts.clone(),
            })
        })
    }
}

/// Build an [`ActivityType`] for a fresh [`PivotOnCompensate`] activity named
/// `name`, whose compensation enqueues a fresh `follow_up` work item instead
/// of undoing.
pub fn pivot_on_compensate(name: &'static str, follow_up: ActivityType, counts: CallCounts) -> ActivityType {
    ActivityType::new(move || {
        Box::new(PivotOnCompensate {
            name,
            follow_up: follow_up.clone(),
            counts: counts.clone(),
        })
    })
}
