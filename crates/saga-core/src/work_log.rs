//! Completed units of work carried by a routing slip.

use crate::{ActivityType, WorkResult};

/// A record of completed work: the compensation address to undo it, the
/// result the activity returned, and the factory that can rebuild the
/// activity to compensate it.
///
/// Same serialization rule as [`WorkItem`](crate::WorkItem) but with the
/// compensation address in place of the forward address.
#[derive(Clone)]
pub struct WorkLog {
    compensation_queue_address: String,
    result: WorkResult,
    activity_type: ActivityType,
}

impl WorkLog {
    /// Construct a work log for `activity_type`, deriving its compensation
    /// address from a freshly created instance.
    pub fn new(activity_type: ActivityType, result: WorkResult) -> Self {
        let compensation_queue_address = activity_type.create().compensation_queue_address();
        Self {
            compensation_queue_address,
            result,
            activity_type,
        }
    }

    /// Reconstruct a work log whose compensation address has already been
    /// resolved.
    pub fn from_parts(
        compensation_queue_address: String,
        result: WorkResult,
        activity_type: ActivityType,
    ) -> Self {
        Self {
            compensation_queue_address,
            result,
            activity_type,
        }
    }

    /// The logical backward destination for this completed work.
    pub fn compensation_queue_address(&self) -> &str {
        &self.compensation_queue_address
    }

    /// The result the activity returned on success.
    pub fn result(&self) -> &WorkResult {
        &self.result
    }

    /// The factory that can rebuild the activity able to compensate this log.
    pub fn activity_type(&self) -> &ActivityType {
        &self.activity_type
    }

    /// Build a fresh activity instance bound to this log's type.
    pub fn resolve(&self) -> Box<dyn crate::Activity> {
        self.activity_type.create()
    }
}

impl std::fmt::Debug for WorkLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkLog")
            .field("compensation_queue_address", &self.compensation_queue_address)
            .field("result", &self.result)
            .finish()
    }
}

impl PartialEq for WorkLog {
    /// Compares the address and result only, for the same reason
    /// [`WorkItem`](crate::WorkItem)'s `PartialEq` does.
    fn eq(&self, other: &Self) -> bool {
        self.compensation_queue_address == other.compensation_queue_address
            && self.result == other.result
    }
}
