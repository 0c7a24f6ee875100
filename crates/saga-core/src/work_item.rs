//! Pending units of work carried by a routing slip.

use crate::{ActivityType, WorkItemArguments};

/// A pending unit of work.
///
/// Invariant: `queue_address` equals the work-item queue address of the
/// activity produced by `activity_type`. [`WorkItem::new`] enforces this by
/// construction; [`WorkItem::from_parts`] is for callers that have already
/// resolved the address themselves and want to skip creating a throwaway
/// instance just to read it back off.
#[derive(Clone)]
pub struct WorkItem {
    queue_address: String,
    arguments: WorkItemArguments,
    activity_type: ActivityType,
}

impl WorkItem {
    /// Construct a work item for `activity_type`, deriving its queue address
    /// from a freshly created instance.
    pub fn new(activity_type: ActivityType, arguments: WorkItemArguments) -> Self {
        let queue_address = activity_type.create().work_item_queue_address();
        Self {
            queue_address,
            arguments,
            activity_type,
        }
    }

    /// Reconstruct a work item whose queue address has already been
    /// resolved.
    pub fn from_parts(
        queue_address: String,
        arguments: WorkItemArguments,
        activity_type: ActivityType,
    ) -> Self {
        Self {
            queue_address,
            arguments,
            activity_type,
        }
    }

    /// The logical forward destination for this work item.
    pub fn queue_address(&self) -> &str {
        &self.queue_address
    }

    /// The argument bag supplied by the saga author.
    pub fn arguments(&self) -> &WorkItemArguments {
        &self.arguments
    }

    /// The factory capable of producing the activity that hosts this item.
    pub fn activity_type(&self) -> &ActivityType {
        &self.activity_type
    }

    /// Build a fresh activity instance bound to this work item's type.
    pub fn resolve(&self) -> Box<dyn crate::Activity> {
        self.activity_type.create()
    }
}

impl std::fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkItem")
            .field("queue_address", &self.queue_address)
            .field("arguments", &self.arguments)
            .finish()
    }
}

impl PartialEq for WorkItem {
    /// Compares the address and arguments only. `activity_type` holds a
    /// trait-object factory with no meaningful equality of its own; two work
    /// items referring to the same queue address carry equivalent factories
    /// by construction (`queue_address` is derived from one).
    fn eq(&self, other: &Self) -> bool {
        self.queue_address == other.queue_address && self.arguments == other.arguments
    }
}
