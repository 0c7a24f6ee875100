//! Shared fixtures for this crate's own tests, layered on top of
//! `routingslip_core::test_utils`.

use routingslip_core::{ActivityType, RoutingSlip, WorkItem, WorkItemArguments};

/// Wrap a single activity type in its own one-step routing slip, the
/// shape every fork/join branch and fallback alternative takes in tests.
pub fn leaf(activity_type: ActivityType) -> RoutingSlip {
    RoutingSlip::new([WorkItem::new(activity_type, WorkItemArguments::new())])
}
