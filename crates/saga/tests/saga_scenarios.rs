//! Multi-module integration tests exercising the saga runtime end to end:
//! a plain forward path, full backward compensation, fork/join success and
//! fail-fast, sequential fallback, and a mid-saga wire round-trip.

use routingslip::driver::drive;
use routingslip::test_support::leaf;
use routingslip::wire::{from_serializable, to_serializable};
use routingslip::{
    Activity, ActivityRegistry, Context, FallbackActivity, ParallelActivity, RoutingSlip,
    WorkItem, WorkItemArguments,
};
use routingslip_core::test_utils::{always_fail, always_succeed, call_counts};

#[tokio::test]
async fn happy_path_runs_every_step_forward() {
    let counts = call_counts();
    let slip = RoutingSlip::new([
        WorkItem::new(always_succeed("reserve-car", counts.clone()), WorkItemArguments::new()),
        WorkItem::new(always_succeed("charge-card", counts.clone()), WorkItemArguments::new()),
        WorkItem::new(always_succeed("send-confirmation", counts.clone()), WorkItemArguments::new()),
    ]);
    let mut slip = slip;
    let ctx = Context::new();

    let ok = drive(&mut slip, &ctx).await.unwrap();

    assert!(ok);
    assert!(slip.is_completed());
    assert_eq!(slip.completed_len(), 3);
}

#[tokio::test]
async fn a_failing_step_compensates_everything_completed_so_far() {
    let counts = call_counts();
    let mut slip = RoutingSlip::new([
        WorkItem::new(always_succeed("reserve-car", counts.clone()), WorkItemArguments::new()),
        WorkItem::new(always_succeed("charge-card", counts.clone()), WorkItemArguments::new()),
        WorkItem::new(always_fail("send-confirmation", counts.clone()), WorkItemArguments::new()),
    ]);
    let ctx = Context::new();

    let ok = drive(&mut slip, &ctx).await.unwrap();

    assert!(!ok);
    assert_eq!(slip.completed_len(), 0);
    assert_eq!(slip.pending_len(), 0);
    let seen = counts.lock().unwrap().clone();
    assert_eq!(seen.get("compensate:charge-card"), Some(&1));
    assert_eq!(seen.get("compensate:reserve-car"), Some(&1));
}

#[tokio::test]
async fn parallel_branches_all_succeeding_completes_the_step() {
    let counts = call_counts();
    let work_item = ParallelActivity::work_item(vec![
        leaf(always_succeed("charge-visa", counts.clone())),
        leaf(always_succeed("charge-loyalty-points", counts.clone())),
    ]);
    let mut slip = RoutingSlip::new([work_item]);
    let ctx = Context::new();

    let ok = drive(&mut slip, &ctx).await.unwrap();

    assert!(ok);
    assert!(slip.is_completed());
    assert_eq!(slip.completed_len(), 1);
}

#[tokio::test]
async fn parallel_branch_failure_compensates_every_branch() {
    let counts = call_counts();
    let work_item = ParallelActivity::work_item(vec![
        leaf(always_succeed("charge-visa", counts.clone())),
        leaf(always_fail("charge-loyalty-points", counts.clone())),
    ]);
    let mut slip = RoutingSlip::new([work_item]);
    let ctx = Context::new();

    let ok = drive(&mut slip, &ctx).await.unwrap();

    assert!(!ok);
    assert_eq!(slip.completed_len(), 0);
    assert_eq!(slip.pending_len(), 0);
    let seen = counts.lock().unwrap().clone();
    assert_eq!(seen.get("compensate:charge-visa"), Some(&1));
}

#[tokio::test]
async fn parallel_branches_each_spanning_multiple_steps_compensate_lifo_per_branch() {
    let counts = call_counts();
    let s1 = RoutingSlip::new([
        WorkItem::new(always_succeed("book-flight", counts.clone()), WorkItemArguments::new()),
        WorkItem::new(always_succeed("book-seat", counts.clone()), WorkItemArguments::new()),
    ]);
    let s2 = RoutingSlip::new([WorkItem::new(
        always_fail("book-hotel", counts.clone()),
        WorkItemArguments::new(),
    )]);
    let work_item = ParallelActivity::work_item(vec![s1, s2]);
    let mut slip = RoutingSlip::new([work_item]);
    let ctx = Context::new();

    let ok = drive(&mut slip, &ctx).await.unwrap();

    assert!(!ok);
    assert_eq!(slip.completed_len(), 0);
    assert_eq!(slip.pending_len(), 0);
    let seen = counts.lock().unwrap().clone();
    assert_eq!(seen.get("do_work:book-flight"), Some(&1));
    assert_eq!(seen.get("do_work:book-seat"), Some(&1));
    // Branch-local LIFO: `book-seat` compensates before `book-flight`, since
    // `book-seat` completed after it within the same branch.
    assert_eq!(seen.get("compensate:book-seat"), Some(&1));
    assert_eq!(seen.get("compensate:book-flight"), Some(&1));
}

#[tokio::test]
async fn fallback_chooses_the_second_alternative() {
    let counts = call_counts();
    let work_item = FallbackActivity::work_item(vec![
        leaf(always_fail("primary-gateway", counts.clone())),
        leaf(always_succeed("backup-gateway", counts.clone())),
    ]);
    let mut slip = RoutingSlip::new([work_item]);
    let ctx = Context::new();

    let ok = drive(&mut slip, &ctx).await.unwrap();

    assert!(ok);
    assert!(slip.is_completed());
    let seen = counts.lock().unwrap().clone();
    assert_eq!(seen.get("do_work:primary-gateway"), Some(&1));
    // `primary-gateway` fails before producing a work log, so there is
    // nothing for its own backward pass to undo (spec.md §8 scenario 5).
    assert_eq!(seen.get("compensate:primary-gateway"), None);
    assert_eq!(seen.get("do_work:backup-gateway"), Some(&1));
}

#[tokio::test]
async fn a_mid_saga_slip_round_trips_through_the_wire_format() {
    let counts = call_counts();
    let a = always_succeed("reserve-car", counts.clone());
    let b = always_succeed("charge-card", counts.clone());
    let mut registry = ActivityRegistry::new();
    registry.register("reserve-car", a.clone());
    registry.register("charge-card", b.clone());

    let mut slip = RoutingSlip::new([
        WorkItem::new(a, WorkItemArguments::new()),
        WorkItem::new(b, WorkItemArguments::new()),
    ]);
    let ctx = Context::new();
    // Run exactly one step so the slip sits in a genuinely mid-saga state:
    // one completed work log, one pending work item.
    slip.process_next(&ctx, |item| item.resolve()).await.unwrap();

    let encoded = to_serializable(&slip, &registry).unwrap();
    let encoded_text = serde_json::to_string(&encoded).unwrap();
    let reparsed: serde_json::Value = serde_json::from_str(&encoded_text).unwrap();
    let decoded = from_serializable(&reparsed, &registry).unwrap();

    assert_eq!(slip, decoded);
}

#[tokio::test]
async fn arbitrary_nested_activity_arguments_survive_a_wire_round_trip() {
    let counts = call_counts();
    let quote = always_succeed("price-quote", counts.clone());
    let mut registry = ActivityRegistry::new();
    registry.register("price-quote", quote.clone());

    let slip = RoutingSlip::new([WorkItem::new(
        quote,
        WorkItemArguments::new().with(
            "quote",
            serde_json::json!({ "currency": "usd", "amount": 1999, "tags": ["promo", "loyalty"] }),
        ),
    )]);

    let encoded = to_serializable(&slip, &registry).unwrap();
    let decoded = from_serializable(&encoded, &registry).unwrap();

    assert_eq!(slip, decoded);
}

#[tokio::test]
async fn a_pending_parallel_steps_branches_round_trip_through_the_wire_format() {
    // The branches of an unexecuted parallel step live in the pending work
    // item's `branches` argument (spec.md §3/§4.3), not in the activity's
    // own state, so they must survive encode/decode the same way any other
    // argument does rather than being silently replaced by whatever the
    // decoding host's registry happens to have registered under "parallel".
    let counts = call_counts();
    let a = always_succeed("charge-visa", counts.clone());
    let b = always_succeed("charge-loyalty-points", counts.clone());
    let mut registry = ActivityRegistry::new();
    registry.register("charge-visa", a.clone());
    registry.register("charge-loyalty-points", b.clone());
    registry.register("parallel", ParallelActivity::new().activity_type());

    let work_item = ParallelActivity::work_item(vec![leaf(a), leaf(b)]);
    let slip = RoutingSlip::new([work_item]);

    let encoded = to_serializable(&slip, &registry).unwrap();
    let decoded = from_serializable(&encoded, &registry).unwrap();

    assert_eq!(slip, decoded);
    let ctx = Context::new();
    let mut decoded = decoded;
    assert!(drive(&mut decoded, &ctx).await.unwrap());
    assert_eq!(
        counts.lock().unwrap().get("do_work:charge-visa"),
        Some(&1),
        "decoded branches must actually run, not an empty substitute"
    );
}

#[tokio::test]
async fn a_completed_parallel_steps_branches_round_trip_through_the_wire_format() {
    // spec.md §4.7's "Note on composite activities": `_branches` holds
    // entire sub-slips and must recursively (de)serialize with the same
    // resolver once the step has completed, not just while pending.
    let counts = call_counts();
    let a = always_succeed("book-flight", counts.clone());
    let b = always_succeed("book-hotel", counts.clone());
    let mut registry = ActivityRegistry::new();
    registry.register("book-flight", a.clone());
    registry.register("book-hotel", b.clone());
    registry.register("parallel", ParallelActivity::new().activity_type());

    let work_item = ParallelActivity::work_item(vec![leaf(a), leaf(b)]);
    let mut slip = RoutingSlip::new([work_item]);
    let ctx = Context::new();
    assert!(slip.process_next(&ctx, |item| item.resolve()).await.unwrap());
    assert!(slip.is_completed());
    assert_eq!(slip.completed_len(), 1);

    let encoded = to_serializable(&slip, &registry).unwrap();
    let decoded = from_serializable(&encoded, &registry).unwrap();

    assert_eq!(slip, decoded);
}

#[tokio::test]
async fn a_completed_fallbacks_succeeded_alternative_round_trips_through_the_wire_format() {
    let counts = call_counts();
    let primary = always_fail("primary-gateway", counts.clone());
    let backup = always_succeed("backup-gateway", counts.clone());
    let mut registry = ActivityRegistry::new();
    registry.register("primary-gateway", primary.clone());
    registry.register("backup-gateway", backup.clone());
    registry.register("fallback", FallbackActivity::new().activity_type());

    let work_item = FallbackActivity::work_item(vec![leaf(primary), leaf(backup)]);
    let mut slip = RoutingSlip::new([work_item]);
    let ctx = Context::new();
    assert!(slip.process_next(&ctx, |item| item.resolve()).await.unwrap());
    assert!(slip.is_completed());
    assert_eq!(slip.completed_len(), 1);

    let encoded = to_serializable(&slip, &registry).unwrap();
    let decoded = from_serializable(&encoded, &registry).unwrap();

    assert_eq!(slip, decoded);
}
