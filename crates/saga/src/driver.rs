//! Non-recursive forward/backward drivers shared by the local test harness
//! and the composite activities, which both need to run an embedded
//! sub-slip to some terminal state without an external host in the loop.

use routingslip_core::{Activity, Context, RoutingSlip};

/// Which way a slip is currently being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Stepping through `pending`, invoking `DoWork`.
    Forward,
    /// Unwinding `completed`, invoking `Compensate`.
    Backward,
}

fn resolve_item(item: &routingslip_core::WorkItem) -> Box<dyn Activity> {
    item.resolve()
}

fn resolve_log(log: &routingslip_core::WorkLog) -> Box<dyn Activity> {
    log.resolve()
}

/// Drive `slip` starting in `direction` until it reaches a terminal state:
/// `Ok(true)` if it ran out of pending work while going forward (the saga,
/// or sub-saga, succeeded), `Ok(false)` if it ran out of completed work
/// while going backward (the saga failed and fully unwound). A pivoting
/// compensation (`Compensate` returning `false`) reverses direction back to
/// forward rather than terminating.
pub async fn drive_from(
    slip: &mut RoutingSlip,
    ctx: &Context,
    mut direction: Direction,
) -> routingslip_core::Result<bool> {
    loop {
        match direction {
            Direction::Forward => {
                if slip.pending_len() == 0 {
                    return Ok(true);
                }
                let ok = slip.process_next(ctx, resolve_item).await?;
                if !ok {
                    direction = Direction::Backward;
                }
            }
            Direction::Backward => {
                if slip.completed_len() == 0 {
                    return Ok(false);
                }
                let cont = slip.undo_last(ctx, resolve_log).await?;
                if !cont {
                    direction = Direction::Forward;
                }
            }
        }
    }
}

/// Drive `slip` to a terminal state, choosing the initial direction from its
/// current shape (forward if there is pending work, backward if it already
/// has completed work to unwind, already-terminal otherwise). This is the
/// driver a local test harness or a naive single-process caller reaches for
/// when there is no external host forwarding the slip between queues.
pub async fn drive(slip: &mut RoutingSlip, ctx: &Context) -> routingslip_core::Result<bool> {
    let direction = if slip.pending_len() > 0 {
        Direction::Forward
    } else {
        Direction::Backward
    };
    drive_from(slip, ctx, direction).await
}

/// Drive `slip` forward only, stopping the instant a step fails rather than
/// transitioning to backward. Used by fork/join and fallback, which need to
/// observe a branch's own failure before deciding whether (and how) to
/// compensate it, rather than have it silently unwind itself.
///
/// Returns `Ok(true)` if every remaining pending item succeeded, `Ok(false)`
/// at the first failure (the failing item has already been discarded from
/// `pending`; whatever ran before it remains in `completed`, untouched).
pub async fn drive_forward(
    slip: &mut RoutingSlip,
    ctx: &Context,
) -> routingslip_core::Result<bool> {
    loop {
        if slip.pending_len() == 0 {
            return Ok(true);
        }
        let ok = slip.process_next(ctx, resolve_item).await?;
        if !ok {
            return Ok(false);
        }
    }
}
