//! The distributed activity host: the piece of infrastructure every node
//! hosting one or more activities runs, translating a message arriving on a
//! queue into a single forward or backward step and handing the slip to
//! whatever transport moves it to its next address.

use std::collections::HashMap;

use futures::future::BoxFuture;
use tracing::instrument;

use routingslip_core::{ActivityType, Context, RoutingSlip};

use crate::error::{Error, Result};

/// Registers activity types against the queue addresses they own and routes
/// an incoming slip to the right one.
///
/// A host is transport-agnostic: [`Self::handle_message`] takes the queue
/// address the slip arrived on and a `send` callback responsible for
/// actually publishing the slip to its next address (over whatever message
/// bus the deployment uses — out of scope here, per the contract boundary).
#[derive(Default)]
pub struct ActivityHost {
    by_address: HashMap<String, ActivityType>,
}

impl ActivityHost {
    /// An empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `activity_type` under both of its queue addresses (forward
    /// and compensation). Re-registering a queue address already in use
    /// replaces the factory bound to it.
    pub fn register(&mut self, activity_type: ActivityType) {
        let instance = activity_type.create();
        self.by_address
            .insert(instance.work_item_queue_address(), activity_type.clone());
        self.by_address
            .insert(instance.compensation_queue_address(), activity_type);
    }

    /// Every queue address this host answers for.
    pub fn queues(&self) -> impl Iterator<Item = &str> {
        self.by_address.keys().map(String::as_str)
    }

    /// Handle a slip that just arrived on `queue_address`: perform exactly
    /// one forward or backward step (whichever `queue_address` identifies),
    /// then forward the slip to its new next address via `send`, if it has
    /// one. Returns the slip in its new state once the step and any send
    /// have completed.
    ///
    /// # Errors
    /// [`Error::UnknownQueue`] if no activity is registered for
    /// `queue_address`; [`Error::Core`] for a structural failure from the
    /// slip itself; [`Error::SendFailed`] if `send` errors.
    #[instrument(skip(self, slip, ctx, send), fields(queue = %queue_address))]
    pub async fn handle_message<'a>(
        &self,
        queue_address: &str,
        mut slip: RoutingSlip,
        ctx: &Context,
        send: impl Fn(String, RoutingSlip) -> BoxFuture<'a, Result<(), Box<dyn std::error::Error + Send + Sync>>>
            + Send
            + Sync,
    ) -> Result<RoutingSlip> {
        let activity_type = self
            .by_address
            .get(queue_address)
            .ok_or_else(|| Error::UnknownQueue(queue_address.to_string()))?;
        let instance = activity_type.create();

        let going_forward = queue_address == instance.work_item_queue_address();

        // A message can arrive after the slip already reached the terminal
        // state for this direction (e.g. a duplicate redelivery) — no-op
        // rather than asking the slip to perform a step it has nothing left
        // to do.
        if going_forward && slip.is_completed() {
            return Ok(slip);
        }
        if !going_forward && !slip.is_in_progress() {
            return Ok(slip);
        }
        // After the step, `still_forward` tells us which address family the
        // slip should move to next: a successful forward step (or a pivot
        // out of backward) continues forward; a failed forward step (or a
        // plain backward continuation) continues backward.
        let still_forward = if going_forward {
            let ok = slip
                .process_next(ctx, |item| item.resolve())
                .await
                .map_err(Error::Core)?;
            tracing::debug!(succeeded = ok, "forward step complete");
            ok
        } else {
            let ok = slip
                .undo_last(ctx, |log| log.resolve())
                .await
                .map_err(Error::Core)?;
            tracing::debug!(continuing_backward = ok, "backward step complete");
            !ok
        };

        let destination = if still_forward {
            (slip.pending_len() > 0).then(|| slip.progress_uri())
        } else {
            (slip.completed_len() > 0).then(|| slip.compensation_uri())
        };

        if let Some(destination) = destination.filter(|d| !d.is_empty()) {
            send(destination.clone(), slip)
                .await
                .map_err(|source| Error::SendFailed {
                    uri: destination,
                    source,
                })?;
            // The slip was moved into `send`; callers observe its terminal
            // local state through the transport, not this return value, once
            // it has somewhere left to go.
            return Ok(RoutingSlip::new(Vec::new()));
        }

        Ok(slip)
    }
}

impl std::fmt::Debug for ActivityHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityHost")
            .field("queues", &self.by_address.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routingslip_core::test_utils::{always_succeed, call_counts};
    use routingslip_core::{WorkItem, WorkItemArguments};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn forward_step_with_more_pending_sends_onward() {
        let counts = call_counts();
        let a = always_succeed("a", counts.clone());
        let b = always_succeed("b", counts.clone());

        let mut host = ActivityHost::new();
        host.register(a.clone());
        host.register(b.clone());

        let slip = RoutingSlip::new([
            WorkItem::new(a.clone(), WorkItemArguments::new()),
            WorkItem::new(b, WorkItemArguments::new()),
        ]);
        let sent: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sent_clone = sent.clone();

        let ctx = Context::new();
        let queue = a.create().work_item_queue_address();
        host.handle_message(&queue, slip, &ctx, move |addr, _slip| {
            let sent = sent_clone.clone();
            Box::pin(async move {
                sent.lock().unwrap().push(addr);
                Ok(())
            })
        })
        .await
        .unwrap();

        assert_eq!(sent.lock().unwrap().as_slice(), ["sb://./b"]);
    }

    #[tokio::test]
    async fn forward_message_on_an_already_completed_slip_is_a_no_op() {
        let counts = call_counts();
        let a = always_succeed("a", counts.clone());

        let mut host = ActivityHost::new();
        host.register(a.clone());

        let slip = RoutingSlip::from_parts(uuid::Uuid::new_v4(), Default::default(), vec![]);
        let ctx = Context::new();
        let queue = a.create().work_item_queue_address();
        let result = host
            .handle_message(&queue, slip, &ctx, |_, _| Box::pin(async { Ok(()) }))
            .await
            .unwrap();

        assert!(result.is_completed());
        assert!(counts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_queue_address_errors() {
        let host = ActivityHost::new();
        let slip = RoutingSlip::new(Vec::<WorkItem>::new());
        let ctx = Context::new();
        let result = host
            .handle_message("sb://./nowhere", slip, &ctx, |_, _| {
                Box::pin(async { Ok(()) })
            })
            .await;
        assert!(matches!(result, Err(Error::UnknownQueue(_))));
    }
}
