//! The cancellation context threaded through every activity call.

use tokio_util::sync::CancellationToken;

/// Cancellation context passed to `DoWork`, `Compensate`, `ProcessNext`,
/// `UndoLast`, and `HandleMessage`.
///
/// Activities are responsible for their own per-call timeouts; this context
/// only carries cooperative cancellation. Cancelling mid-forward is
/// equivalent to the current step reporting `Failure` (the slip transitions
/// backward); cancelling mid-backward is a fatal condition the saga cannot
/// self-heal from (see the activity contract's recovery notes).
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
}

impl Context {
    /// A context that is never cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context linked to an existing cancellation token, so
    /// cancelling the parent cancels every derived `Context`.
    pub fn from_token(token: CancellationToken) -> Self {
        Self { token }
    }

    /// A child context: cancelling `self` cancels the child, but not the
    /// reverse.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    /// True if this context (or an ancestor) has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once this context is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel()
    }
}
