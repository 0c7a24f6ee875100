//! Error types shared by the routing-slip runtime.

use thiserror::Error;

/// Core error type.
///
/// Structural failures (bad caller usage, unresolvable names) propagate as
/// this error. Activity-level failures never appear here: `DoWork` reports
/// them as a `Failure` result, not an `Err`, so that the saga can transition
/// to its backward path instead of unwinding a call stack (see the activity
/// contract's propagation policy).
#[derive(Debug, Error)]
pub enum Error {
    /// `NextWorkItem`/`ProcessNext` called on a slip with no pending work.
    #[error("routing slip has no pending work items")]
    NoPendingWork,
    /// `LastCompletedWork`/`UndoLast` called on a slip with nothing completed.
    #[error("routing slip has no completed work to undo")]
    NoCompletedWork,
    /// `Compensate` returned an error. Fatal: the saga cannot self-heal mid
    /// compensation and is left in an inconsistent state requiring operator
    /// intervention.
    #[error("compensation failed for queue `{queue}`: {source}")]
    CompensationFailed {
        /// The compensation queue address whose activity failed to compensate.
        queue: String,
        /// The underlying activity error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The resolver has no factory registered under this name.
    #[error("no activity type registered under name `{0}`")]
    UnknownActivityType(String),
    /// `GetName` could not derive a stable name for a factory: it was not
    /// registered and the produced activity exposes no `NamedActivity`
    /// capability.
    #[error("activity type has no registered or derivable name")]
    UnregisteredActivityType,
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
