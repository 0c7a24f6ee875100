//! Error types for the routing-slip engine crate.

use thiserror::Error;

/// Engine-level error type.
///
/// Wraps [`routingslip_core::Error`] for failures originating in the
/// contract layer, and adds the host- and serialization-specific variants
/// that only make sense once an [`ActivityHost`](crate::ActivityHost) or the
/// wire codec is in the picture.
#[derive(Debug, Error)]
pub enum Error {
    /// A failure from the shared contract layer (invalid operation, unknown
    /// activity type, compensation failure, ...).
    #[error(transparent)]
    Core(#[from] routingslip_core::Error),
    /// `HandleMessage` received a queue address no registered activity owns.
    #[error("no activity registered for queue `{0}`")]
    UnknownQueue(String),
    /// The `send` callback returned an error while publishing the slip to
    /// its next address.
    #[error("failed to send slip to `{uri}`: {source}")]
    SendFailed {
        /// The destination queue address the send was attempting to reach.
        uri: String,
        /// The underlying transport error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A composite activity's reserved argument/result key (`branches`,
    /// `alternatives`, `_branches`, `_succeeded`) was missing or malformed.
    #[error("malformed composite activity payload: {0}")]
    MalformedComposite(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
