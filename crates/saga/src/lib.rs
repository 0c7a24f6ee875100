//! Routing-slip saga runtime: composite activities, the distributed
//! activity host, and wire serialization, built on the contract types in
//! `routingslip-core`.
//!
//! - [`ParallelActivity`] and [`FallbackActivity`] compose sub-slips into a
//!   single activity, so a saga author can fork/join or try-in-order
//!   without the host treating composition as a special case.
//! - [`ActivityHost`] is the piece of infrastructure a node hosting
//!   activities runs: route an arriving slip to the right activity, step it
//!   once, hand it to a transport-supplied `send` callback.
//! - [`driver`] holds the forward/backward state machine both the host and
//!   the composite activities use to run a slip without external routing.
//! - [`wire`] turns a slip into its JSON wire shape and back, resolving
//!   activity type names through an [`routingslip_core::ActivityRegistry`].

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod driver;
mod error;
mod fallback;
mod host;
mod parallel;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;
pub mod wire;

pub use error::{Error, Result};
pub use fallback::FallbackActivity;
pub use host::ActivityHost;
pub use parallel::ParallelActivity;

pub use routingslip_core::{
    Activity, ActivityError, ActivityRegistry, ActivityType, ArgValue, Context, DoWorkOutcome,
    NamedActivity, RoutingSlip, WorkItem, WorkItemArguments, WorkLog, WorkResult,
};
