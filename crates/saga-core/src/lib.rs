//! Shared types and traits for the routing-slip saga runtime.
//!
//! This crate is the foundation other routing-slip crates build on: the
//! free-form argument/result value maps, the `WorkItem`/`WorkLog` pair the
//! routing slip is built from, the `RoutingSlip` state machine itself, the
//! `Activity` contract every participant implements, and the name-indexed
//! `ActivityRegistry` used to resolve activities during serialization.
//!
//! Composite activities (parallel fork/join, sequential fallback), the
//! distributed activity host, and the wire serialization module live in the
//! `routingslip` crate, built on top of what is defined here.

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

mod activity;
mod activity_type;
mod context;
mod error;
mod registry;
mod routing_slip;
mod value;
mod work_item;
mod work_log;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use activity::{Activity, ActivityError, DoWorkOutcome, NamedActivity};
pub use activity_type::ActivityType;
pub use context::Context;
pub use error::{Error, Result};
pub use registry::ActivityRegistry;
pub use routing_slip::RoutingSlip;
pub use value::{ArgValue, WorkItemArguments, WorkResult, RESERVED_KEY_PREFIX};
pub use work_item::WorkItem;
pub use work_log::WorkLog;
