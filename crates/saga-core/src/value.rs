//! Free-form argument and result value maps.
//!
//! The runtime never inspects the contents of these maps (they are opaque
//! to everything except the activity that produced or consumes them) with
//! one exception: composite activities reserve a handful of well-known keys
//! (`branches`, `alternatives`, `_branches`, `_succeeded`) to embed entire
//! sub-slips, and the serialization module knows to recurse into those.
//!
//! [`ArgValue`] is the tagged Scalar/Seq/Map/Slip variant design note 9
//! calls for: a plain `serde_json::Value` cannot hold a live
//! [`RoutingSlip`] (its work items carry `ActivityType` factories, which are
//! not JSON values), so the `Slip`/`SlipList` variants exist specifically to
//! carry one in memory between an outer composite activity and the wire
//! serializer that knows how to recurse into it.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use crate::RoutingSlip;

/// Prefix reserved for runtime-internal result keys (e.g. `_branches`,
/// `_succeeded`). Activity authors must not use keys with this prefix.
pub const RESERVED_KEY_PREFIX: &str = "_";

/// A value held in a [`WorkItemArguments`] or [`WorkResult`] map.
#[derive(Debug, Clone)]
pub enum ArgValue {
    /// An opaque JSON scalar, array, or object the runtime never inspects.
    Scalar(serde_json::Value),
    /// An ordered list of values — used for composite activities' `branches`
    /// and `alternatives`, but available for any author's own lists.
    Seq(Vec<ArgValue>),
    /// A nested map of values.
    Map(BTreeMap<String, ArgValue>),
    /// A single embedded sub-saga, as used by `FallbackActivity`'s
    /// `_succeeded` result key.
    Slip(RoutingSlip),
    /// An ordered list of embedded sub-sagas, as used by `ParallelActivity`'s
    /// `branches` argument and `_branches` result keys.
    SlipList(Vec<RoutingSlip>),
}

impl ArgValue {
    /// View this value as a single sub-slip, if it is one.
    pub fn as_slip(&self) -> Option<&RoutingSlip> {
        match self {
            ArgValue::Slip(slip) => Some(slip),
            _ => None,
        }
    }

    /// View this value as a list of sub-slips, if it is one.
    pub fn as_slip_list(&self) -> Option<&[RoutingSlip]> {
        match self {
            ArgValue::SlipList(slips) => Some(slips),
            _ => None,
        }
    }

    /// View this value as an opaque JSON scalar, if it is one.
    pub fn as_scalar(&self) -> Option<&serde_json::Value> {
        match self {
            ArgValue::Scalar(value) => Some(value),
            _ => None,
        }
    }
}

impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ArgValue::Scalar(a), ArgValue::Scalar(b)) => a == b,
            (ArgValue::Seq(a), ArgValue::Seq(b)) => a == b,
            (ArgValue::Map(a), ArgValue::Map(b)) => a == b,
            (ArgValue::Slip(a), ArgValue::Slip(b)) => a == b,
            (ArgValue::SlipList(a), ArgValue::SlipList(b)) => a == b,
            _ => false,
        }
    }
}

impl From<serde_json::Value> for ArgValue {
    fn from(value: serde_json::Value) -> Self {
        ArgValue::Scalar(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Scalar(serde_json::Value::from(value))
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Scalar(serde_json::Value::from(value))
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Scalar(serde_json::Value::from(value))
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Scalar(serde_json::Value::from(value))
    }
}

impl From<RoutingSlip> for ArgValue {
    fn from(slip: RoutingSlip) -> Self {
        ArgValue::Slip(slip)
    }
}

impl From<Vec<RoutingSlip>> for ArgValue {
    fn from(slips: Vec<RoutingSlip>) -> Self {
        ArgValue::SlipList(slips)
    }
}

/// Arguments supplied to a [`WorkItem`](crate::WorkItem) when it is created.
///
/// Semantically a free-form bag produced by the saga author. A composite
/// activity reserves the keys `branches` (parallel) and `alternatives`
/// (fallback); all other keys are opaque to the runtime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkItemArguments(BTreeMap<String, ArgValue>);

impl WorkItemArguments {
    /// An empty argument bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an argument bag from a single key/value pair, for chaining with
    /// further [`Self::with`] calls.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl Deref for WorkItemArguments {
    type Target = BTreeMap<String, ArgValue>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for WorkItemArguments {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<BTreeMap<String, ArgValue>> for WorkItemArguments {
    fn from(map: BTreeMap<String, ArgValue>) -> Self {
        Self(map)
    }
}

/// The outcome of a successful [`Activity::do_work`](crate::Activity::do_work) call.
///
/// Reserved keys beginning with [`RESERVED_KEY_PREFIX`] carry
/// runtime-internal state (e.g. `_branches`, the successful alternative
/// sub-slip under `_succeeded`) and must survive serialization round-trips
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkResult(BTreeMap<String, ArgValue>);

impl WorkResult {
    /// An empty result map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a result map from a single key/value pair, for chaining with
    /// further [`Self::with`] calls.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl Deref for WorkResult {
    type Target = BTreeMap<String, ArgValue>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for WorkResult {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<BTreeMap<String, ArgValue>> for WorkResult {
    fn from(map: BTreeMap<String, ArgValue>) -> Self {
        Self(map)
    }
}
