//! The nullary factory every registered activity type is built from.

use std::fmt;
use std::sync::Arc;

use crate::Activity;

type Factory = Arc<dyn Fn() -> Box<dyn Activity> + Send + Sync>;

/// A nullary factory that yields a fresh [`Activity`] instance.
///
/// The factory reference, not any one instance it produces, is the unit of
/// registration in an [`ActivityRegistry`](crate::ActivityRegistry): every
/// instance an `ActivityType` produces must agree on
/// [`Activity::work_item_queue_address`] and
/// [`Activity::compensation_queue_address`], and must report this same
/// `ActivityType` from [`Activity::activity_type`].
#[derive(Clone)]
pub struct ActivityType(Factory);

impl ActivityType {
    /// Wrap a closure that builds a fresh activity instance on every call.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Box<dyn Activity> + Send + Sync + 'static,
    {
        Self(Arc::new(factory))
    }

    /// Produce a fresh activity instance.
    pub fn create(&self) -> Box<dyn Activity> {
        (self.0)()
    }
}

impl fmt::Debug for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // A fresh instance is created only to read its stable addresses;
        // it is discarded immediately. Factories are cheap by contract.
        let instance = self.create();
        f.debug_struct("ActivityType")
            .field("work_item_queue_address", &instance.work_item_queue_address())
            .field("compensation_queue_address", &instance.compensation_queue_address())
            .finish()
    }
}
