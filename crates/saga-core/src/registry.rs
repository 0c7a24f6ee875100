//! Name-based activity resolution, decoupled from any global singleton.
//!
//! An explicit [`ActivityRegistry`] instance must be threaded to every
//! (de)serialization call — no process-wide state is introduced, so
//! per-service activity scoping and testing stay straightforward.

use std::collections::HashMap;

use crate::{ActivityType, Error};

/// Bidirectional mapping between stable activity type names and the
/// factories that produce them.
///
/// Reverse lookup (factory → name) is keyed by the activity's extensional
/// identity — the `(work_item_queue_address, compensation_queue_address)`
/// pair every instance of a type is contractually required to agree on —
/// rather than factory pointer identity, so two different concrete closures
/// that represent the same logical activity type still resolve to the same
/// name.
#[derive(Default)]
pub struct ActivityRegistry {
    by_name: HashMap<String, ActivityType>,
    names_by_address: HashMap<(String, String), String>,
}

impl ActivityRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `activity_type`, and record the reverse mapping for
    /// [`Self::get_name`]. Registration is order-insensitive: registering a
    /// different factory under a name already in use replaces it.
    pub fn register(&mut self, name: impl Into<String>, activity_type: ActivityType) {
        let name = name.into();
        let instance = activity_type.create();
        let address_key = (
            instance.work_item_queue_address(),
            instance.compensation_queue_address(),
        );
        self.names_by_address.insert(address_key, name.clone());
        self.by_name.insert(name, activity_type);
    }

    /// Resolve a stable name to its factory.
    ///
    /// # Errors
    /// [`Error::UnknownActivityType`] if no factory is registered under
    /// `name`.
    pub fn resolve(&self, name: &str) -> Result<ActivityType, Error> {
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownActivityType(name.to_string()))
    }

    /// Recover the stable name for `activity_type`.
    ///
    /// If the type was registered (by address identity), returns the
    /// registered name. Otherwise, if the produced instance exposes the
    /// [`NamedActivity`](crate::NamedActivity) capability, returns its
    /// `type_name()`. Otherwise fails loudly rather than silently aliasing.
    ///
    /// # Errors
    /// [`Error::UnregisteredActivityType`] if neither source yields a name.
    pub fn get_name(&self, activity_type: &ActivityType) -> Result<String, Error> {
        let instance = activity_type.create();
        let address_key = (
            instance.work_item_queue_address(),
            instance.compensation_queue_address(),
        );
        if let Some(name) = self.names_by_address.get(&address_key) {
            return Ok(name.clone());
        }
        if let Some(named) = instance.as_named() {
            return Ok(named.type_name());
        }
        Err(Error::UnregisteredActivityType)
    }
}

impl std::fmt::Debug for ActivityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityRegistry")
            .field("registered", &self.by_name.keys().collect::<Vec<_>>())
            .finish()
    }
}
