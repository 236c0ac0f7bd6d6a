//! The registry mapping route identities to route groups.

use crate::error::RouteError;
use crate::group::RouteGroup;
use crate::matcher::SelectionMode;
use crate::response::{ResponseDefinition, RouteId, WELCOME_BODY};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared table of registered routes.
///
/// Groups are stored behind `Arc`, so a lookup only holds the read lock long
/// enough to clone the pointer; selection runs outside the lock. Replacing an
/// entry swaps the whole group under the write lock, so readers see either the
/// old group or the new one.
#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<HashMap<RouteId, Arc<RouteGroup>>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with the `"/ | GET"` welcome route.
    pub fn with_default_route() -> Result<Self, RouteError> {
        let registry = Self::new();
        let welcome = ResponseDefinition::new("/", "GET").with_body(WELCOME_BODY);
        registry.register(RouteGroup::new(welcome, SelectionMode::Fixed)?);
        Ok(registry)
    }

    /// Insert a group, replacing whatever was registered under its identity.
    ///
    /// Returns the replaced group, if any.
    pub fn register(&self, group: RouteGroup) -> Option<Arc<RouteGroup>> {
        let id = group.id().clone();
        self.write().insert(id, Arc::new(group))
    }

    /// Select a response for `identity` (`"{path} | {METHOD}"`).
    ///
    /// `None` when the identity is not registered or no candidate matched.
    pub fn dispatch(&self, identity: &str, body: &[u8]) -> Option<Arc<ResponseDefinition>> {
        let group = self.get(identity)?;
        group.dispatch(body)
    }

    pub fn get(&self, identity: &str) -> Option<Arc<RouteGroup>> {
        self.read().get(identity).cloned()
    }

    /// Current groups, sorted by identity.
    pub fn snapshot(&self) -> Vec<Arc<RouteGroup>> {
        let mut groups: Vec<_> = self.read().values().cloned().collect();
        groups.sort_by(|a, b| a.id().cmp(b.id()));
        groups
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panic while holding the lock cannot leave the map half-written: every
    // mutation is a single insert.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<RouteId, Arc<RouteGroup>>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<RouteId, Arc<RouteGroup>>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
