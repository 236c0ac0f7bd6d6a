//! Route groups: the candidate responses registered for one route.

use crate::error::RouteError;
use crate::matcher::{SelectionMode, Selector};
use crate::response::{ResponseDefinition, RouteId};
use std::sync::Arc;

/// Ordered candidate responses for one route identity, plus how to pick one.
#[derive(Debug, Clone)]
pub struct RouteGroup {
    id: RouteId,
    responses: Vec<Arc<ResponseDefinition>>,
    selector: Selector,
}

impl RouteGroup {
    /// Start a group with its first candidate.
    pub fn new(first: ResponseDefinition, mode: SelectionMode) -> Result<Self, RouteError> {
        let mut selector = Selector::new(mode);
        selector.admit(&first)?;
        Ok(Self {
            id: first.route_id(),
            responses: vec![Arc::new(first)],
            selector,
        })
    }

    /// Build a group from a non-empty list, keeping its order.
    pub fn from_responses<I>(responses: I, mode: SelectionMode) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = ResponseDefinition>,
    {
        let mut iter = responses.into_iter();
        let first = iter.next().ok_or(RouteError::EmptyGroup)?;
        let mut group = Self::new(first, mode)?;
        for next in iter {
            group.receive(next)?;
        }
        Ok(group)
    }

    /// Append another candidate registered for the same route.
    pub fn receive(&mut self, next: ResponseDefinition) -> Result<(), RouteError> {
        let actual = next.route_id();
        if actual != self.id {
            return Err(RouteError::IdentityMismatch {
                expected: self.id.clone(),
                actual,
            });
        }
        self.selector.admit(&next)?;
        self.responses.push(Arc::new(next));
        Ok(())
    }

    /// Pick the candidate for a request body, if any matches.
    pub fn dispatch(&self, body: &[u8]) -> Option<Arc<ResponseDefinition>> {
        self.selector.select(&self.responses, body).cloned()
    }

    pub fn id(&self) -> &RouteId {
        &self.id
    }

    pub fn mode(&self) -> SelectionMode {
        self.selector.mode()
    }

    pub fn responses(&self) -> &[Arc<ResponseDefinition>] {
        &self.responses
    }

    pub fn path(&self) -> &str {
        self.responses[0].path()
    }

    pub fn method(&self) -> &str {
        self.responses[0].method()
    }
}
