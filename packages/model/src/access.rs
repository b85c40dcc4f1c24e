//! # Access Decisions
//!
//! The outcome of an access evaluation: allowed, or forbidden with an
//! optional human-readable reason. Decisions are values, not errors, so
//! callers can render a message instead of crashing. A decision carries the
//! cache dependencies that made it (entities consulted, whether it varies by
//! permission set) so a caller may memoize it safely. Once produced, a
//! decision is never mutated in place; combinators return a new value.

use crate::entity::EntityKey;
use serde::{Deserialize, Serialize};

/// Cache-affecting dependencies of a decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDeps {
    /// Entities whose state the decision depends on.
    pub entities: Vec<EntityKey>,
    /// The decision varies with the actor's permission set.
    pub per_permissions: bool,
}

/// Boolean-with-reason access outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessDecision {
    allowed: bool,
    reason: Option<String>,
    cache: CacheDeps,
}

impl AccessDecision {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
            cache: CacheDeps::default(),
        }
    }

    pub fn forbidden() -> Self {
        Self {
            allowed: false,
            reason: None,
            cache: CacheDeps::default(),
        }
    }

    pub fn forbidden_with_reason(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            cache: CacheDeps::default(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn cache(&self) -> &CacheDeps {
        &self.cache
    }

    /// Record that the decision depends on the state of `key`.
    pub fn with_entity_dependency(mut self, key: EntityKey) -> Self {
        self.cache.entities.push(key);
        self
    }

    /// Record that the decision varies with the actor's permissions.
    pub fn per_permissions(mut self) -> Self {
        self.cache.per_permissions = true;
        self
    }
}
