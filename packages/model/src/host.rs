//! # Host Service Contracts
//!
//! Boundary contracts the editing engine consumes from the surrounding CMS.
//! Storage, translation resolution, per-entity access, revision policy and
//! field rendering stay owned by the host; the engine only calls through
//! these traits. [`crate::memory::MemoryHost`] implements all of them for
//! tests and the demo server.

use crate::entity::{Entity, EntityKey};
use crate::field::FieldDefinition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Capability required to reorder paragraphs.
pub const PERM_MOVE_PARAGRAPHS: &str = "move paragraphs";

/// Capability required to add paragraphs.
pub const PERM_ADD_PARAGRAPHS: &str = "add paragraphs";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entity type {0} is not known to the store")]
    UnknownEntityType(String),

    #[error("entity {0} was not found")]
    NotFound(EntityKey),

    #[error("failed to persist {key}: {message}")]
    Persistence { key: EntityKey, message: String },
}

/// Load and persist entities.
pub trait EntityStore: Send + Sync {
    /// Resolve an entity by key. `Ok(None)` means not found; `Err` means the
    /// entity type itself is unknown or the backend failed.
    fn load(&self, key: &EntityKey) -> Result<Option<Entity>, StoreError>;

    /// Introspect the definition of a field on an entity.
    fn field_definition(&self, entity: &Entity, field: &str) -> Option<FieldDefinition>;

    /// Persist an entity, optionally as a new revision. Returns the stored
    /// entity with its assigned revision id. Failure is fatal for the
    /// request; the engine performs no retries.
    fn save(&self, entity: &Entity, new_revision: bool) -> Result<Entity, StoreError>;

    /// Create and persist a new paragraph of `bundle` with its lineage set.
    fn create_paragraph(
        &self,
        bundle: &str,
        parent: &EntityKey,
        field: &str,
    ) -> Result<Entity, StoreError>;
}

/// Resolve the translation matching the current request context.
pub trait TranslationResolver: Send + Sync {
    fn translation_from_context(&self, entity: Entity, langcode: &str) -> Entity;
}

/// Operation checked per entity by the host's access handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityOp {
    View,
    Update,
    Delete,
}

/// The acting user of the current request.
pub trait Account: Send + Sync {
    fn id(&self) -> u64;
    fn has_permission(&self, permission: &str) -> bool;
}

/// Host-owned per-entity and per-field access checks.
pub trait AccessHandler: Send + Sync {
    fn entity_access(&self, entity: &Entity, op: EntityOp, account: &dyn Account) -> bool;

    fn field_access(
        &self,
        entity: &Entity,
        field: &str,
        op: EntityOp,
        account: &dyn Account,
    ) -> bool;
}

/// Decides whether a pending change to an entity warrants a new persisted
/// revision or an in-place save.
pub trait RevisionPolicy: Send + Sync {
    fn should_create_new_revision(&self, entity: &Entity) -> bool;
}

/// Render a field of an entity to HTML in a view mode.
pub trait FieldRenderer: Send + Sync {
    fn render_field(&self, entity: &Entity, field: &str, view_mode: &str) -> Option<String>;
}

/// Account backed by a fixed permission set, for tests and the demo server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticAccount {
    pub id: u64,
    pub permissions: BTreeSet<String>,
}

impl StaticAccount {
    pub fn new<I, S>(id: u64, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// An account holding every editing capability.
    pub fn editor(id: u64) -> Self {
        Self::new(
            id,
            [
                PERM_MOVE_PARAGRAPHS,
                PERM_ADD_PARAGRAPHS,
                "update node",
                "update paragraph",
                "view node",
                "view paragraph",
                "delete node",
                "delete paragraph",
            ],
        )
    }
}

impl Account for StaticAccount {
    fn id(&self) -> u64 {
        self.id
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}
