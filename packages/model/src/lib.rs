//! # Stanza Model
//!
//! Content model shared by the editing engine and the transport layer.
//!
//! The model is deliberately host-agnostic: entity storage, translation
//! resolution, per-entity access checks, revision policy and field rendering
//! are contracts (`host` module) owned by the surrounding CMS. The engine
//! receives them as explicit dependencies instead of reaching into ambient
//! global state.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: entities + host contracts            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: access decisions + move/add engine  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ workspace: HTTP surface + UI commands       │
//! └─────────────────────────────────────────────┘
//! ```

pub mod access;
pub mod bundles;
pub mod entity;
pub mod field;
pub mod host;
pub mod memory;

pub use access::{AccessDecision, CacheDeps};
pub use bundles::BlogPost;
pub use entity::{Entity, EntityKey, FieldValue, Lineage, ParagraphRef, PARAGRAPH_ENTITY_TYPE};
pub use field::{Cardinality, FieldDefinition};
pub use host::{
    AccessHandler, Account, EntityOp, EntityStore, FieldRenderer, RevisionPolicy, StaticAccount,
    StoreError, TranslationResolver, PERM_ADD_PARAGRAPHS, PERM_MOVE_PARAGRAPHS,
};
pub use memory::MemoryHost;
