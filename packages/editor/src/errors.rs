//! Error types for the editing engine.
//!
//! Forbidden and not-found outcomes are data, not errors: the evaluators
//! return [`stanza_model::AccessDecision`] values and the orchestrators
//! report rejection through their outcome enums. `EditorError` is reserved
//! for failures that are fatal for the request.

use stanza_model::{EntityKey, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("paragraph {0} has no parent lineage")]
    MissingLineage(EntityKey),

    #[error("parent chain of {key} exceeds {limit} levels")]
    LineageTooDeep { key: EntityKey, limit: usize },
}
