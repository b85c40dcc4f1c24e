//! # Paragraph Editor
//!
//! Orchestrates paragraph moves and adds against the host services. Every
//! operation re-runs its access evaluator before touching data, mutates the
//! parent's ordered reference sequence in memory, and hands persistence back
//! to the host store with the revision policy's verdict.
//!
//! The engine holds no state across calls: it reads the current sequence,
//! computes a new one, persists, returns.

use crate::direction::Direction;
use crate::errors::EditorError;
use crate::events::AccessEvents;
use crate::reorder;
use serde::{Deserialize, Serialize};
use stanza_model::{
    AccessDecision, AccessHandler, Account, Entity, EntityKey, EntityOp, EntityStore,
    ParagraphRef, RevisionPolicy, StoreError, TranslationResolver, PERM_ADD_PARAGRAPHS,
    PERM_MOVE_PARAGRAPHS,
};
use std::sync::Arc;

/// Maximum number of parent hops when walking a paragraph's lineage.
/// Exceeding it means the parent chain is malformed (a cycle or runaway
/// nesting) and the request fails.
pub const MAX_LINEAGE_DEPTH: usize = 32;

/// Per-request context: the acting user and the negotiated language.
pub struct EditContext<'a> {
    pub account: &'a dyn Account,
    pub langcode: &'a str,
}

impl<'a> EditContext<'a> {
    pub fn new(account: &'a dyn Account, langcode: &'a str) -> Self {
        Self { account, langcode }
    }
}

/// Result of a move orchestration.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    Moved,
    Rejected(AccessDecision),
}

impl MoveOutcome {
    pub fn moved(&self) -> bool {
        matches!(self, MoveOutcome::Moved)
    }
}

/// Result of an add orchestration.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added(Entity),
    Rejected(AccessDecision),
}

impl AddOutcome {
    pub fn added(&self) -> Option<&Entity> {
        match self {
            AddOutcome::Added(paragraph) => Some(paragraph),
            AddOutcome::Rejected(_) => None,
        }
    }
}

/// A request to insert a new paragraph into a parent's reference field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRequest {
    pub parent: EntityKey,
    pub field: String,
    pub bundle: String,
    /// Paragraph next to which the new one is inserted; appended when absent.
    #[serde(default)]
    pub anchor: Option<u64>,
    /// Insert before the anchor instead of after it.
    #[serde(default)]
    pub before: bool,
}

/// The move/add engine. Host services arrive as explicit dependencies;
/// listeners on [`AccessEvents`] may override otherwise-allowed decisions.
pub struct ParagraphEditor {
    store: Arc<dyn EntityStore>,
    translations: Arc<dyn TranslationResolver>,
    access: Arc<dyn AccessHandler>,
    revisions: Arc<dyn RevisionPolicy>,
    events: AccessEvents,
}

impl ParagraphEditor {
    pub fn new(
        store: Arc<dyn EntityStore>,
        translations: Arc<dyn TranslationResolver>,
        access: Arc<dyn AccessHandler>,
        revisions: Arc<dyn RevisionPolicy>,
    ) -> Self {
        Self {
            store,
            translations,
            access,
            revisions,
            events: AccessEvents::new(),
        }
    }

    /// Registry for access listeners. Register before sharing the editor.
    pub fn events_mut(&mut self) -> &mut AccessEvents {
        &mut self.events
    }

    /// Whether `paragraph` may be moved one position in `direction`.
    ///
    /// Checks run in order and short-circuit on the first failure; the final
    /// decision comes from the move access event, seeded allowed.
    pub fn allow_move(
        &self,
        ctx: &EditContext<'_>,
        paragraph: &Entity,
        direction: Direction,
    ) -> AccessDecision {
        if !ctx.account.has_permission(PERM_MOVE_PARAGRAPHS) {
            return AccessDecision::forbidden_with_reason(
                "User does not have permission to move paragraphs.",
            );
        }
        if paragraph.is_new {
            return AccessDecision::forbidden();
        }
        let Some(lineage) = paragraph.lineage.clone() else {
            return AccessDecision::forbidden();
        };
        // Storage failures on the parent lookup read as forbidden, matching
        // the not-found case; the caller renders a message either way.
        let parent = match self.store.load(&lineage.parent) {
            Ok(Some(parent)) => parent,
            _ => return AccessDecision::forbidden(),
        };
        // The paragraph may not be translated yet, so resolve the parent for
        // the request language and run the access check on that translation.
        let parent = self
            .translations
            .translation_from_context(parent, ctx.langcode);
        if !self
            .access
            .entity_access(&parent, EntityOp::Update, ctx.account)
        {
            return AccessDecision::forbidden();
        }
        let Some(refs) = parent
            .paragraph_refs(&lineage.field)
            .filter(|refs| !refs.is_empty())
        else {
            return AccessDecision::forbidden();
        };
        // Reordering a non-translatable reference field from a non-default
        // translation would desynchronize the order across translations.
        if parent.translatable
            && !parent.default_translation
            && !self.field_is_translatable(&parent, &lineage.field)
        {
            return AccessDecision::forbidden();
        }
        let boundary = match direction {
            Direction::Up => refs.first(),
            Direction::Down => refs.last(),
        };
        if boundary.map(|item| item.target_id) == Some(paragraph.key.id) {
            return AccessDecision::forbidden();
        }
        self.events.dispatch_move(paragraph, direction)
    }

    /// Move `paragraph` one position in `direction` and persist the parent.
    ///
    /// A rejected access decision or a missing parent reports as
    /// [`MoveOutcome::Rejected`] without mutation; persistence failures
    /// propagate as errors.
    pub fn move_paragraph(
        &self,
        ctx: &EditContext<'_>,
        paragraph: &Entity,
        direction: Direction,
    ) -> Result<MoveOutcome, EditorError> {
        let decision = self.allow_move(ctx, paragraph, direction);
        if !decision.is_allowed() {
            return Ok(MoveOutcome::Rejected(decision));
        }
        let Some(lineage) = paragraph.lineage.clone() else {
            return Err(EditorError::MissingLineage(paragraph.key.clone()));
        };
        let Some(mut parent) = self.store.load(&lineage.parent)? else {
            return Ok(MoveOutcome::Rejected(AccessDecision::forbidden()));
        };
        let mut refs = parent.paragraph_refs(&lineage.field).unwrap_or(&[]).to_vec();
        reorder::shift(&mut refs, paragraph.key.id, direction);
        parent.set_paragraph_refs(&lineage.field, refs);
        // The revision question is asked of the top of the hierarchy, but it
        // is the immediate parent that gets persisted.
        let root = self.root_parent(paragraph)?;
        let new_revision = self.revisions.should_create_new_revision(&root);
        self.store.save(&parent, new_revision)?;
        tracing::debug!(paragraph = %paragraph.key, %direction, new_revision, "moved paragraph");
        Ok(MoveOutcome::Moved)
    }

    /// Whether a paragraph (optionally of `bundle`) may be added to the
    /// named field of `parent_key`.
    pub fn allow_add(
        &self,
        ctx: &EditContext<'_>,
        parent_key: &EntityKey,
        field: &str,
        bundle: Option<&str>,
    ) -> AccessDecision {
        if !ctx.account.has_permission(PERM_ADD_PARAGRAPHS) {
            return AccessDecision::forbidden_with_reason(
                "User does not have permission to add paragraphs.",
            );
        }
        let parent = match self.store.load(parent_key) {
            Ok(Some(parent)) => parent,
            _ => return AccessDecision::forbidden(),
        };
        let parent = self
            .translations
            .translation_from_context(parent, ctx.langcode);
        if !self
            .access
            .entity_access(&parent, EntityOp::Update, ctx.account)
            || !parent.has_field(field)
        {
            return AccessDecision::forbidden();
        }
        let Some(definition) = self.store.field_definition(&parent, field) else {
            return AccessDecision::forbidden();
        };
        if parent.translatable && !parent.default_translation && !definition.translatable {
            return AccessDecision::forbidden_with_reason(
                "The parent entity paragraph field is not translatable.",
            );
        }
        let count = parent.paragraph_refs(field).map(<[_]>::len).unwrap_or(0);
        if !definition.cardinality.accepts_more(count) {
            return AccessDecision::forbidden_with_reason(
                "The parent entity paragraph field has reached its maximum cardinality.",
            );
        }
        if let Some(bundle) = bundle {
            if !definition.allows_bundle(bundle) {
                return AccessDecision::forbidden();
            }
        }
        self.events.dispatch_add(&parent, field, bundle)
    }

    /// Create a paragraph and insert its reference into the parent's ordered
    /// sequence, before/after the anchor or appended, then persist.
    pub fn add_paragraph(
        &self,
        ctx: &EditContext<'_>,
        request: &AddRequest,
    ) -> Result<AddOutcome, EditorError> {
        let decision = self.allow_add(ctx, &request.parent, &request.field, Some(&request.bundle));
        if !decision.is_allowed() {
            return Ok(AddOutcome::Rejected(decision));
        }
        let Some(mut parent) = self.store.load(&request.parent)? else {
            return Ok(AddOutcome::Rejected(AccessDecision::forbidden()));
        };
        let child = self
            .store
            .create_paragraph(&request.bundle, &request.parent, &request.field)?;
        let mut refs = parent
            .paragraph_refs(&request.field)
            .unwrap_or(&[])
            .to_vec();
        let new_ref = ParagraphRef::new(child.key.id, child.revision_id);
        let anchor_position = request
            .anchor
            .and_then(|anchor| refs.iter().position(|item| item.target_id == anchor));
        match anchor_position {
            Some(delta) if request.before => refs.insert(delta, new_ref),
            Some(delta) => refs.insert(delta + 1, new_ref),
            // No anchor, or a stale one: append.
            None => refs.push(new_ref),
        }
        parent.set_paragraph_refs(&request.field, refs);
        let root = if parent.is_paragraph() {
            self.root_parent(&parent)?
        } else {
            parent.clone()
        };
        let new_revision = self.revisions.should_create_new_revision(&root);
        self.store.save(&parent, new_revision)?;
        tracing::debug!(
            paragraph = %child.key,
            parent = %request.parent,
            field = %request.field,
            "added paragraph"
        );
        Ok(AddOutcome::Added(child))
    }

    /// Whether `entity` may be deleted by the acting user.
    pub fn allow_delete(&self, ctx: &EditContext<'_>, entity: &Entity) -> AccessDecision {
        // An unsaved entity has nothing persisted to protect.
        if !entity.is_new
            && !self
                .access
                .entity_access(entity, EntityOp::Delete, ctx.account)
        {
            return AccessDecision::forbidden();
        }
        // Deleting a paragraph out of a non-translatable field from a
        // non-default translation would delete it for every translation.
        if let Some(lineage) = &entity.lineage {
            let parent = match self.store.load(&lineage.parent) {
                Ok(Some(parent)) => parent,
                _ => return AccessDecision::forbidden(),
            };
            let parent = self
                .translations
                .translation_from_context(parent, ctx.langcode);
            if parent.translatable
                && !parent.default_translation
                && !self.field_is_translatable(&parent, &lineage.field)
            {
                return AccessDecision::forbidden_with_reason(
                    "The parent entity paragraph field is not translatable.",
                );
            }
        }
        AccessDecision::allowed()
    }

    /// Whether the actor may fetch re-rendered content for a field. The
    /// decision carries its cache dependencies so callers can memoize it.
    pub fn allow_update_content(
        &self,
        ctx: &EditContext<'_>,
        key: &EntityKey,
        field: &str,
    ) -> AccessDecision {
        let decision = match self.store.load(key) {
            Ok(Some(entity)) => {
                if !self
                    .access
                    .entity_access(&entity, EntityOp::View, ctx.account)
                {
                    AccessDecision::forbidden_with_reason("You are not allowed to view this entity.")
                } else if !entity.has_field(field) {
                    AccessDecision::forbidden_with_reason(format!("Entity has no field {}.", field))
                } else if !self
                    .access
                    .field_access(&entity, field, EntityOp::View, ctx.account)
                {
                    AccessDecision::forbidden_with_reason(format!(
                        "You are not allowed to view field {}.",
                        field
                    ))
                } else {
                    AccessDecision::allowed()
                }
            }
            _ => AccessDecision::forbidden_with_reason("Entity does not exist."),
        };
        decision.with_entity_dependency(key.clone()).per_permissions()
    }

    /// Top-most ancestor of an entity, walking parent references. Bounded by
    /// [`MAX_LINEAGE_DEPTH`] so malformed parent chains fail instead of
    /// looping.
    pub fn root_parent(&self, entity: &Entity) -> Result<Entity, EditorError> {
        let mut current = entity.clone();
        for _ in 0..MAX_LINEAGE_DEPTH {
            let Some(lineage) = current.lineage.clone() else {
                return Ok(current);
            };
            current = self
                .store
                .load(&lineage.parent)?
                .ok_or(StoreError::NotFound(lineage.parent))?;
        }
        Err(EditorError::LineageTooDeep {
            key: entity.key.clone(),
            limit: MAX_LINEAGE_DEPTH,
        })
    }

    /// Page editors land on after a non-AJAX operation: the lineage root's
    /// canonical path.
    pub fn redirect_target(&self, paragraph: &Entity) -> Result<String, EditorError> {
        let root = self.root_parent(paragraph)?;
        Ok(format!("/content/{}/{}", root.key.entity_type, root.key.id))
    }

    fn field_is_translatable(&self, parent: &Entity, field: &str) -> bool {
        self.store
            .field_definition(parent, field)
            .map(|definition| definition.translatable)
            .unwrap_or(false)
    }
}
