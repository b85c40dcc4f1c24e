//! # In-Memory Host
//!
//! Implements every host contract over plain maps. This backs the engine's
//! tests and the demo server; it is a stand-in for the framework
//! collaborators, not a storage engine. Revisions are a monotonically
//! increasing counter plus a timestamped log.

use crate::entity::{Entity, EntityKey, PARAGRAPH_ENTITY_TYPE};
use crate::field::FieldDefinition;
use crate::host::{
    AccessHandler, Account, EntityOp, EntityStore, FieldRenderer, RevisionPolicy, StoreError,
    TranslationResolver,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

/// One persisted revision of an entity.
#[derive(Debug, Clone)]
pub struct RevisionRecord {
    pub key: EntityKey,
    pub revision_id: u64,
    pub created: DateTime<Utc>,
}

#[derive(Default)]
struct HostState {
    entity_types: BTreeSet<String>,
    /// All translations of an entity; the default translation first.
    entities: HashMap<EntityKey, Vec<Entity>>,
    /// Field definitions keyed by (entity type, field name).
    fields: HashMap<(String, String), FieldDefinition>,
    /// Entity types that keep revisions.
    revisionable: BTreeSet<String>,
    /// Fields hidden from viewing, keyed the same way as `fields`.
    hidden_fields: BTreeSet<(String, String)>,
    next_ids: HashMap<String, u64>,
    next_revision_id: u64,
    revision_log: Vec<RevisionRecord>,
}

/// In-memory implementation of the host contracts.
pub struct MemoryHost {
    state: RwLock<HostState>,
}

impl MemoryHost {
    pub fn new() -> Self {
        let host = Self {
            state: RwLock::new(HostState::default()),
        };
        host.register_entity_type(PARAGRAPH_ENTITY_TYPE, true);
        host
    }

    pub fn register_entity_type(&self, entity_type: &str, revisionable: bool) {
        let mut state = self.state.write().unwrap();
        state.entity_types.insert(entity_type.to_string());
        if revisionable {
            state.revisionable.insert(entity_type.to_string());
        }
    }

    pub fn define_field(&self, entity_type: &str, definition: FieldDefinition) {
        let mut state = self.state.write().unwrap();
        state
            .fields
            .insert((entity_type.to_string(), definition.name.clone()), definition);
    }

    /// Hide a field from viewing, regardless of entity-level access.
    pub fn restrict_field_view(&self, entity_type: &str, field: &str) {
        let mut state = self.state.write().unwrap();
        state
            .hidden_fields
            .insert((entity_type.to_string(), field.to_string()));
    }

    /// Seed an entity (or one of its translations). Assigns a revision id
    /// and clears the new flag.
    pub fn insert(&self, mut entity: Entity) -> Entity {
        let mut state = self.state.write().unwrap();
        state.entity_types.insert(entity.key.entity_type.clone());
        // Keep the id counter ahead of explicitly seeded ids.
        let next = state
            .next_ids
            .entry(entity.key.entity_type.clone())
            .or_insert(0);
        *next = (*next).max(entity.key.id);
        state.next_revision_id += 1;
        entity.revision_id = state.next_revision_id;
        entity.is_new = false;
        let key = entity.key.clone();
        let translations = state.entities.entry(key).or_default();
        if entity.default_translation {
            translations.insert(0, entity.clone());
        } else {
            translations.push(entity.clone());
        }
        entity
    }

    /// Direct read access for tests and the demo server.
    pub fn entity(&self, key: &EntityKey) -> Option<Entity> {
        let state = self.state.read().unwrap();
        state
            .entities
            .get(key)
            .and_then(|translations| translations.first())
            .cloned()
    }

    pub fn revision_log(&self) -> Vec<RevisionRecord> {
        self.state.read().unwrap().revision_log.clone()
    }

    fn next_id(state: &mut HostState, entity_type: &str) -> u64 {
        let next = state.next_ids.entry(entity_type.to_string()).or_insert(0);
        *next += 1;
        *next
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore for MemoryHost {
    fn load(&self, key: &EntityKey) -> Result<Option<Entity>, StoreError> {
        let state = self.state.read().unwrap();
        if !state.entity_types.contains(&key.entity_type) {
            return Err(StoreError::UnknownEntityType(key.entity_type.clone()));
        }
        Ok(state
            .entities
            .get(key)
            .and_then(|translations| translations.first())
            .cloned())
    }

    fn field_definition(&self, entity: &Entity, field: &str) -> Option<FieldDefinition> {
        let state = self.state.read().unwrap();
        state
            .fields
            .get(&(entity.key.entity_type.clone(), field.to_string()))
            .cloned()
    }

    fn save(&self, entity: &Entity, new_revision: bool) -> Result<Entity, StoreError> {
        let mut state = self.state.write().unwrap();
        let mut saved = entity.clone();
        saved.is_new = false;
        if new_revision || saved.revision_id == 0 {
            state.next_revision_id += 1;
            saved.revision_id = state.next_revision_id;
            state.revision_log.push(RevisionRecord {
                key: saved.key.clone(),
                revision_id: saved.revision_id,
                created: Utc::now(),
            });
        }
        let translations = state.entities.entry(saved.key.clone()).or_default();
        match translations
            .iter_mut()
            .find(|candidate| candidate.langcode == saved.langcode)
        {
            Some(slot) => *slot = saved.clone(),
            None => translations.push(saved.clone()),
        }
        Ok(saved)
    }

    fn create_paragraph(
        &self,
        bundle: &str,
        parent: &EntityKey,
        field: &str,
    ) -> Result<Entity, StoreError> {
        let mut state = self.state.write().unwrap();
        let id = Self::next_id(&mut state, PARAGRAPH_ENTITY_TYPE);
        state.next_revision_id += 1;
        let revision_id = state.next_revision_id;
        let mut paragraph = Entity::new(EntityKey::paragraph(id), bundle)
            .with_lineage(crate::entity::Lineage::new(parent.clone(), field));
        paragraph.revision_id = revision_id;
        paragraph.is_new = false;
        state.revision_log.push(RevisionRecord {
            key: paragraph.key.clone(),
            revision_id,
            created: Utc::now(),
        });
        state
            .entities
            .insert(paragraph.key.clone(), vec![paragraph.clone()]);
        Ok(paragraph)
    }
}

impl TranslationResolver for MemoryHost {
    fn translation_from_context(&self, entity: Entity, langcode: &str) -> Entity {
        if entity.langcode == langcode {
            return entity;
        }
        let state = self.state.read().unwrap();
        state
            .entities
            .get(&entity.key)
            .and_then(|translations| {
                translations
                    .iter()
                    .find(|candidate| candidate.langcode == langcode)
                    .cloned()
            })
            // Fall back to the source entity when no translation exists yet.
            .unwrap_or(entity)
    }
}

impl AccessHandler for MemoryHost {
    fn entity_access(&self, entity: &Entity, op: EntityOp, account: &dyn Account) -> bool {
        let verb = match op {
            EntityOp::View => "view",
            EntityOp::Update => "update",
            EntityOp::Delete => "delete",
        };
        account.has_permission(&format!("{} {}", verb, entity.key.entity_type))
    }

    fn field_access(
        &self,
        entity: &Entity,
        field: &str,
        op: EntityOp,
        account: &dyn Account,
    ) -> bool {
        if !self.entity_access(entity, op, account) {
            return false;
        }
        let state = self.state.read().unwrap();
        !state
            .hidden_fields
            .contains(&(entity.key.entity_type.clone(), field.to_string()))
    }
}

impl RevisionPolicy for MemoryHost {
    fn should_create_new_revision(&self, entity: &Entity) -> bool {
        let state = self.state.read().unwrap();
        state.revisionable.contains(&entity.key.entity_type)
    }
}

impl FieldRenderer for MemoryHost {
    fn render_field(&self, entity: &Entity, field: &str, _view_mode: &str) -> Option<String> {
        match entity.field(field)? {
            crate::entity::FieldValue::Text(text) => Some(format!("<p>{}</p>", text)),
            crate::entity::FieldValue::Paragraphs(refs) => {
                let mut html = String::new();
                for reference in refs {
                    let key = EntityKey::paragraph(reference.target_id);
                    let body = self
                        .entity(&key)
                        .map(|paragraph| {
                            paragraph
                                .text("field_text")
                                .unwrap_or(&paragraph.bundle)
                                .to_string()
                        })
                        .unwrap_or_default();
                    html.push_str(&format!(
                        "<div class=\"stanza-paragraph\" data-stanza-paragraph=\"{}\">{}</div>",
                        reference.target_id, body
                    ));
                }
                Some(html)
            }
        }
    }
}
