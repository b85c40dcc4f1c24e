//! # Content Entities
//!
//! A parent entity owns an ordered sequence of references to paragraph
//! entities through a named field. The order of that sequence is the display
//! order. Paragraphs carry their lineage (parent key + referencing field
//! name) so the engine can walk back to the top-level host entity.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Entity type id used for paragraph entities.
pub const PARAGRAPH_ENTITY_TYPE: &str = "paragraph";

/// Identifies a stored entity: (entity type, id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub entity_type: String,
    pub id: u64,
}

impl EntityKey {
    pub fn new(entity_type: impl Into<String>, id: u64) -> Self {
        Self {
            entity_type: entity_type.into(),
            id,
        }
    }

    /// Key for a paragraph entity.
    pub fn paragraph(id: u64) -> Self {
        Self::new(PARAGRAPH_ENTITY_TYPE, id)
    }

    pub fn is_paragraph(&self) -> bool {
        self.entity_type == PARAGRAPH_ENTITY_TYPE
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.id)
    }
}

/// One item of an ordered paragraph reference field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphRef {
    pub target_id: u64,
    pub target_revision_id: u64,
}

impl ParagraphRef {
    pub fn new(target_id: u64, target_revision_id: u64) -> Self {
        Self {
            target_id,
            target_revision_id,
        }
    }
}

/// Back-reference from a paragraph to the entity and field referencing it.
///
/// A paragraph has exactly one current parent/field pair at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineage {
    pub parent: EntityKey,
    pub field: String,
}

impl Lineage {
    pub fn new(parent: EntityKey, field: impl Into<String>) -> Self {
        Self {
            parent,
            field: field.into(),
        }
    }
}

/// Value held by a named entity field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Plain text content.
    Text(String),
    /// Ordered sequence of paragraph references. Insertion order is the
    /// display order; the sequence holds no duplicate target.
    Paragraphs(Vec<ParagraphRef>),
}

/// A content entity: a host entity (node, block, ...) or a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub key: EntityKey,
    /// Subtype within the entity type (e.g. `blog_post`, `text_block`).
    pub bundle: String,
    pub langcode: String,
    pub default_translation: bool,
    pub translatable: bool,
    pub revision_id: u64,
    /// True until the entity has been persisted for the first time.
    pub is_new: bool,
    /// Set on paragraphs; `None` on top-level entities.
    pub lineage: Option<Lineage>,
    fields: BTreeMap<String, FieldValue>,
}

impl Entity {
    pub fn new(key: EntityKey, bundle: impl Into<String>) -> Self {
        Self {
            key,
            bundle: bundle.into(),
            langcode: "en".to_string(),
            default_translation: true,
            translatable: false,
            revision_id: 0,
            is_new: true,
            lineage: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_langcode(mut self, langcode: impl Into<String>) -> Self {
        self.langcode = langcode.into();
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn with_lineage(mut self, lineage: Lineage) -> Self {
        self.lineage = Some(lineage);
        self
    }

    pub fn translatable(mut self, translatable: bool) -> Self {
        self.translatable = translatable;
        self
    }

    pub fn is_paragraph(&self) -> bool {
        self.key.is_paragraph()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Ordered paragraph references of a field, when it is a paragraph field.
    pub fn paragraph_refs(&self, name: &str) -> Option<&[ParagraphRef]> {
        match self.fields.get(name) {
            Some(FieldValue::Paragraphs(refs)) => Some(refs),
            _ => None,
        }
    }

    /// Replace the ordered reference sequence of a paragraph field.
    pub fn set_paragraph_refs(&mut self, name: impl Into<String>, refs: Vec<ParagraphRef>) {
        self.fields.insert(name.into(), FieldValue::Paragraphs(refs));
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.fields.insert(name.into(), FieldValue::Text(text.into()));
    }

    /// Field name on the parent referencing this paragraph.
    pub fn parent_field_name(&self) -> Option<&str> {
        self.lineage.as_ref().map(|l| l.field.as_str())
    }
}
