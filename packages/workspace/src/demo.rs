//! Demo content for the development server and the handler tests.

use stanza_model::{
    Entity, EntityKey, EntityStore, FieldDefinition, FieldValue, Lineage, MemoryHost, ParagraphRef,
};

pub const FIELD: &str = "field_content";

/// Seed a node with three text paragraphs. Returns the node's key.
pub fn seed(host: &MemoryHost) -> EntityKey {
    host.register_entity_type("node", true);
    host.define_field(
        "node",
        FieldDefinition::new(FIELD).with_target_bundles(["text_block", "gallery"]),
    );

    let node = host.insert(
        Entity::new(EntityKey::new("node", 1), "page")
            .with_field("title", FieldValue::Text("Demo page".to_string())),
    );

    let mut refs = Vec::new();
    for (id, text) in [(1, "First paragraph"), (2, "Second paragraph"), (3, "Third paragraph")] {
        let paragraph = host.insert(
            Entity::new(EntityKey::paragraph(id), "text_block")
                .with_lineage(Lineage::new(node.key.clone(), FIELD))
                .with_field("field_text", FieldValue::Text(text.to_string())),
        );
        refs.push(ParagraphRef::new(id, paragraph.revision_id));
    }

    let mut node = host.entity(&node.key).unwrap();
    node.set_paragraph_refs(FIELD, refs);
    host.save(&node, false).unwrap().key
}
