//! Move orchestration tests against the in-memory host.

use std::sync::Arc;

use stanza_editor::{AccessDecision, Direction, EditContext, EditorError, ParagraphEditor};
use stanza_model::{
    Entity, EntityKey, EntityStore, FieldDefinition, Lineage, MemoryHost, ParagraphRef,
    StaticAccount,
};

const FIELD: &str = "field_content";

/// Node 1 referencing paragraphs 1, 2, 3 in order.
fn build_fixture() -> (Arc<MemoryHost>, ParagraphEditor, EntityKey) {
    let host = Arc::new(MemoryHost::new());
    host.register_entity_type("node", true);
    host.define_field("node", FieldDefinition::new(FIELD));

    let node = host.insert(Entity::new(EntityKey::new("node", 1), "page"));
    let mut refs = Vec::new();
    for id in 1..=3 {
        let paragraph = host.insert(
            Entity::new(EntityKey::paragraph(id), "text_block")
                .with_lineage(Lineage::new(node.key.clone(), FIELD)),
        );
        refs.push(ParagraphRef::new(id, paragraph.revision_id));
    }
    let mut node = host.entity(&node.key).unwrap();
    node.set_paragraph_refs(FIELD, refs);
    let node = host.save(&node, false).unwrap();

    let editor = ParagraphEditor::new(host.clone(), host.clone(), host.clone(), host.clone());
    (host, editor, node.key)
}

fn order(host: &MemoryHost, node: &EntityKey) -> Vec<u64> {
    host.entity(node)
        .unwrap()
        .paragraph_refs(FIELD)
        .unwrap()
        .iter()
        .map(|item| item.target_id)
        .collect()
}

fn paragraph(host: &MemoryHost, id: u64) -> Entity {
    host.entity(&EntityKey::paragraph(id)).unwrap()
}

#[test]
fn move_middle_paragraph_up() {
    let (host, editor, node) = build_fixture();
    let account = StaticAccount::editor(1);
    let ctx = EditContext::new(&account, "en");

    let outcome = editor
        .move_paragraph(&ctx, &paragraph(&host, 2), Direction::Up)
        .unwrap();
    assert!(outcome.moved());
    assert_eq!(order(&host, &node), vec![2, 1, 3]);
}

#[test]
fn boundary_moves_are_rejected() {
    let (host, editor, node) = build_fixture();
    let account = StaticAccount::editor(1);
    let ctx = EditContext::new(&account, "en");

    let first_up = editor
        .move_paragraph(&ctx, &paragraph(&host, 1), Direction::Up)
        .unwrap();
    assert!(!first_up.moved());

    let last_down = editor
        .move_paragraph(&ctx, &paragraph(&host, 3), Direction::Down)
        .unwrap();
    assert!(!last_down.moved());

    assert_eq!(order(&host, &node), vec![1, 2, 3]);
}

#[test]
fn down_then_up_round_trips() {
    let (host, editor, node) = build_fixture();
    let account = StaticAccount::editor(1);
    let ctx = EditContext::new(&account, "en");

    assert!(editor
        .move_paragraph(&ctx, &paragraph(&host, 1), Direction::Down)
        .unwrap()
        .moved());
    assert!(editor
        .move_paragraph(&ctx, &paragraph(&host, 1), Direction::Up)
        .unwrap()
        .moved());
    assert_eq!(order(&host, &node), vec![1, 2, 3]);
}

#[test]
fn missing_capability_forbids_regardless_of_state() {
    let (host, editor, node) = build_fixture();
    let account = StaticAccount::new(2, ["update node", "view node"]);
    let ctx = EditContext::new(&account, "en");

    let decision = editor.allow_move(&ctx, &paragraph(&host, 2), Direction::Up);
    assert!(!decision.is_allowed());
    assert_eq!(
        decision.reason(),
        Some("User does not have permission to move paragraphs.")
    );
    assert_eq!(order(&host, &node), vec![1, 2, 3]);
}

#[test]
fn unsaved_paragraph_cannot_be_moved() {
    let (_host, editor, node) = build_fixture();
    let account = StaticAccount::editor(1);
    let ctx = EditContext::new(&account, "en");

    let unsaved = Entity::new(EntityKey::paragraph(99), "text_block")
        .with_lineage(Lineage::new(node, FIELD));
    assert!(!editor.allow_move(&ctx, &unsaved, Direction::Down).is_allowed());
}

#[test]
fn non_default_translation_with_untranslatable_field_is_forbidden() {
    let (host, editor, node) = build_fixture();
    let account = StaticAccount::editor(1);

    let mut default = host.entity(&node).unwrap();
    default.translatable = true;
    host.save(&default, false).unwrap();

    let mut translation = default.clone();
    translation.langcode = "de".to_string();
    translation.default_translation = false;
    host.save(&translation, false).unwrap();

    let ctx = EditContext::new(&account, "de");
    assert!(!editor
        .allow_move(&ctx, &paragraph(&host, 2), Direction::Up)
        .is_allowed());

    // The default translation stays editable.
    let ctx = EditContext::new(&account, "en");
    assert!(editor
        .allow_move(&ctx, &paragraph(&host, 2), Direction::Up)
        .is_allowed());
}

#[test]
fn listeners_can_veto_an_allowed_move() {
    let (host, mut editor, _node) = build_fixture();
    editor.events_mut().on_move(|event: &mut stanza_editor::MoveAccessEvent<'_>| {
        event.set_decision(AccessDecision::forbidden_with_reason("frozen section"));
    });
    let account = StaticAccount::editor(1);
    let ctx = EditContext::new(&account, "en");

    let outcome = editor
        .move_paragraph(&ctx, &paragraph(&host, 2), Direction::Up)
        .unwrap();
    match outcome {
        stanza_editor::MoveOutcome::Rejected(decision) => {
            assert_eq!(decision.reason(), Some("frozen section"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[test]
fn revisionable_parent_gets_a_new_revision_on_move() {
    let (host, editor, node) = build_fixture();
    let account = StaticAccount::editor(1);
    let ctx = EditContext::new(&account, "en");

    let before = host.entity(&node).unwrap().revision_id;
    editor
        .move_paragraph(&ctx, &paragraph(&host, 2), Direction::Down)
        .unwrap();
    assert!(host.entity(&node).unwrap().revision_id > before);
}

#[test]
fn non_revisionable_parent_is_saved_in_place() {
    let host = Arc::new(MemoryHost::new());
    host.register_entity_type("block", false);
    host.define_field("block", FieldDefinition::new(FIELD));
    let block = host.insert(Entity::new(EntityKey::new("block", 1), "sidebar"));
    let mut refs = Vec::new();
    for id in 1..=2 {
        let paragraph = host.insert(
            Entity::new(EntityKey::paragraph(id), "text_block")
                .with_lineage(Lineage::new(block.key.clone(), FIELD)),
        );
        refs.push(ParagraphRef::new(id, paragraph.revision_id));
    }
    let mut block = host.entity(&block.key).unwrap();
    block.set_paragraph_refs(FIELD, refs);
    let block = host.save(&block, false).unwrap();

    let editor = ParagraphEditor::new(host.clone(), host.clone(), host.clone(), host.clone());
    let account = StaticAccount::new(
        1,
        ["move paragraphs", "update block", "view block"],
    );
    let ctx = EditContext::new(&account, "en");

    let before = block.revision_id;
    let outcome = editor
        .move_paragraph(&ctx, &host.entity(&EntityKey::paragraph(1)).unwrap(), Direction::Down)
        .unwrap();
    assert!(outcome.moved());
    assert_eq!(host.entity(&block.key).unwrap().revision_id, before);
}

#[test]
fn cyclic_lineage_trips_the_depth_guard() {
    let (host, editor, _node) = build_fixture();
    let first = host.insert(
        Entity::new(EntityKey::paragraph(50), "text_block")
            .with_lineage(Lineage::new(EntityKey::paragraph(51), FIELD)),
    );
    host.insert(
        Entity::new(EntityKey::paragraph(51), "text_block")
            .with_lineage(Lineage::new(EntityKey::paragraph(50), FIELD)),
    );

    match editor.root_parent(&first) {
        Err(EditorError::LineageTooDeep { .. }) => {}
        other => panic!("expected depth guard, got {:?}", other),
    }
}

#[test]
fn delete_needs_the_delete_capability() {
    let (host, editor, _node) = build_fixture();

    let account = StaticAccount::editor(1);
    let ctx = EditContext::new(&account, "en");
    assert!(editor.allow_delete(&ctx, &paragraph(&host, 2)).is_allowed());

    let account = StaticAccount::new(2, ["update node", "view node"]);
    let ctx = EditContext::new(&account, "en");
    assert!(!editor.allow_delete(&ctx, &paragraph(&host, 2)).is_allowed());
}

#[test]
fn delete_is_forbidden_on_untranslatable_fields_of_translations() {
    let (host, editor, node) = build_fixture();
    let account = StaticAccount::editor(1);

    let mut default = host.entity(&node).unwrap();
    default.translatable = true;
    host.save(&default, false).unwrap();
    let mut translation = default.clone();
    translation.langcode = "de".to_string();
    translation.default_translation = false;
    host.save(&translation, false).unwrap();

    let ctx = EditContext::new(&account, "de");
    let decision = editor.allow_delete(&ctx, &paragraph(&host, 2));
    assert!(!decision.is_allowed());
    assert_eq!(
        decision.reason(),
        Some("The parent entity paragraph field is not translatable.")
    );
}

#[test]
fn redirect_targets_the_lineage_root() {
    let (host, editor, _node) = build_fixture();
    assert_eq!(
        editor.redirect_target(&paragraph(&host, 2)).unwrap(),
        "/content/node/1"
    );
}
