//! # Editing Panel HTTP Surface
//!
//! Thin adapters between HTTP and the editing engine: handlers translate
//! requests into editor calls and render the results as redirects (plain
//! requests) or [`CommandBatch`] JSON (panel AJAX requests). No business
//! rule lives here.

use crate::commands::{field_selector, CommandBatch, MessageKind, UiCommand};
use crate::panel::is_ajax_request;
use crate::settings::Settings;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use stanza_editor::{AddOutcome, AddRequest, Direction, EditContext, ParagraphEditor};
use stanza_model::{
    Account, Entity, EntityKey, EntityStore, FieldRenderer, PARAGRAPH_ENTITY_TYPE,
};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared state of the panel service.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub renderer: Arc<dyn FieldRenderer>,
    pub editor: Arc<ParagraphEditor>,
    /// The session's actor. A real deployment resolves this per request.
    pub account: Arc<dyn Account>,
    pub settings: Arc<Settings>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/paragraph/:id/up", post(move_up))
        .route("/paragraph/:id/down", post(move_down))
        .route("/paragraph/add/:parent_type/:parent/:field", get(add_page))
        .route(
            "/paragraph/add/:parent_type/:parent/:field/:bundle",
            post(add_paragraph),
        )
        .route(
            "/content/:entity_type/:id/:field/:view_mode",
            get(update_content),
        )
        .route("/settings", get(ui_settings))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

fn langcode(query: &HashMap<String, String>) -> &str {
    query.get("lang").map(String::as_str).unwrap_or("en")
}

async fn move_up(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    apply_move(state, id, Direction::Up, query)
}

async fn move_down(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    apply_move(state, id, Direction::Down, query)
}

fn apply_move(
    state: AppState,
    id: u64,
    direction: Direction,
    query: HashMap<String, String>,
) -> Response {
    let key = EntityKey::paragraph(id);
    let paragraph = match state.store.load(&key) {
        Ok(Some(paragraph)) => paragraph,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(error) => {
            tracing::error!(%error, paragraph = %key, "failed to load paragraph");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let lang = langcode(&query).to_string();
    let ctx = EditContext::new(state.account.as_ref(), &lang);
    let moved = match state.editor.move_paragraph(&ctx, &paragraph, direction) {
        Ok(outcome) => outcome.moved(),
        Err(error) => {
            tracing::error!(%error, paragraph = %key, "move failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let message = (!moved).then(|| format!("The paragraph could not be moved {}.", direction));
    if is_ajax_request(&query) {
        return Json(refresh_parent_field(&state, &paragraph, message)).into_response();
    }
    match state.editor.redirect_target(&paragraph) {
        Ok(target) => Redirect::to(&target).into_response(),
        Err(_) => Redirect::to("/").into_response(),
    }
}

/// Re-render the field that references `paragraph`, with an optional error
/// message in front.
fn refresh_parent_field(
    state: &AppState,
    paragraph: &Entity,
    message: Option<String>,
) -> CommandBatch {
    let mut commands = Vec::new();
    if let Some(text) = message {
        commands.push(UiCommand::Message {
            text,
            kind: MessageKind::Error,
        });
    }
    if let Some(lineage) = &paragraph.lineage {
        if let Ok(Some(parent)) = state.store.load(&lineage.parent) {
            let html = state
                .renderer
                .render_field(&parent, &lineage.field, "default")
                .unwrap_or_default();
            commands.push(UiCommand::ReplaceContent {
                selector: field_selector(&lineage.parent, &lineage.field),
                html,
            });
        }
    }
    CommandBatch::new(commands)
}

/// One entry of the "add paragraph" chooser.
#[derive(Debug, Serialize)]
pub struct AddPageItem {
    pub bundle: String,
    pub url: String,
}

/// List the paragraph bundles that may be added to a field, as links to the
/// add endpoint. Anchor placement parameters pass through.
async fn add_page(
    State(state): State<AppState>,
    Path((parent_type, parent, field)): Path<(String, u64, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let key = EntityKey::new(parent_type, parent);
    let parent_entity = match state.store.load(&key) {
        Ok(Some(entity)) if entity.has_field(&field) => entity,
        Ok(_) => return (StatusCode::NOT_FOUND, "Parent entity not found.").into_response(),
        Err(error) => {
            tracing::error!(%error, parent = %key, "failed to load parent");
            return (StatusCode::NOT_FOUND, "Parent entity not found.").into_response();
        }
    };
    let bundles: Vec<String> = match state
        .store
        .field_definition(&parent_entity, &field)
        .and_then(|definition| definition.target_bundles)
    {
        Some(bundles) => bundles.into_iter().collect(),
        // Unrestricted field: offer every bundle enabled in the settings.
        None => state
            .settings
            .enabled_bundles
            .get(PARAGRAPH_ENTITY_TYPE)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default(),
    };
    let placement: Vec<String> = ["anchor", "before"]
        .iter()
        .filter_map(|name| {
            query
                .get(*name)
                .map(|value| format!("{}={}", name, value))
        })
        .collect();
    let items: Vec<AddPageItem> = bundles
        .into_iter()
        .map(|bundle| {
            let mut url = format!(
                "/paragraph/add/{}/{}/{}/{}",
                key.entity_type, key.id, field, bundle
            );
            if !placement.is_empty() {
                url = format!("{}?{}", url, placement.join("&"));
            }
            AddPageItem { bundle, url }
        })
        .collect();
    Json(items).into_response()
}

async fn add_paragraph(
    State(state): State<AppState>,
    Path((parent_type, parent, field, bundle)): Path<(String, u64, String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let key = EntityKey::new(parent_type, parent);
    let lang = langcode(&query).to_string();
    let ctx = EditContext::new(state.account.as_ref(), &lang);
    let request = AddRequest {
        parent: key.clone(),
        field: field.clone(),
        bundle,
        anchor: query.get("anchor").and_then(|raw| raw.parse().ok()),
        before: query
            .get("before")
            .map(|raw| raw == "1" || raw == "true")
            .unwrap_or(false),
    };
    match state.editor.add_paragraph(&ctx, &request) {
        Ok(AddOutcome::Added(paragraph)) => {
            if is_ajax_request(&query) {
                let mut commands = vec![UiCommand::close_panel_for(&key, &field)];
                if let Ok(Some(parent_entity)) = state.store.load(&key) {
                    let html = state
                        .renderer
                        .render_field(&parent_entity, &field, "default")
                        .unwrap_or_default();
                    commands.push(UiCommand::ReplaceContent {
                        selector: field_selector(&key, &field),
                        html,
                    });
                    commands.push(UiCommand::ScrollTop {
                        selector: format!("[data-stanza-paragraph=\"{}\"]", paragraph.key.id),
                    });
                }
                Json(CommandBatch::new(commands)).into_response()
            } else {
                match state.editor.redirect_target(&paragraph) {
                    Ok(target) => Redirect::to(&target).into_response(),
                    Err(_) => Redirect::to("/").into_response(),
                }
            }
        }
        Ok(AddOutcome::Rejected(decision)) => {
            let text = decision
                .reason()
                .unwrap_or("The paragraph could not be added.")
                .to_string();
            if is_ajax_request(&query) {
                Json(CommandBatch::new(vec![UiCommand::error(text)])).into_response()
            } else {
                (StatusCode::FORBIDDEN, text).into_response()
            }
        }
        Err(error) => {
            tracing::error!(%error, parent = %request.parent, "add failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Re-render a field and hand it back as a replace command. Only reachable
/// through the panel script; plain requests get a 404.
async fn update_content(
    State(state): State<AppState>,
    Path((entity_type, id, field, view_mode)): Path<(String, u64, String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !is_ajax_request(&query) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let key = EntityKey::new(entity_type, id);
    let lang = langcode(&query).to_string();
    let ctx = EditContext::new(state.account.as_ref(), &lang);
    let decision = state.editor.allow_update_content(&ctx, &key, &field);
    if !decision.is_allowed() {
        let text = decision
            .reason()
            .unwrap_or("Content could not be updated.")
            .to_string();
        // Errors reload the page instead of leaving stale markup behind.
        return Json(CommandBatch::new(vec![
            UiCommand::error(text),
            UiCommand::ReloadWindow,
        ]))
        .into_response();
    }
    let entity = match state.store.load(&key) {
        Ok(Some(entity)) => entity,
        _ => {
            return Json(CommandBatch::new(vec![
                UiCommand::error(format!("Entity {} was not found", key)),
                UiCommand::ReloadWindow,
            ]))
            .into_response();
        }
    };
    let html = state
        .renderer
        .render_field(&entity, &field, &view_mode)
        .unwrap_or_default();
    Json(CommandBatch::new(vec![UiCommand::ReplaceContent {
        selector: field_selector(&key, &field),
        html,
    }]))
    .into_response()
}

async fn ui_settings(State(state): State<AppState>) -> Json<Settings> {
    Json((*state.settings).clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use axum::body::Body;
    use axum::http::Request;
    use stanza_model::{MemoryHost, StaticAccount};
    use tower::ServiceExt;

    fn test_state() -> (Arc<MemoryHost>, AppState, EntityKey) {
        let host = Arc::new(MemoryHost::new());
        let node = demo::seed(&host);
        let editor = ParagraphEditor::new(host.clone(), host.clone(), host.clone(), host.clone());
        let state = AppState {
            store: host.clone(),
            renderer: host.clone(),
            editor: Arc::new(editor),
            account: Arc::new(StaticAccount::editor(1)),
            settings: Arc::new(Settings::default()),
        };
        (host, state, node)
    }

    fn order(host: &MemoryHost, node: &EntityKey) -> Vec<u64> {
        host.entity(node)
            .unwrap()
            .paragraph_refs(demo::FIELD)
            .unwrap()
            .iter()
            .map(|item| item.target_id)
            .collect()
    }

    async fn batch_from(response: Response) -> CommandBatch {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn ajax_move_returns_a_replace_command() {
        let (host, state, node) = test_state();
        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/paragraph/2/up?wrapper_format=stanza_ajax")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let batch = batch_from(response).await;
        assert!(matches!(
            batch.commands.as_slice(),
            [UiCommand::ReplaceContent { .. }]
        ));
        assert_eq!(order(&host, &node), vec![2, 1, 3]);
    }

    #[tokio::test]
    async fn rejected_ajax_move_carries_an_error_message() {
        let (host, state, node) = test_state();
        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/paragraph/1/up?wrapper_format=stanza_ajax")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let batch = batch_from(response).await;
        assert!(matches!(
            batch.commands.first(),
            Some(UiCommand::Message {
                kind: MessageKind::Error,
                ..
            })
        ));
        assert_eq!(order(&host, &node), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn plain_move_redirects_to_the_root_parent() {
        let (_host, state, _node) = test_state();
        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/paragraph/2/down")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            "/content/node/1"
        );
    }

    #[tokio::test]
    async fn missing_paragraph_is_a_404() {
        let (_host, state, _node) = test_state();
        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/paragraph/99/up")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn ajax_add_closes_the_panel_and_refreshes_the_field() {
        let (host, state, node) = test_state();
        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(
                        "/paragraph/add/node/1/field_content/text_block\
                         ?wrapper_format=stanza_ajax&anchor=2&before=1",
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let batch = batch_from(response).await;
        assert!(matches!(
            batch.commands.first(),
            Some(UiCommand::CloseSidePanel { .. })
        ));
        let ids = order(&host, &node);
        assert_eq!(ids.len(), 4);
        assert_eq!(ids[2], 2);
    }

    #[tokio::test]
    async fn update_content_requires_ajax() {
        let (_host, state, _node) = test_state();
        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/content/node/1/field_content/default")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_content_replaces_the_field_markup() {
        let (_host, state, _node) = test_state();
        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/content/node/1/field_content/default?wrapper_format=stanza_ajax")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let batch = batch_from(response).await;
        match batch.commands.first() {
            Some(UiCommand::ReplaceContent { selector, html }) => {
                assert_eq!(
                    selector,
                    "[data-stanza-field=\"node--1--field_content\"]"
                );
                assert!(html.contains("data-stanza-paragraph=\"1\""));
            }
            other => panic!("expected replace command, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_entity_reloads_the_window() {
        let (_host, state, _node) = test_state();
        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/content/node/99/field_content/default?wrapper_format=stanza_ajax")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let batch = batch_from(response).await;
        assert!(batch
            .commands
            .iter()
            .any(|command| matches!(command, UiCommand::ReloadWindow)));
    }
}
