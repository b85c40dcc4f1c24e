//! # UI Commands
//!
//! Responses to AJAX requests from the editing panel are small lists of
//! commands the client-side script executes: replace rendered HTML at a
//! selector, show a message, close the side panel, reload, scroll. The wire
//! format is a tagged JSON object per command.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use stanza_model::EntityKey;

/// Severity of a [`UiCommand::Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Status,
    Warning,
    Error,
}

/// One instruction for the editing panel client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum UiCommand {
    /// Replace the HTML inside the element matching `selector`.
    #[serde(rename = "replaceContent")]
    ReplaceContent { selector: String, html: String },

    /// Show a message to the editor.
    #[serde(rename = "message")]
    Message { text: String, kind: MessageKind },

    /// Close the side panel, optionally updating a host entity field first.
    #[serde(rename = "closeSidePanel")]
    CloseSidePanel {
        selector: Option<String>,
        entity_type: Option<String>,
        entity_id: Option<u64>,
        field_name: Option<String>,
    },

    /// Reload the whole window.
    #[serde(rename = "reloadWindow")]
    ReloadWindow,

    /// Scroll the element matching `selector` into view.
    #[serde(rename = "scrollTop")]
    ScrollTop { selector: String },
}

impl UiCommand {
    pub fn error(text: impl Into<String>) -> Self {
        UiCommand::Message {
            text: text.into(),
            kind: MessageKind::Error,
        }
    }

    /// Close the panel and refresh the field that was being edited.
    pub fn close_panel_for(key: &EntityKey, field: &str) -> Self {
        UiCommand::CloseSidePanel {
            selector: Some(field_selector(key, field)),
            entity_type: Some(key.entity_type.clone()),
            entity_id: Some(key.id),
            field_name: Some(field.to_string()),
        }
    }
}

/// Selector the panel markup places around every editable field.
pub fn field_selector(key: &EntityKey, field: &str) -> String {
    format!(
        "[data-stanza-field=\"{}--{}--{}\"]",
        key.entity_type, key.id, field
    )
}

/// A batch of commands returned to one AJAX request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandBatch {
    pub commands: Vec<UiCommand>,
    pub timestamp: i64,
}

impl CommandBatch {
    pub fn new(commands: Vec<UiCommand>) -> Self {
        Self {
            commands,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}
