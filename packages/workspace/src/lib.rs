//! # Stanza Workspace
//!
//! HTTP surface for the editing panel: axum handlers that translate
//! requests into [`stanza_editor`] calls and answer with redirects or UI
//! command batches, plus panel-request detection and the UI settings.
//!
//! The `stanza-server` binary wires the service to the in-memory demo host;
//! a real deployment supplies its own host services.

pub mod commands;
pub mod demo;
pub mod panel;
pub mod server;
pub mod settings;

pub use commands::{field_selector, CommandBatch, MessageKind, UiCommand};
pub use panel::{is_ajax_request, is_panel_request};
pub use server::{router, AddPageItem, AppState};
pub use settings::{Settings, SettingsError};
