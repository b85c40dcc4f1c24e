use anyhow::Context;
use stanza_editor::ParagraphEditor;
use stanza_model::{MemoryHost, StaticAccount};
use stanza_workspace::{demo, router, AppState, Settings};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let mut port: u16 = 3030;
    let mut settings_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    port = args[i + 1].parse().context("invalid --port value")?;
                    i += 1;
                }
            }
            "--settings" | "-s" => {
                if i + 1 < args.len() {
                    settings_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            other => {
                tracing::warn!("ignoring unknown argument: {}", other);
            }
        }
        i += 1;
    }

    let settings = match &settings_path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    let host = Arc::new(MemoryHost::new());
    let node = demo::seed(&host);
    tracing::info!(node = %node, "seeded demo content");

    let editor = ParagraphEditor::new(host.clone(), host.clone(), host.clone(), host.clone());
    let state = AppState {
        store: host.clone(),
        renderer: host.clone(),
        editor: Arc::new(editor),
        account: Arc::new(StaticAccount::editor(1)),
        settings: Arc::new(settings),
    };

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("stanza panel service listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
