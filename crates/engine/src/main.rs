//! Plaza Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plaza_engine::api::{self, websocket::WsState};
use plaza_engine::infrastructure::config::EngineConfig;
use plaza_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine may be started from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plaza_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Plaza Engine");

    let config = EngineConfig::from_env();
    let backend = if config.redis_url.is_some() { "redis" } else { "in-process" };
    tracing::info!(
        welcome_room = %config.welcome_room_id(),
        ws_connection_limit = ?config.ws_connection_limit,
        store_timeout_ms = config.store_timeout.as_millis() as u64,
        move_step_delay_ms = config.move_step_delay.as_millis() as u64,
        backend,
        "Configuration loaded"
    );

    // An unreachable shared backend is fatal
    let app = Arc::new(App::connect(config).await?);

    // Without the welcome room there is nothing to join; refuse to start
    app.init().await?;

    let ws_state = Arc::new(WsState::new(app.clone()));
    let router = api::router(ws_state);

    let addr = app.config.bind_address();
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let Some(repo_root) = manifest_dir.parent().and_then(|p| p.parent()) else {
        return;
    };

    for name in [".env.local", ".env"] {
        let path = repo_root.join(name);
        if path.exists() {
            if let Err(e) = dotenvy::from_path(&path) {
                eprintln!("Failed to load {}: {}", path.display(), e);
            }
        }
    }
}
