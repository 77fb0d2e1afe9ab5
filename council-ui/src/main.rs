//! Council UI server - HTTP front end and live-update stream for the council.

mod routes;
mod sse;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use axum::routing::get;
use clap::Parser;
use council::io::config::load_config;
use council::io::path::{config_path_for, resolve_state_path};
use council::io::store::FileStateStore;
use council::service::CouncilService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "council-ui")]
#[command(about = "HTTP API and live updates for the agents council")]
struct Args {
    /// Address to bind the server to (defaults to [ui].bind in config.toml)
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on (defaults to [ui].port in config.toml)
    #[arg(long)]
    port: Option<u16>,

    /// State file (defaults to $AGENTS_COUNCIL_STATE_PATH, then ~/.agents-council/state.json)
    #[arg(long)]
    state_path: Option<String>,

    /// Directory of static UI files to serve at the root
    #[arg(long)]
    ui_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("council_ui=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let state_path = resolve_state_path(args.state_path.as_deref())?;
    let config = load_config(&config_path_for(&state_path))?;
    info!(state_path = %state_path.display(), "starting council-ui");

    let store = FileStateStore::new(state_path).with_lock_options(config.lock_options());
    let state = AppState::new(CouncilService::new(store));

    // Dropping the watcher stops it; keep it for the life of the server.
    let _watcher = sse::start_state_watcher(&state, &config.watch_options())?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .merge(routes::council_router())
        .nest("/api", routes::api_router())
        .route("/events", get(sse::events_handler))
        .layer(cors)
        .with_state(state);

    if let Some(ui_dir) = args.ui_dir {
        if ui_dir.exists() {
            info!(ui_dir = %ui_dir.display(), "serving static UI files");
            app = app
                .fallback_service(ServeDir::new(ui_dir).append_index_html_on_directories(true));
        } else {
            info!(ui_dir = %ui_dir.display(), "UI directory not found, API-only mode");
        }
    }

    let bind = args.bind.unwrap_or(config.ui.bind);
    let port = args.port.unwrap_or(config.ui.port);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
