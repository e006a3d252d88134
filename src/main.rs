use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use reconcile::config::AppConfig;
use reconcile::db;
use reconcile::handlers;
use reconcile::services::orchestrator::CorrectionOrchestrator;
use reconcile::services::scheduling::http::HttpSchedulingClient;
use reconcile::services::scheduling::SchedulingSystem;
use reconcile::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let db = Arc::new(Mutex::new(conn));

    anyhow::ensure!(
        !config.scheduling_api_key.is_empty(),
        "SCHEDULING_API_KEY must be set"
    );
    tracing::info!("using scheduling API at {}", config.scheduling_base_url);

    let scheduling: Arc<dyn SchedulingSystem> = Arc::new(HttpSchedulingClient::new(
        config.scheduling_base_url.clone(),
        config.scheduling_api_key.clone(),
    ));

    let orchestrator = CorrectionOrchestrator::new(Arc::clone(&scheduling), Arc::clone(&db));

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        scheduling,
        orchestrator,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/reconcile", post(handlers::reconcile::reconcile))
        .route("/api/slots", get(handlers::slots::get_slots))
        .route(
            "/api/corrections/propose",
            post(handlers::corrections::propose),
        )
        .route(
            "/api/corrections/:id/confirm",
            post(handlers::corrections::confirm),
        )
        .route(
            "/api/corrections/:id/discard",
            post(handlers::corrections::discard),
        )
        .route(
            "/api/corrections/history",
            get(handlers::corrections::history),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
