use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use susword::{api, config::AppConfig, engine::GameService, store::MemoryStore, ws};

#[tokio::main]
async fn main() {
    // A missing .env is fine, anything else deserves a warning
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: could not load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "susword=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting susword...");

    let config = AppConfig::from_env();

    let store = Arc::new(MemoryStore::new());
    let service = Arc::new(match config.seed {
        Some(seed) => {
            tracing::info!("Using fixed RNG seed {}", seed);
            GameService::with_seed(store, seed)
        }
        None => GameService::new(store),
    });

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/api/rooms/{room_id}/state", get(api::get_room_state))
        .route("/api/categories", get(api::list_categories))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(service);

    tracing::info!("Listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
