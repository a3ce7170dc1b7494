//! whisper-api: HTTP surface of a Whisper node.
//!
//! `GET /peers` lists the peer registry, `GET /` serves a small compose
//! page, and `POST /send` originates a message from this node.

pub mod handlers;

use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use handlers::{ApiState, Originator};

/// Build the router. Split out from `serve` so tests can drive it directly.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::handle_index))
        .route("/peers", get(handlers::handle_peers))
        .route("/send", post(handlers::handle_send))
        .with_state(state)
        .layer(cors)
}

pub async fn serve(state: ApiState, port: u16) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!(port, "API listening on 127.0.0.1");
    axum::serve(listener, app).await?;
    Ok(())
}
