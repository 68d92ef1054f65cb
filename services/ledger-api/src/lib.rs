//! Wasatah Ledger API
//!
//! HTTP surface over [`ledger_core::Ledger`]. The binary in `main.rs` wires
//! configuration, logging and the listener; this library exposes the router
//! so tests can drive it in-process.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

/// Routes without middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/metrics", get(routes::metrics))
        .route(
            "/api/ledger",
            get(routes::list_events).post(routes::append_event),
        )
        .route("/api/ledger/append", post(routes::append_event))
        .route("/api/ledger/reset", post(routes::reset_ledger))
        .route("/api/ledger/events/:id", get(routes::get_event))
        .route("/api/ledger/blocks/:number", get(routes::get_block))
        .with_state(state)
}

/// Full application: routes, CORS and request tracing
pub fn app(state: AppState, cors_origins: &[String]) -> Router {
    router(state)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// CORS for the configured browser origins
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}
