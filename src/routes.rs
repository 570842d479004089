// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::{health, quiz, upload},
    state::AppState,
};

/// Assembles the main application router.
///
/// * `/upload` and `/quizzes` are the endpoints the quiz client talks to.
/// * `/api/*` exposes health, canonical quiz reads and scoring.
/// * Anything else is served from the public directory, which is how
///   `/quizzes/{id}.json` reaches the client.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/quizzes/{id}", get(quiz::get_quiz))
        .route("/quizzes/{id}/submit", post(quiz::submit_quiz));

    let static_files = ServeDir::new(&state.config.public_dir);

    Router::new()
        .route(
            "/upload",
            post(upload::upload_files)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .route("/quizzes", get(quiz::list_quizzes))
        .nest("/api", api_routes)
        .fallback_service(static_files)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
