// src/main.rs

use std::sync::Arc;

use dotenvy::dotenv;
use pdf_quiz::config::Config;
use pdf_quiz::routes;
use pdf_quiz::services::{extractor::Extractor, gemini::GeminiBackend, store::QuizStore};
use pdf_quiz::state::AppState;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if config.credentials.is_empty() {
        tracing::warn!("No GEMINI_API_KEYS / GEMINI_API_KEY set; uploads will fail");
    } else {
        tracing::info!(
            "Loaded {} API key(s), models: {:?}",
            config.credentials.len(),
            config.models
        );
    }

    // Ensure dirs exist
    let store = QuizStore::new(config.quiz_dir());
    store
        .ensure_dir()
        .await
        .expect("Failed to create quiz directory");
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .expect("Failed to create upload directory");

    let backend = GeminiBackend::new(config.gemini_base_url.clone(), config.request_timeout)
        .expect("Failed to build HTTP client");
    let extractor = Extractor::new(Arc::new(backend), config.extractor_config());

    // Create AppState
    let state = AppState {
        config: config.clone(),
        store,
        extractor,
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = config.bind_addr();
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app).await.unwrap();
}
