// src/config.rs

use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use dotenvy::dotenv;

use crate::services::extractor::{CredentialPool, ExtractorConfig};

pub const DEFAULT_MODELS: [&str; 4] = [
    "models/gemini-2.0-flash",
    "models/gemma-3-27b",
    "models/gemma-3-12b",
    "models/gemini-1.5-flash",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: CredentialPool,
    pub models: Vec<String>,
    pub gemini_base_url: String,
    pub request_timeout: Duration,
    pub retry_backoff: Duration,
    pub public_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub cors_origins: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let credentials = CredentialPool::from_env_values(
            lookup("GEMINI_API_KEYS").as_deref(),
            lookup("GEMINI_API_KEY").as_deref(),
        );

        let models = lookup("GEMINI_MODELS")
            .map(|list| split_list(&list))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| DEFAULT_MODELS.iter().map(|m| m.to_string()).collect());

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|list| split_list(&list))
            .unwrap_or_else(|| {
                vec![
                    "http://localhost:5173".to_string(),
                    "http://127.0.0.1:5173".to_string(),
                ]
            });

        Self {
            credentials,
            models,
            gemini_base_url: lookup("GEMINI_BASE_URL")
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string()),
            request_timeout: Duration::from_secs(parse_or(&lookup, "GEMINI_TIMEOUT_SECS", 120)),
            retry_backoff: Duration::from_millis(parse_or(&lookup, "RETRY_BACKOFF_MS", 1000)),
            public_dir: lookup("PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 50 * 1024 * 1024),
            cors_origins,
            port: parse_or(&lookup, "PORT", 5000),
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Directory holding the stored quiz JSON files.
    pub fn quiz_dir(&self) -> PathBuf {
        self.public_dir.join("quizzes")
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            models: self.models.clone(),
            credentials: self.credentials.clone(),
            backoff: self.retry_backoff,
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            default
        }),
        None => default,
    }
}
