// tests/common/mod.rs

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use pdf_quiz::{
    config::Config,
    routes,
    services::{
        extractor::{
            CredentialPool, Extractor, ExtractorConfig, GenerateRequest, ModelBackend,
            ProviderError,
        },
        store::QuizStore,
    },
    state::AppState,
};

/// What the fake backend saw for one call.
#[derive(Debug, Clone)]
pub struct Call {
    pub model: String,
    pub credential: String,
    pub prompt: String,
    pub document_base64: String,
}

type Responder = Box<dyn Fn(&GenerateRequest<'_>) -> Result<String, ProviderError> + Send + Sync>;

/// In-process stand-in for the model provider.
pub struct ScriptedBackend {
    respond: Responder,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedBackend {
    pub fn new(
        respond: impl Fn(&GenerateRequest<'_>) -> Result<String, ProviderError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Answers calls in order from `script`; fails once it runs out.
    pub fn sequence(script: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        let script = Mutex::new(VecDeque::from(script));
        Self::new(move |_| {
            script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::new(None, "script exhausted")))
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn generate(&self, request: GenerateRequest<'_>) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(Call {
            model: request.model.to_string(),
            credential: request.credential.to_string(),
            prompt: request.prompt.to_string(),
            document_base64: request.document_base64.to_string(),
        });
        (self.respond)(&request)
    }
}

pub fn http_error(status: u16, message: &str) -> Result<String, ProviderError> {
    Err(ProviderError::new(Some(status), message))
}

pub fn keys(names: &[&str]) -> CredentialPool {
    CredentialPool::new(names.iter().map(|k| k.to_string()).collect())
}

pub fn extractor(backend: Arc<ScriptedBackend>, models: &[&str], pool: CredentialPool) -> Extractor {
    Extractor::new(
        backend,
        ExtractorConfig {
            models: models.iter().map(|m| m.to_string()).collect(),
            credentials: pool,
            backoff: Duration::ZERO,
        },
    )
}

/// Unique scratch directory under the OS temp dir.
pub fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pdf_quiz_{}_{}", label, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("Failed to create scratch dir");
    dir
}

pub struct TestApp {
    pub address: String,
    pub public_dir: PathBuf,
    pub upload_dir: PathBuf,
}

impl TestApp {
    pub fn quiz_dir(&self) -> PathBuf {
        self.public_dir.join("quizzes")
    }
}

/// Spawns the app on a random port with the given fake backend.
pub async fn spawn_app(backend: Arc<ScriptedBackend>, credentials: &[&str]) -> TestApp {
    let root = scratch_dir("app");

    let mut config = Config::from_lookup(|_| None);
    config.public_dir = root.join("public");
    config.upload_dir = root.join("uploads");
    config.credentials = keys(credentials);
    config.retry_backoff = Duration::ZERO;
    config.rust_log = "error".to_string();

    let store = QuizStore::new(config.quiz_dir());
    store.ensure_dir().await.expect("Failed to create quiz dir");

    let extractor = Extractor::new(backend, config.extractor_config());

    let state = AppState {
        config: config.clone(),
        store,
        extractor,
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        public_dir: config.public_dir,
        upload_dir: config.upload_dir,
    }
}
