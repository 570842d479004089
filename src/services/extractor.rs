// src/services/extractor.rs

//! Extraction client: turns a PDF into JSON by asking a generative model,
//! walking an ordered model list and rotating through a credential pool.

use std::{fmt, path::Path, sync::Arc, time::Duration};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde_json::Value;

use crate::utils::text::{mask_credential, strip_code_fences};

/// Ordered, interchangeable API keys.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialPool(Vec<String>);

impl CredentialPool {
    pub fn new(keys: Vec<String>) -> Self {
        Self(
            keys.into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        )
    }

    /// A comma-separated list wins; the single key is only a fallback.
    pub fn from_env_values(list: Option<&str>, single: Option<&str>) -> Self {
        let pool = Self::new(
            list.unwrap_or_default()
                .split(',')
                .map(str::to_string)
                .collect(),
        );
        if !pool.is_empty() {
            return pool;
        }
        Self::new(single.map(|k| vec![k.to_string()]).unwrap_or_default())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Credential under a rotating cursor. The pool must be non-empty.
    pub fn get(&self, cursor: usize) -> &str {
        &self.0[cursor % self.0.len()]
    }
}

// Never print the keys themselves.
impl fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.0.iter().map(|k| mask_credential(k)))
            .finish()
    }
}

/// Everything the extractor needs, built once from `Config`.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub models: Vec<String>,
    pub credentials: CredentialPool,
    pub backoff: Duration,
}

/// A single model call.
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub credential: &'a str,
    pub document_base64: &'a str,
    pub mime_type: &'a str,
    pub prompt: &'a str,
}

/// Error reported by a model backend for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub status: Option<u16>,
    pub message: String,
    /// The request could not be built at all; retrying cannot help.
    pub fatal: bool,
}

impl ProviderError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            fatal: false,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            fatal: true,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Something that can run a document + instruction through a named model
/// and return the raw response text.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn generate(&self, request: GenerateRequest<'_>) -> Result<String, ProviderError>;
}

/// Failure of one attempt (one model, one credential).
#[derive(Debug)]
pub enum AttemptError {
    Provider(ProviderError),
    MalformedResponse(serde_json::Error),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Provider(e) => write!(f, "{}", e),
            AttemptError::MalformedResponse(e) => write!(f, "malformed JSON response: {}", e),
        }
    }
}

/// What the retry loop does after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    SwitchCredential { backoff: bool },
    NextModel,
    Abort,
}

/// Maps an attempt failure onto the retry loop's next move.
pub fn classify(error: &AttemptError) -> Disposition {
    let provider = match error {
        AttemptError::Provider(e) => e,
        AttemptError::MalformedResponse(_) => {
            return Disposition::SwitchCredential { backoff: false };
        }
    };

    if provider.fatal {
        return Disposition::Abort;
    }

    let text = provider.to_string();
    let lower = text.to_lowercase();

    if text.contains("429")
        || lower.contains("quota")
        || text.contains("503")
        || lower.contains("overloaded")
    {
        Disposition::SwitchCredential { backoff: true }
    } else if text.contains("404") || text.contains("Not Found") {
        Disposition::NextModel
    } else {
        Disposition::SwitchCredential { backoff: false }
    }
}

#[derive(Debug)]
pub enum ExtractionError {
    /// The credential pool is empty; nothing was attempted.
    NoCredentials,
    /// Every model/credential combination failed.
    Exhausted { task: String, attempts: usize },
    /// A failure that no retry can fix.
    Aborted {
        task: String,
        model: String,
        reason: String,
    },
    /// The document could not be read.
    Document {
        path: String,
        source: std::io::Error,
    },
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::NoCredentials => write!(f, "no API credentials configured"),
            ExtractionError::Exhausted { task, attempts } => {
                write!(f, "[{}] all models failed after {} attempts", task, attempts)
            }
            ExtractionError::Aborted {
                task,
                model,
                reason,
            } => write!(f, "[{}] aborted on {}: {}", task, model, reason),
            ExtractionError::Document { path, source } => {
                write!(f, "cannot read document {}: {}", path, source)
            }
        }
    }
}

impl std::error::Error for ExtractionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractionError::Document { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Position of the retry loop.
/// `cursor` rotates through the credential pool for the whole run and is
/// never reset when the model changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RunState {
    model_index: usize,
    cursor: usize,
    attempts_on_model: usize,
}

impl RunState {
    fn rotate(self) -> Self {
        Self {
            cursor: self.cursor + 1,
            attempts_on_model: self.attempts_on_model + 1,
            ..self
        }
    }

    fn next_model(self) -> Self {
        Self {
            model_index: self.model_index + 1,
            cursor: self.cursor,
            attempts_on_model: 0,
        }
    }
}

/// The extraction client.
#[derive(Clone)]
pub struct Extractor {
    backend: Arc<dyn ModelBackend>,
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(backend: Arc<dyn ModelBackend>, config: ExtractorConfig) -> Self {
        Self { backend, config }
    }

    /// Reads the PDF at `path` and runs it through [`Extractor::extract_bytes`].
    pub async fn extract(
        &self,
        path: &Path,
        prompt: &str,
        task: &str,
    ) -> Result<Value, ExtractionError> {
        if self.config.credentials.is_empty() {
            tracing::error!("[{}] No API keys configured", task);
            return Err(ExtractionError::NoCredentials);
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ExtractionError::Document {
                path: path.display().to_string(),
                source,
            })?;

        self.extract_bytes(&bytes, prompt, task).await
    }

    /// Runs the retry loop over an in-memory PDF. First success wins.
    pub async fn extract_bytes(
        &self,
        document: &[u8],
        prompt: &str,
        task: &str,
    ) -> Result<Value, ExtractionError> {
        let pool = &self.config.credentials;
        if pool.is_empty() {
            tracing::error!("[{}] No API keys configured", task);
            return Err(ExtractionError::NoCredentials);
        }

        // Encoded once, reused by every attempt.
        let document_base64 = BASE64.encode(document);

        let mut state = RunState::default();
        let mut attempts = 0;

        while let Some(model) = self.config.models.get(state.model_index) {
            if state.attempts_on_model == pool.len() {
                tracing::warn!("[{}] Every key failed on {}. Moving to next model.", task, model);
                state = state.next_model();
                continue;
            }
            if state.attempts_on_model == 0 {
                tracing::info!("[{}] Trying model: {}...", task, model);
            }

            let credential = pool.get(state.cursor);
            attempts += 1;

            let request = GenerateRequest {
                model,
                credential,
                document_base64: &document_base64,
                mime_type: "application/pdf",
                prompt,
            };

            let error = match self.attempt(request).await {
                Ok(value) => {
                    tracing::info!("[{}] Succeeded with {} after {} attempts", task, model, attempts);
                    return Ok(value);
                }
                Err(e) => e,
            };

            let masked = mask_credential(credential);
            match classify(&error) {
                Disposition::SwitchCredential { backoff: true } => {
                    tracing::warn!(
                        "[{}] Quota/Limit hit with key {} on {}. Switching key...",
                        task,
                        masked,
                        model
                    );
                    state = state.rotate();
                    if !self.config.backoff.is_zero() {
                        tokio::time::sleep(self.config.backoff).await;
                    }
                }
                Disposition::SwitchCredential { backoff: false } => {
                    tracing::warn!("[{}] Error with {} using key {}: {}", task, model, masked, error);
                    state = state.rotate();
                }
                Disposition::NextModel => {
                    tracing::warn!("[{}] Model {} seems unavailable: {}", task, model, error);
                    state = state.next_model();
                }
                Disposition::Abort => {
                    tracing::error!("[{}] Fatal error with {}: {}", task, model, error);
                    return Err(ExtractionError::Aborted {
                        task: task.to_string(),
                        model: model.clone(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        tracing::error!("[{}] All models failed after {} attempts", task, attempts);
        Err(ExtractionError::Exhausted {
            task: task.to_string(),
            attempts,
        })
    }

    async fn attempt(&self, request: GenerateRequest<'_>) -> Result<Value, AttemptError> {
        let text = self
            .backend
            .generate(request)
            .await
            .map_err(AttemptError::Provider)?;

        serde_json::from_str(&strip_code_fences(&text)).map_err(AttemptError::MalformedResponse)
    }
}
