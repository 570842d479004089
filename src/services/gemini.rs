// src/services/gemini.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::services::extractor::{GenerateRequest, ModelBackend, ProviderError};

/// `generateContent` over the Generative Language REST API.
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    base_url: String,
}

impl GeminiBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// `{base}/v1beta/models/{name}:generateContent`; bare model names get
    /// the `models/` prefix.
    pub fn endpoint(&self, model: &str) -> Result<Url, url::ParseError> {
        let model = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        let base = Url::parse(&format!("{}/", self.base_url.trim_end_matches('/')))?;
        base.join(&format!("v1beta/{}:generateContent", model))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Inline { inline_data: InlineData<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[async_trait]
impl ModelBackend for GeminiBackend {
    async fn generate(&self, request: GenerateRequest<'_>) -> Result<String, ProviderError> {
        let url = self
            .endpoint(request.model)
            .map_err(|e| ProviderError::fatal(format!("invalid endpoint: {}", e)))?;

        let body = GenerateContentBody {
            contents: vec![Content {
                parts: vec![
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type: request.mime_type,
                            data: request.document_base64,
                        },
                    },
                    Part::Text {
                        text: request.prompt,
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        tracing::debug!("POST {} ({} bytes of base64)", url, request.document_base64.len());

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", request.credential)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::new(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::new(Some(status.as_u16()), text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::new(None, format!("unreadable response body: {}", e)))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::new(None, "empty response from model"));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_adds_models_prefix() {
        let backend =
            GeminiBackend::new("https://example.test/", Duration::from_secs(5)).unwrap();

        assert_eq!(
            backend.endpoint("gemma-3-27b").unwrap().as_str(),
            "https://example.test/v1beta/models/gemma-3-27b:generateContent"
        );
        assert_eq!(
            backend.endpoint("models/gemini-2.0-flash").unwrap().as_str(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn request_body_uses_api_field_names() {
        let body = GenerateContentBody {
            contents: vec![Content {
                parts: vec![
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type: "application/pdf",
                            data: "QUJD",
                        },
                    },
                    Part::Text { text: "extract" },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value["contents"][0]["parts"][0]["inline_data"]["mime_type"],
            "application/pdf"
        );
        assert_eq!(value["contents"][0]["parts"][1]["text"], "extract");
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }
}
