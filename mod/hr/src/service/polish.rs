//! Feedback polishing — strategy trait plus the HTTP-backed and mock
//! implementations.

use async_trait::async_trait;

use crate::service::HrError;

/// Strategy for polishing feedback text with an inference model.
#[async_trait]
pub trait Polisher: Send + Sync {
    /// Rewrite `content` with the given model, returning the polished text.
    async fn polish(&self, content: &str, model: &str) -> Result<String, HrError>;
}

/// Polisher backed by a hosted inference API (HuggingFace-style:
/// `POST {api_url}/{model}` with `{"inputs": ...}`, bearer-authenticated,
/// responding `[{"generated_text": ...}]`).
///
/// Timeouts live here, on the HTTP client — not in the feedback core.
pub struct HttpPolisher {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    default_model: String,
}

impl HttpPolisher {
    pub fn new(api_url: String, api_key: String, default_model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_url,
            api_key,
            default_model,
        }
    }
}

#[async_trait]
impl Polisher for HttpPolisher {
    async fn polish(&self, content: &str, model: &str) -> Result<String, HrError> {
        if self.api_key.is_empty() {
            return Err(HrError::Internal("polish api key is not configured".into()));
        }

        let model = if model.is_empty() {
            self.default_model.as_str()
        } else {
            model
        };
        let url = format!("{}/{}", self.api_url.trim_end_matches('/'), model);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({"inputs": content}))
            .send()
            .await
            .map_err(|e| HrError::Internal(format!("polish request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(HrError::Internal(format!(
                "polish api returned {}: {}",
                status, body
            )));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| HrError::Internal(format!("polish response parse failed: {}", e)))?;

        // Text-generation responses: [{"generated_text": "..."}]
        json[0]["generated_text"]
            .as_str()
            .or_else(|| json["generated_text"].as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| HrError::Internal("polish response missing generated_text".into()))
    }
}

/// Deterministic polisher for tests and offline deployments.
pub struct MockPolisher {
    fail: bool,
}

impl MockPolisher {
    pub fn succeeding() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl Polisher for MockPolisher {
    async fn polish(&self, content: &str, model: &str) -> Result<String, HrError> {
        if self.fail {
            return Err(HrError::Internal("mock polisher failure".into()));
        }
        Ok(format!("[{}] {}", model, content.trim()))
    }
}
