//! Upstream completion clients.
//!
//! The orchestrator talks to an external model through the
//! [`CompletionClient`] seam; the concrete clients here wrap Azure OpenAI and
//! the alternate Neuro-SAN endpoint. Every call is time-bounded, never
//! retried, and fails fast with a configuration error when credentials are
//! absent.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{AzureConfig, NeuroConfig};
use crate::error::HangarError;
use crate::model::ChatTurn;

/// Fixed upstream call timeout. Cancellation is not supported: once issued,
/// a call runs to completion, timeout, or transport error.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);
/// Completion size cap sent to the provider.
pub const MAX_COMPLETION_TOKENS: u32 = 512;

const COMPLETION_TEMPERATURE: f32 = 0.2;
const AZURE_API_VERSION: &str = "2023-05-15";
const NEURO_SESSION_ID: &str = "default-session-id";

/// A provider that turns a conversation into one reply string.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, messages: &[ChatTurn]) -> Result<String, HangarError>;
}

/// Maps a provider response to a reply or a distinguishable error kind:
/// error status -> Upstream (message forwarded), unparseable body or missing
/// fields -> Malformed.
fn decode_response(status: u16, body: &str) -> Result<String, HangarError> {
    if status >= 400 {
        return Err(HangarError::Upstream { status, detail: error_detail(body) });
    }
    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| HangarError::Malformed(format!("response body is not JSON: {e}")))?;
    parsed
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            HangarError::Malformed("response lacks choices[0].message.content".to_string())
        })
}

/// Best available error message from a provider error body:
/// `error.message`, then `message`, then the raw body.
fn error_detail(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn transport_error(e: reqwest::Error) -> HangarError {
    if e.is_timeout() {
        HangarError::Unavailable("upstream call timed out".to_string())
    } else {
        HangarError::Unavailable(e.to_string())
    }
}

fn build_http_client() -> Result<reqwest::Client, HangarError> {
    reqwest::Client::builder()
        .timeout(UPSTREAM_TIMEOUT)
        .build()
        .map_err(|e| HangarError::Configuration(format!("failed to build http client: {e}")))
}

/// Azure OpenAI chat-completions client.
pub struct AzureClient {
    http: reqwest::Client,
    config: AzureConfig,
}

impl AzureClient {
    pub fn new(config: AzureConfig) -> Result<Self, HangarError> {
        Ok(Self { http: build_http_client()?, config })
    }
}

#[async_trait]
impl CompletionClient for AzureClient {
    async fn complete(&self, messages: &[ChatTurn]) -> Result<String, HangarError> {
        let (endpoint, key, deployment) = self
            .config
            .credentials()
            .ok_or_else(|| HangarError::Configuration("azure openai not configured".to_string()))?;
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            deployment,
            AZURE_API_VERSION
        );
        let payload = serde_json::json!({
            "messages": messages,
            "max_tokens": MAX_COMPLETION_TOKENS,
            "temperature": COMPLETION_TEMPERATURE,
        });
        let response = self
            .http
            .post(&url)
            .header("api-key", key)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        decode_response(status, &body)
    }
}

/// Neuro-SAN client (alternate provider). Same response envelope, different
/// request shape: project plus session instead of a deployment path.
pub struct NeuroClient {
    http: reqwest::Client,
    config: NeuroConfig,
}

impl NeuroClient {
    pub fn new(config: NeuroConfig) -> Result<Self, HangarError> {
        Ok(Self { http: build_http_client()?, config })
    }
}

#[async_trait]
impl CompletionClient for NeuroClient {
    async fn complete(&self, messages: &[ChatTurn]) -> Result<String, HangarError> {
        let (api_url, project) = self
            .config
            .credentials()
            .ok_or_else(|| HangarError::Configuration("neuro-san not configured".to_string()))?;
        let payload = serde_json::json!({
            "project": project,
            "session": NEURO_SESSION_ID,
            "messages": messages,
        });
        let response = self
            .http
            .post(api_url)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        decode_response(status, &body)
    }
}
