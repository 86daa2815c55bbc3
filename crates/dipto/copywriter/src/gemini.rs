//! Gemini `generateContent` backend

use crate::error::{CopyError, CopyResult};
use crate::prompt::description_prompt;
use crate::DescriptionWriter;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Base URL, or a full `...:generateContent` URL.
    pub endpoint: Option<String>,
    pub model: String,
    /// Falls back to `GEMINI_API_KEY` when unset.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl GeminiConfig {
    fn resolve_api_key(&self) -> CopyResult<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or(CopyError::MissingApiKey)
    }
}

pub struct GeminiWriter {
    client: Client,
    url: Url,
    model: String,
}

impl GeminiWriter {
    pub fn new(config: &GeminiConfig) -> CopyResult<Self> {
        let api_key = config.resolve_api_key()?;
        let url = resolve_gemini_endpoint(config.endpoint.as_deref(), &config.model, &api_key)?;
        Ok(Self {
            client: build_http_client(config.timeout_secs)?,
            url,
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl DescriptionWriter for GeminiWriter {
    #[instrument(skip(self), fields(model = %self.model))]
    async fn describe(&self, title: &str, category: &str) -> CopyResult<String> {
        if title.trim().is_empty() {
            return Err(CopyError::MissingTitle);
        }

        let payload = json!({
            "contents": [
                {
                    "parts": [
                        {
                            "text": description_prompt(title, category)
                        }
                    ]
                }
            ]
        });

        let response = self
            .client
            .post(self.url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| CopyError::Request(redacted(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Description request rejected");
            return Err(CopyError::Status {
                status: status.as_u16(),
                body: truncate(&body, 320),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| CopyError::InvalidResponse(redacted(e)))?;

        let text = extract_candidate_text(&body);
        if text.is_empty() {
            return Err(CopyError::EmptyResponse);
        }
        debug!(chars = text.chars().count(), "Description generated");
        Ok(text)
    }
}

/// Error text without the request URL, which carries the API key.
fn redacted(error: reqwest::Error) -> String {
    error.without_url().to_string()
}

fn build_http_client(timeout_secs: u64) -> CopyResult<Client> {
    let mut builder = Client::builder().timeout(Duration::from_secs(timeout_secs));
    let allow_system_proxy = std::env::var("DIPTO_USE_SYSTEM_PROXY")
        .map(|value| matches!(value.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);

    if !allow_system_proxy {
        builder = builder.no_proxy();
    }

    builder.build().map_err(|e| CopyError::Client(e.to_string()))
}

fn resolve_gemini_endpoint(endpoint: Option<&str>, model: &str, api_key: &str) -> CopyResult<Url> {
    let endpoint = endpoint.unwrap_or(DEFAULT_GEMINI_ENDPOINT);
    let target = if endpoint.contains(":generateContent") {
        endpoint.to_string()
    } else {
        format!(
            "{}/v1beta/models/{}:generateContent",
            endpoint.trim_end_matches('/'),
            model
        )
    };

    let mut url = Url::parse(&target).map_err(|e| CopyError::InvalidEndpoint {
        endpoint: target.clone(),
        reason: e.to_string(),
    })?;
    if !url.query_pairs().any(|(k, _)| k == "key") {
        url.query_pairs_mut().append_pair("key", api_key);
    }
    Ok(url)
}

/// Text of the first candidate, parts joined and trimmed.
fn extract_candidate_text(body: &Value) -> String {
    body["candidates"]
        .as_array()
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate["content"]["parts"].as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn truncate(value: &str, max_chars: usize) -> String {
    let mut chars = value.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}
