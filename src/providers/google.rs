use std::time::Duration;
use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode, header};
use serde_json::Value;
use url::Url;

use crate::errors::ProviderError;
use super::TranslationProvider;

/// Default public endpoint
pub const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com";

/// Client for the public (keyless) Google Translate endpoint
#[derive(Debug, Clone)]
pub struct GoogleTranslateClient {
    /// HTTP client for API requests
    client: Client,
    /// Base URL of the service
    endpoint: String,
    /// Optional User-Agent header value
    user_agent: Option<String>,
}

impl GoogleTranslateClient {
    /// Create a new client against the default endpoint
    pub fn new() -> Self {
        Self::new_with_config(DEFAULT_ENDPOINT, 20, None)
    }

    /// Create a new client with an explicit endpoint, timeout and user agent
    pub fn new_with_config(
        endpoint: impl Into<String>,
        timeout_secs: u64,
        user_agent: Option<String>,
    ) -> Self {
        let endpoint = endpoint.into();
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            endpoint: if endpoint.trim().is_empty() {
                DEFAULT_ENDPOINT.to_string()
            } else {
                endpoint
            },
            user_agent: user_agent.filter(|agent| !agent.trim().is_empty()),
        }
    }

    /// Build the request URL for one translation call
    pub fn request_url(&self, text: &str, source_language: &str, target_language: &str) -> Result<Url, ProviderError> {
        let base = format!("{}/translate_a/single", self.endpoint.trim_end_matches('/'));
        Url::parse_with_params(
            &base,
            &[
                ("client", "gtx"),
                ("sl", source_language),
                ("tl", target_language),
                ("dt", "t"),
                ("q", text),
            ],
        )
        .map_err(|e| ProviderError::InvalidResponse(format!("Invalid endpoint URL '{}': {}", base, e)))
    }
}

impl Default for GoogleTranslateClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslateClient {
    fn name(&self) -> &str {
        "google_unofficial"
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let url = self.request_url(text, source_language, target_language)?;

        let mut request = self.client.get(url)
            .header(header::ACCEPT, "application/json,text/plain,*/*");
        if let Some(agent) = &self.user_agent {
            request = request.header(header::USER_AGENT, agent.trim());
        }

        let response = request.send().await
            .map_err(|e| ProviderError::NetworkError(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        let body = response.text().await
            .map_err(|e| ProviderError::NetworkError(format!("Failed to read response body: {}", e)))?;

        debug!("Google Translate answered {} ({} bytes)", status, body.len());

        classify_response(status, &body)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.translate("hello", "en", "ja").await.map(|_| ())
    }
}

/// Map an HTTP status and body onto a translation or a classified failure
pub fn classify_response(status: StatusCode, body: &str) -> Result<String, ProviderError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited(format!("HTTP {}", status.as_u16())));
    }

    if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
        error!("Google Translate rejected the request: HTTP {}", status.as_u16());
        return Err(ProviderError::Blocked(format!("HTTP {}", status.as_u16())));
    }

    if status.is_server_error() {
        return Err(ProviderError::NetworkError(format!("HTTP {}", status.as_u16())));
    }

    if !status.is_success() {
        return Err(ProviderError::InvalidResponse(format!("HTTP {}", status.as_u16())));
    }

    if body.trim().is_empty() {
        return Err(ProviderError::InvalidResponse("empty response body".to_string()));
    }

    // The JSON payload echoes the source text, so only non-JSON bodies are inspected
    let parsed: Value = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            let lower = body.to_ascii_lowercase();
            if lower.contains("<html") || lower.contains("captcha") {
                return Err(ProviderError::Blocked("captcha or HTML challenge detected".to_string()));
            }
            return Err(ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)));
        }
    };

    extract_segments(&parsed)
}

/// Extract the translated text from the nested array payload
pub fn parse_translation(body: &str) -> Result<String, ProviderError> {
    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    extract_segments(&parsed)
}

fn extract_segments(parsed: &Value) -> Result<String, ProviderError> {
    let segments = parsed
        .as_array()
        .and_then(|root| root.first())
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::InvalidResponse("missing translation segments".to_string()))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.as_array()?.first()?.as_str())
        .collect();

    if translated.trim().is_empty() {
        return Err(ProviderError::InvalidResponse("no translation segments returned".to_string()));
    }

    Ok(translated)
}
