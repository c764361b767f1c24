//! Gemini-hosted multimodal extraction client

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde_json::Value;

use super::{ExtractorError, VisionExtractor};
use crate::model::config::ExtractionConfig;

/// Fallback retry delay when the provider rate-limits without a Retry-After header
const DEFAULT_RETRY_AFTER_SECONDS: u64 = 60;

/// Client for a Gemini `generateContent`-style inference endpoint
pub struct GeminiExtractor {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    timeout_ms: u64,
}

impl GeminiExtractor {
    pub fn new(config: &ExtractionConfig, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .user_agent("stridecheck/0.1")
                .build()
                .unwrap_or_else(|_| Client::new()),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            timeout_ms: config.timeout_ms,
        }
    }

    fn request_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Request body: one text part with the instruction, one inline image part.
    /// Temperature 0 keeps readings reproducible for identical proofs.
    fn request_body(&self, prompt: &str, image: &[u8], mime_type: &str) -> Value {
        serde_json::json!({
            "contents": [{
                "parts": [
                    { "text": prompt },
                    { "inline_data": { "mime_type": mime_type, "data": BASE64.encode(image) } }
                ]
            }],
            "generationConfig": { "temperature": 0.0 }
        })
    }

    async fn send(
        &self,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<String, ExtractorError> {
        let response = self
            .client
            .post(self.request_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt, image, mime_type))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ExtractorError::Unreachable(e.to_string())
                } else {
                    ExtractorError::Http(e)
                }
            })?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_seconds = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECONDS);
            tracing::warn!(model = %self.model, retry_after_seconds, "Extraction provider rate limited");
            return Err(ExtractorError::RateLimited {
                retry_after_seconds,
            });
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractorError::UpstreamStatus { status, body });
        }

        let payload: Value = response.json().await?;
        Ok(collect_candidate_text(&payload))
    }
}

#[async_trait]
impl VisionExtractor for GeminiExtractor {
    async fn extract_text(
        &self,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<String, ExtractorError> {
        let start_time = std::time::Instant::now();

        tracing::debug!(
            model = %self.model,
            prompt_length = prompt.len(),
            image_bytes = image.len(),
            mime = %mime_type,
            "Initiating extraction call"
        );

        // Race the outbound call against the timeout. On expiry the future is
        // dropped, which cancels the in-flight request; no orphaned work continues.
        let result = tokio::time::timeout(
            Duration::from_millis(self.timeout_ms),
            self.send(prompt, image, mime_type),
        )
        .await;

        let elapsed = start_time.elapsed();
        match result {
            Ok(Ok(text)) => {
                tracing::info!(
                    model = %self.model,
                    elapsed_ms = elapsed.as_millis(),
                    response_length = text.len(),
                    "Extraction call completed"
                );
                Ok(text)
            }
            Ok(Err(e)) => {
                tracing::error!(
                    model = %self.model,
                    elapsed_ms = elapsed.as_millis(),
                    error = %e,
                    "Extraction call failed"
                );
                Err(e)
            }
            Err(_) => {
                tracing::error!(
                    model = %self.model,
                    timeout_ms = self.timeout_ms,
                    "Extraction call abandoned after timeout"
                );
                Err(ExtractorError::Timeout(self.timeout_ms))
            }
        }
    }
}

/// Concatenate the text parts of the first candidate
fn collect_candidate_text(payload: &Value) -> String {
    payload["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_candidate_text_joins_parts() {
        let payload = serde_json::json!({
            "candidates": [{
                "content": { "parts": [ { "text": "{\"value\": " }, { "text": "5000}" } ] }
            }]
        });

        assert_eq!(collect_candidate_text(&payload), "{\"value\": 5000}");
    }

    #[test]
    fn test_collect_candidate_text_empty_on_missing_candidates() {
        let payload = serde_json::json!({ "promptFeedback": { "blockReason": "SAFETY" } });

        assert_eq!(collect_candidate_text(&payload), "");
    }

    #[test]
    fn test_request_url() {
        let extractor = GeminiExtractor::new(
            &ExtractionConfig {
                model: "gemini-2.0-flash".to_string(),
                timeout_ms: 30_000,
                endpoint: "https://generativelanguage.googleapis.com/v1beta/".to_string(),
            },
            "key".to_string(),
        );

        assert_eq!(
            extractor.request_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
