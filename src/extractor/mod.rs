//! External multimodal extraction boundary
//!
//! The inference service is treated as an opaque capability: given a text
//! instruction and inline image bytes, return a best-effort free-form text
//! response, or fail. One production implementation talks to a hosted model;
//! tests substitute their own.

mod gemini;

use async_trait::async_trait;

pub use gemini::GeminiExtractor;

#[derive(Debug, thiserror::Error)]
pub enum ExtractorError {
    #[error("Extraction timed out after {0} ms")]
    Timeout(u64),

    #[error("Extraction provider rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Extraction endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("Extraction request failed with status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Multimodal inference capability: one prompt, one image, one text response
#[async_trait]
pub trait VisionExtractor: Send + Sync {
    /// Send the instruction and image to the model and return its raw text
    /// response. Bounded by the configured timeout; never retried internally.
    async fn extract_text(
        &self,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<String, ExtractorError>;
}
