//! Proof image retrieval from the blob store

use async_trait::async_trait;
use reqwest::Client;

use crate::model::config::StorageConfig;

#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("Proof not found: {0}")]
    NotFound(String),

    #[error("Proof store unreachable: {0}")]
    Unreachable(String),

    #[error("Proof store returned status {status} for {path}")]
    UpstreamStatus { status: u16, path: String },
}

/// A fetched proof image
#[derive(Debug, Clone)]
pub struct ProofObject {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Read capability over the blob store holding proof images
#[async_trait]
pub trait ProofStore: Send + Sync {
    /// Fetch the proof at `path`. Fails fast: retrying is the caller's responsibility.
    async fn fetch(&self, path: &str) -> Result<ProofObject, ProofError>;
}

/// Blob store client reading proof objects over HTTP
pub struct StorageProofStore {
    client: Client,
    base_url: String,
    bucket: String,
    token: Option<String>,
}

impl StorageProofStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent("stridecheck/0.1")
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            token: config.token.clone(),
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/object/{}/{}",
            self.base_url,
            self.bucket,
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl ProofStore for StorageProofStore {
    async fn fetch(&self, path: &str) -> Result<ProofObject, ProofError> {
        let url = self.object_url(path);
        tracing::debug!(path = %path, "Fetching proof from blob store");

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProofError::Unreachable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProofError::NotFound(path.to_string()));
        }

        if !response.status().is_success() {
            return Err(ProofError::UpstreamStatus {
                status: response.status().as_u16(),
                path: path.to_string(),
            });
        }

        // Store-reported content type wins; fall back to the path's extension
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| mime_from_path(path).to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProofError::Unreachable(e.to_string()))?
            .to_vec();

        tracing::debug!(path = %path, size = bytes.len(), mime = %mime_type, "Proof fetched");

        Ok(ProofObject { bytes, mime_type })
    }
}

/// Infer a MIME type from a path's extension
pub fn mime_from_path(path: &str) -> &'static str {
    let extension = path.rsplit('.').next().unwrap_or("").to_lowercase();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_from_path() {
        assert_eq!(mime_from_path("proofs/run.png"), "image/png");
        assert_eq!(mime_from_path("proofs/run.JPG"), "image/jpeg");
        assert_eq!(mime_from_path("a/b/walk.jpeg"), "image/jpeg");
        assert_eq!(mime_from_path("iphone/IMG_0042.HEIC"), "image/heic");
        assert_eq!(mime_from_path("proofs/export.pdf"), "application/octet-stream");
        assert_eq!(mime_from_path("noextension"), "application/octet-stream");
    }

    #[test]
    fn test_object_url_joins_cleanly() {
        let store = StorageProofStore::new(&crate::model::config::StorageConfig {
            base_url: "http://localhost:54321/storage/v1/".to_string(),
            token: None,
            bucket: "activity-proofs".to_string(),
        });

        assert_eq!(
            store.object_url("/user-1/run.png"),
            "http://localhost:54321/storage/v1/object/activity-proofs/user-1/run.png"
        );
    }
}
