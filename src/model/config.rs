//! Application configuration from environment variables

use std::env;

const ENV_HOST: &str = "HOST";
const ENV_PORT: &str = "PORT";

const ENV_EXTRACTION_MODEL: &str = "VERIFY_EXTRACTION_MODEL";
const ENV_EXTRACTION_TIMEOUT_MS: &str = "VERIFY_EXTRACTION_TIMEOUT_MS";
const ENV_EXTRACTION_ENDPOINT: &str = "VERIFY_EXTRACTION_ENDPOINT";

const ENV_STORAGE_URL: &str = "VERIFY_STORAGE_URL";
const ENV_STORAGE_TOKEN: &str = "VERIFY_STORAGE_TOKEN";
const ENV_PROOF_BUCKET: &str = "VERIFY_PROOF_BUCKET";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

const DEFAULT_EXTRACTION_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_EXTRACTION_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_EXTRACTION_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_STORAGE_URL: &str = "http://127.0.0.1:54321/storage/v1";
const DEFAULT_PROOF_BUCKET: &str = "activity-proofs";

/// Extraction service settings
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Model identifier passed to the inference endpoint
    pub model: String,
    /// Bound on a single extraction call, in milliseconds
    pub timeout_ms: u64,
    /// Base URL of the inference endpoint
    pub endpoint: String,
}

/// Blob store settings for proof images
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base URL of the blob store
    pub base_url: String,
    /// Bearer token for the blob store, if it requires one
    pub token: Option<String>,
    /// Bucket holding proof images
    pub bucket: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub extraction: ExtractionConfig,
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            extraction: ExtractionConfig {
                model: DEFAULT_EXTRACTION_MODEL.to_string(),
                timeout_ms: DEFAULT_EXTRACTION_TIMEOUT_MS,
                endpoint: DEFAULT_EXTRACTION_ENDPOINT.to_string(),
            },
            storage: StorageConfig {
                base_url: DEFAULT_STORAGE_URL.to_string(),
                token: None,
                bucket: DEFAULT_PROOF_BUCKET.to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let host = env::var(ENV_HOST).unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = env::var(ENV_PORT)
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let extraction = ExtractionConfig {
            model: env::var(ENV_EXTRACTION_MODEL)
                .unwrap_or_else(|_| DEFAULT_EXTRACTION_MODEL.to_string()),
            timeout_ms: env::var(ENV_EXTRACTION_TIMEOUT_MS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_EXTRACTION_TIMEOUT_MS),
            endpoint: env::var(ENV_EXTRACTION_ENDPOINT)
                .unwrap_or_else(|_| DEFAULT_EXTRACTION_ENDPOINT.to_string()),
        };

        let storage = StorageConfig {
            base_url: env::var(ENV_STORAGE_URL).unwrap_or_else(|_| DEFAULT_STORAGE_URL.to_string()),
            token: env::var(ENV_STORAGE_TOKEN).ok().filter(|t| !t.is_empty()),
            bucket: env::var(ENV_PROOF_BUCKET).unwrap_or_else(|_| DEFAULT_PROOF_BUCKET.to_string()),
        };

        tracing::debug!(
            model = %extraction.model,
            timeout_ms = extraction.timeout_ms,
            bucket = %storage.bucket,
            "Configuration loaded"
        );

        Self {
            host,
            port,
            extraction,
            storage,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
