//! Application state and service initialization

use std::sync::Arc;

use actix_web::web;
use sqlx::PgPool;

use crate::db::repository::ClaimRepository;
use crate::extractor::GeminiExtractor;
use crate::model::Config;
use crate::proof::StorageProofStore;
use crate::service::VerificationService;

const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database initialization failed: {0}")]
    DatabaseInit(String),

    #[error("Missing required configuration: {0}")]
    MissingConfig(&'static str),
}

/// Application state: the verification service and its shared resources
pub struct AppState {
    pub db_pool: web::Data<PgPool>,
    pub verification_service: web::Data<VerificationService>,
}

impl AppState {
    /// Initialize the database, the external-service clients, and the
    /// verification pipeline they feed.
    pub async fn new(config: &Config) -> Result<Self, AppError> {
        let db_pool = crate::db::create_pool()
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        crate::db::init_schema(&db_pool)
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        let api_key = std::env::var(ENV_GEMINI_API_KEY)
            .map_err(|_| AppError::MissingConfig(ENV_GEMINI_API_KEY))?;

        let proofs = Arc::new(StorageProofStore::new(&config.storage));
        let extractor = Arc::new(GeminiExtractor::new(&config.extraction, api_key));
        let claims = Arc::new(ClaimRepository::new(db_pool.clone()));

        tracing::info!(
            model = %config.extraction.model,
            timeout_ms = config.extraction.timeout_ms,
            bucket = %config.storage.bucket,
            "Verification service initialized"
        );

        Ok(Self {
            db_pool: web::Data::new(db_pool),
            verification_service: web::Data::new(VerificationService::new(
                proofs, extractor, claims,
            )),
        })
    }
}
