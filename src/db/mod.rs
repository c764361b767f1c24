//! PostgreSQL persistence for claim records

pub mod repository;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::env;

const ENV_POSTGRES_HOST: &str = "VERIFY_POSTGRES_HOST";
const ENV_POSTGRES_PORT: &str = "VERIFY_POSTGRES_PORT";
const ENV_POSTGRES_USER: &str = "VERIFY_POSTGRES_USER";
const ENV_POSTGRES_PASSWORD: &str = "VERIFY_POSTGRES_PASSWORD";
const ENV_POSTGRES_DB: &str = "VERIFY_POSTGRES_DB";

const DEFAULT_POSTGRES_HOST: &str = "127.0.0.1";
const DEFAULT_POSTGRES_PORT: &str = "5432";
const DEFAULT_POSTGRES_USER: &str = "stridecheck";
const DEFAULT_POSTGRES_PASSWORD: &str = "stridecheck";
const DEFAULT_POSTGRES_DB: &str = "stridecheck";

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),
}

/// Verification fields written back onto a claim record. The write is a full
/// overwrite of these columns, so repeating it is idempotent.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationFields {
    pub verified: bool,
    pub tolerance: f64,
    pub extracted_km: Option<f64>,
    pub extracted_calories: Option<f64>,
    pub notes: String,
}

/// Write capability over the durable claim record
#[async_trait]
pub trait ClaimStore: Send + Sync {
    async fn update_verification_fields(
        &self,
        claim_id: &str,
        fields: &VerificationFields,
    ) -> Result<(), DbError>;
}

/// Create a new database connection pool
pub async fn create_pool() -> Result<PgPool, DbError> {
    let host = env::var(ENV_POSTGRES_HOST).unwrap_or_else(|_| DEFAULT_POSTGRES_HOST.to_string());
    let port = env::var(ENV_POSTGRES_PORT).unwrap_or_else(|_| DEFAULT_POSTGRES_PORT.to_string());
    let user = env::var(ENV_POSTGRES_USER).unwrap_or_else(|_| DEFAULT_POSTGRES_USER.to_string());
    let password =
        env::var(ENV_POSTGRES_PASSWORD).unwrap_or_else(|_| DEFAULT_POSTGRES_PASSWORD.to_string());
    let database = env::var(ENV_POSTGRES_DB).unwrap_or_else(|_| DEFAULT_POSTGRES_DB.to_string());

    let database_url = format!(
        "postgres://{}:{}@{}:{}/{}",
        user, password, host, port, database
    );

    tracing::debug!(host = %host, port = %port, database = %database, "Connecting to PostgreSQL");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;

    tracing::info!(host = %host, port = %port, "PostgreSQL connection established");

    Ok(pool)
}

/// Initialize database schema
pub async fn init_schema(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS activity_claims (
            id VARCHAR(64) PRIMARY KEY,
            requester_id TEXT NOT NULL,
            league_id TEXT,
            claimed_value DOUBLE PRECISION NOT NULL,
            claimed_date DATE,
            proof_path TEXT,
            verified BOOLEAN,
            tolerance DOUBLE PRECISION,
            extracted_km DOUBLE PRECISION,
            extracted_calories DOUBLE PRECISION,
            verification_notes TEXT,
            verified_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_activity_claims_requester_id ON activity_claims(requester_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_activity_claims_league_id ON activity_claims(league_id)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database schema initialized");

    Ok(())
}
