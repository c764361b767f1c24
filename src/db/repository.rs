//! Repository for claim record database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use super::{ClaimStore, DbError, VerificationFields};

/// Repository writing verification results onto claim records
#[derive(Clone)]
pub struct ClaimRepository {
    pool: PgPool,
}

impl ClaimRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClaimStore for ClaimRepository {
    async fn update_verification_fields(
        &self,
        claim_id: &str,
        fields: &VerificationFields,
    ) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            UPDATE activity_claims SET
                verified = $2,
                tolerance = $3,
                extracted_km = $4,
                extracted_calories = $5,
                verification_notes = $6,
                verified_at = $7
            WHERE id = $1
            "#,
        )
        .bind(claim_id)
        .bind(fields.verified)
        .bind(fields.tolerance)
        .bind(fields.extracted_km)
        .bind(fields.extracted_calories)
        .bind(&fields.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(claim_id.to_string()));
        }

        tracing::debug!(claim_id = %claim_id, verified = fields.verified, "Updated claim verification fields");
        Ok(())
    }
}
