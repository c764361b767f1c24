//! Verification pipeline
//!
//! One linear asynchronous pass per attempt: fetch proof, call the extractor,
//! evaluate, persist the audit trail. Attempts are fully independent; the
//! service holds no mutable state, so any number can run concurrently.

pub mod error;
pub mod evaluate;
pub mod outcome;
pub mod prompts;

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::db::{ClaimStore, VerificationFields};
use crate::extractor::VisionExtractor;
use crate::model::extraction::parse_extraction;
use crate::model::{ClaimContext, ExtractionResult, Outcome, Verdict};
use crate::proof::ProofStore;
use crate::service::verification::prompts::format_number;

pub use error::VerificationError;
pub use evaluate::evaluate;
pub use prompts::build_extraction_prompt;

/// Activity-claim verification engine
pub struct VerificationService {
    proofs: Arc<dyn ProofStore>,
    extractor: Arc<dyn VisionExtractor>,
    claims: Arc<dyn ClaimStore>,
}

impl VerificationService {
    pub fn new(
        proofs: Arc<dyn ProofStore>,
        extractor: Arc<dyn VisionExtractor>,
        claims: Arc<dyn ClaimStore>,
    ) -> Self {
        Self {
            proofs,
            extractor,
            claims,
        }
    }

    /// Run one verification attempt end to end. Total: every exit point,
    /// success or failure, returns a classified [`Outcome`].
    pub async fn verify(&self, claim: ClaimContext) -> Outcome {
        let attempt_id = Uuid::new_v4();
        let start_time = std::time::Instant::now();

        tracing::info!(
            attempt_id = %attempt_id,
            requester_id = %claim.requester_id,
            claim_id = ?claim.claim_id,
            claimed_value = claim.claimed_value,
            auto_extract = claim.is_auto_extract(),
            "Verification attempt started"
        );

        match self.run_pipeline(&claim).await {
            Ok((verdict, extraction)) => {
                self.persist_audit(&claim, &verdict, &extraction).await;

                tracing::info!(
                    attempt_id = %attempt_id,
                    verified = verdict.verified,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    "Verification attempt completed"
                );

                outcome::classify_success(verdict, extraction)
            }
            Err(e) => {
                tracing::error!(
                    attempt_id = %attempt_id,
                    error = %e,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    "Verification attempt failed"
                );

                outcome::classify_error(&e)
            }
        }
    }

    /// Fetch, extract, evaluate. Failures propagate to the classifier;
    /// a malformed extractor response does not fail, it degrades to an
    /// empty extraction and a negative verdict.
    async fn run_pipeline(
        &self,
        claim: &ClaimContext,
    ) -> Result<(Verdict, ExtractionResult), VerificationError> {
        let proof = self.proofs.fetch(&claim.proof_path).await?;

        let prompt = build_extraction_prompt(claim, Utc::now().date_naive());
        let raw_text = self
            .extractor
            .extract_text(&prompt, &proof.bytes, &proof.mime_type)
            .await?;

        let extraction = parse_extraction(&raw_text);
        let verdict = evaluate(claim, &extraction);

        Ok((verdict, extraction))
    }

    /// Best-effort audit write. The verification decision already succeeded;
    /// only its durability is at risk here, so failures are logged at warn
    /// and never surfaced. Skipped when the attempt has no claim record.
    async fn persist_audit(
        &self,
        claim: &ClaimContext,
        verdict: &Verdict,
        extraction: &ExtractionResult,
    ) {
        let Some(claim_id) = &claim.claim_id else {
            tracing::debug!("No claim record supplied, skipping audit write");
            return;
        };

        let mut notes = verdict.notes.clone();
        if let Some(value) = extraction.value {
            notes.push_str(&format!(" Extracted: {} steps.", format_number(value)));
        }
        if let Some(date) = &extraction.date {
            notes.push_str(&format!(" Date: {}.", date));
        }

        let fields = VerificationFields {
            verified: verdict.verified,
            tolerance: verdict.tolerance,
            extracted_km: verdict.extracted_km,
            extracted_calories: verdict.extracted_calories,
            notes,
        };

        if let Err(e) = self
            .claims
            .update_verification_fields(claim_id, &fields)
            .await
        {
            tracing::warn!(claim_id = %claim_id, error = %e, "Failed to persist verification audit");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::db::DbError;
    use crate::extractor::ExtractorError;
    use crate::model::OutcomeCode;
    use crate::proof::{ProofError, ProofObject};

    struct FixedProofStore;

    #[async_trait]
    impl ProofStore for FixedProofStore {
        async fn fetch(&self, _path: &str) -> Result<ProofObject, ProofError> {
            Ok(ProofObject {
                bytes: vec![0x89, 0x50, 0x4e, 0x47],
                mime_type: "image/png".to_string(),
            })
        }
    }

    struct MissingProofStore;

    #[async_trait]
    impl ProofStore for MissingProofStore {
        async fn fetch(&self, path: &str) -> Result<ProofObject, ProofError> {
            Err(ProofError::NotFound(path.to_string()))
        }
    }

    enum ExtractorScript {
        Text(String),
        Timeout,
        RateLimited,
    }

    struct ScriptedExtractor(ExtractorScript);

    #[async_trait]
    impl VisionExtractor for ScriptedExtractor {
        async fn extract_text(
            &self,
            _prompt: &str,
            _image: &[u8],
            _mime_type: &str,
        ) -> Result<String, ExtractorError> {
            match &self.0 {
                ExtractorScript::Text(text) => Ok(text.clone()),
                ExtractorScript::Timeout => Err(ExtractorError::Timeout(30_000)),
                ExtractorScript::RateLimited => Err(ExtractorError::RateLimited {
                    retry_after_seconds: 60,
                }),
            }
        }
    }

    struct RecordingClaimStore {
        calls: Mutex<Vec<(String, VerificationFields)>>,
        fail: bool,
    }

    impl RecordingClaimStore {
        fn new(fail: bool) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl ClaimStore for RecordingClaimStore {
        async fn update_verification_fields(
            &self,
            claim_id: &str,
            fields: &VerificationFields,
        ) -> Result<(), DbError> {
            self.calls
                .lock()
                .unwrap()
                .push((claim_id.to_string(), fields.clone()));
            if self.fail {
                Err(DbError::NotFound(claim_id.to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn claim(claimed_value: f64, claim_id: Option<&str>) -> ClaimContext {
        ClaimContext {
            claimed_value,
            claimed_date: Some("2026-01-10".to_string()),
            proof_path: "user-1/run.png".to_string(),
            requester_id: "user-1".to_string(),
            league_id: None,
            claim_id: claim_id.map(|s| s.to_string()),
            filename_hint: None,
        }
    }

    fn service(
        proofs: impl ProofStore + 'static,
        extractor: ScriptedExtractor,
        claims: Arc<RecordingClaimStore>,
    ) -> VerificationService {
        VerificationService::new(Arc::new(proofs), Arc::new(extractor), claims)
    }

    #[tokio::test]
    async fn test_happy_path_verifies_and_persists() {
        let claims = Arc::new(RecordingClaimStore::new(false));
        let svc = service(
            FixedProofStore,
            ScriptedExtractor(ExtractorScript::Text(
                r#"{"value": 10100, "date": "2026-01-10", "confidence": "high", "notes": "Daily total."}"#.to_string(),
            )),
            Arc::clone(&claims),
        );

        let outcome = svc.verify(claim(10000.0, Some("claim-1"))).await;

        assert_eq!(outcome.status, 200);
        assert_eq!(outcome.code, OutcomeCode::Success);
        assert_eq!(outcome.verified, Some(true));
        assert_eq!(outcome.extracted_value, Some(10100.0));

        let calls = claims.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "claim-1");
        assert!(calls[0].1.verified);
        assert!(calls[0].1.notes.contains("Extracted: 10100 steps."));
        assert!(calls[0].1.notes.contains("Date: 2026-01-10."));
    }

    #[tokio::test]
    async fn test_no_claim_id_skips_persistence() {
        let claims = Arc::new(RecordingClaimStore::new(false));
        let svc = service(
            FixedProofStore,
            ScriptedExtractor(ExtractorScript::Text(r#"{"value": 10100}"#.to_string())),
            Arc::clone(&claims),
        );

        let outcome = svc.verify(claim(10000.0, None)).await;

        assert_eq!(outcome.code, OutcomeCode::Success);
        assert!(claims.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persist_failure_does_not_change_outcome() {
        let failing = Arc::new(RecordingClaimStore::new(true));
        let svc = service(
            FixedProofStore,
            ScriptedExtractor(ExtractorScript::Text(r#"{"value": 10100}"#.to_string())),
            Arc::clone(&failing),
        );

        let outcome = svc.verify(claim(10000.0, Some("claim-1"))).await;

        assert_eq!(failing.calls.lock().unwrap().len(), 1);
        assert!(outcome.ok);
        assert_eq!(outcome.code, OutcomeCode::Success);
        assert_eq!(outcome.status, 200);
    }

    #[tokio::test]
    async fn test_timeout_yields_classified_outcome_without_verdict() {
        let claims = Arc::new(RecordingClaimStore::new(false));
        let svc = service(
            FixedProofStore,
            ScriptedExtractor(ExtractorScript::Timeout),
            Arc::clone(&claims),
        );

        let outcome = svc.verify(claim(10000.0, Some("claim-1"))).await;

        assert_eq!(outcome.status, 504);
        assert_eq!(outcome.code, OutcomeCode::Timeout);
        assert!(outcome.should_retry);
        assert_eq!(outcome.verified, None);
        // Nothing to audit when the pipeline never reached evaluation
        assert!(claims.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_yields_retry_after() {
        let claims = Arc::new(RecordingClaimStore::new(false));
        let svc = service(
            FixedProofStore,
            ScriptedExtractor(ExtractorScript::RateLimited),
            Arc::clone(&claims),
        );

        let outcome = svc.verify(claim(10000.0, None)).await;

        assert_eq!(outcome.status, 429);
        assert_eq!(outcome.code, OutcomeCode::RateLimited);
        assert_eq!(outcome.retry_after_seconds, Some(60));
    }

    #[tokio::test]
    async fn test_missing_proof_yields_proof_unavailable() {
        let claims = Arc::new(RecordingClaimStore::new(false));
        let svc = service(
            MissingProofStore,
            ScriptedExtractor(ExtractorScript::Text(r#"{"value": 1}"#.to_string())),
            Arc::clone(&claims),
        );

        let outcome = svc.verify(claim(10000.0, None)).await;

        assert_eq!(outcome.status, 404);
        assert_eq!(outcome.code, OutcomeCode::ProofUnavailable);
        assert!(!outcome.should_retry);
    }

    #[tokio::test]
    async fn test_unparseable_response_degrades_to_verification_failed() {
        let claims = Arc::new(RecordingClaimStore::new(false));
        let svc = service(
            FixedProofStore,
            ScriptedExtractor(ExtractorScript::Text(
                "I am unable to read this image.".to_string(),
            )),
            Arc::clone(&claims),
        );

        let outcome = svc.verify(claim(10000.0, Some("claim-1"))).await;

        // Not an error: the pipeline ran to a normal negative verdict
        assert_eq!(outcome.status, 200);
        assert_eq!(outcome.code, OutcomeCode::VerificationFailed);
        assert_eq!(outcome.verified, Some(false));
        assert_eq!(outcome.difference, None);
        assert!(outcome.notes.unwrap().contains("Could not extract"));
        // The negative verdict is still audited
        assert_eq!(claims.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_auto_extract_accepts_positive_reading() {
        let claims = Arc::new(RecordingClaimStore::new(false));
        let svc = service(
            FixedProofStore,
            ScriptedExtractor(ExtractorScript::Text(
                r#"{"value": 8432, "confidence": "medium"}"#.to_string(),
            )),
            Arc::clone(&claims),
        );

        let mut c = claim(0.0, None);
        c.claimed_date = None;
        let outcome = svc.verify(c).await;

        assert_eq!(outcome.code, OutcomeCode::Success);
        assert_eq!(outcome.verified, Some(true));
        assert_eq!(outcome.extracted_value, Some(8432.0));
        assert_eq!(outcome.tolerance, Some(0.0));
    }
}
