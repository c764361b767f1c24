//! Outcome classification
//!
//! Maps the pipeline's terminal state, success or any failure, to the stable
//! code/status/retry triple callers react to. The mapping is total: every
//! error the pipeline can produce ends up in exactly one classified outcome.

use super::error::VerificationError;
use crate::extractor::ExtractorError;
use crate::model::{ExtractionResult, Outcome, OutcomeCode, Verdict};

/// Build the envelope for a completed pipeline run. A negative verdict is
/// outcome data, not an error: it still classifies as a 200.
pub fn classify_success(verdict: Verdict, extraction: ExtractionResult) -> Outcome {
    let (code, message) = if verdict.verified {
        (OutcomeCode::Success, "Claim verified.".to_string())
    } else {
        (
            OutcomeCode::VerificationFailed,
            "Claim could not be verified.".to_string(),
        )
    };

    Outcome {
        status: 200,
        ok: true,
        code,
        message,
        should_retry: false,
        retry_after_seconds: None,
        verified: Some(verdict.verified),
        tolerance: Some(verdict.tolerance),
        difference: verdict.difference,
        notes: Some(verdict.notes),
        extracted_value: extraction.value,
        extracted_km: verdict.extracted_km,
        extracted_calories: verdict.extracted_calories,
        extracted_date: extraction.date,
        confidence: extraction.confidence,
        raw_text: Some(extraction.raw_text),
    }
}

/// Classify a pipeline failure. Ordered match over the error's kind; the
/// catch-all at the bottom keeps the mapping total.
pub fn classify_error(error: &VerificationError) -> Outcome {
    let (status, code, should_retry, retry_after_seconds) = match error {
        VerificationError::Proof(_) => (404, OutcomeCode::ProofUnavailable, false, None),
        VerificationError::Extractor(ExtractorError::RateLimited {
            retry_after_seconds,
        }) => (
            429,
            OutcomeCode::RateLimited,
            true,
            Some(*retry_after_seconds),
        ),
        VerificationError::Extractor(ExtractorError::Timeout(_)) => {
            (504, OutcomeCode::Timeout, true, None)
        }
        VerificationError::Extractor(ExtractorError::Unreachable(_)) => {
            (502, OutcomeCode::ExtractorUnreachable, false, None)
        }
        VerificationError::Extractor(ExtractorError::Http(e)) if e.is_connect() => {
            (502, OutcomeCode::ExtractorUnreachable, false, None)
        }
        _ => (500, OutcomeCode::InternalError, false, None),
    };

    Outcome {
        status,
        ok: false,
        code,
        message: error.to_string(),
        should_retry,
        retry_after_seconds,
        verified: None,
        tolerance: None,
        difference: None,
        notes: None,
        extracted_value: None,
        extracted_km: None,
        extracted_calories: None,
        extracted_date: None,
        confidence: None,
        raw_text: None,
    }
}
