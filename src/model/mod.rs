//! Domain models for activity-claim verification

pub mod config;
pub mod extraction;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use config::Config;
pub use extraction::ExtractionResult;

/// A single verification attempt's input, built once by the caller and never mutated.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClaimContext {
    /// Claimed activity value (steps). 0 is a sentinel meaning auto-extract: no claim to check.
    pub claimed_value: f64,
    /// ISO date the claim is for. Absent in auto-extract mode.
    pub claimed_date: Option<String>,
    /// Blob store path of the proof image.
    pub proof_path: String,
    pub requester_id: String,
    pub league_id: Option<String>,
    /// Durable claim record to annotate with the verdict. Absent for dry-run extraction.
    pub claim_id: Option<String>,
    /// Original upload filename, used only to help the extractor disambiguate dates.
    pub filename_hint: Option<String>,
}

impl ClaimContext {
    /// Auto-extract mode: the user asserted no value, accept the extractor's own reading.
    pub fn is_auto_extract(&self) -> bool {
        self.claimed_value == 0.0
    }
}

/// Extractor self-reported confidence in its primary reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Result of evaluating a claim against an extraction. Pure data, no I/O.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Verdict {
    pub verified: bool,
    /// Allowed absolute deviation between claimed and extracted value. Non-negative integer.
    pub tolerance: f64,
    /// Absolute difference between extracted and claimed value. None exactly when
    /// no value could be extracted.
    pub difference: Option<f64>,
    /// Human-readable rationale trail, ordered by decreasing importance. Never empty.
    pub notes: String,
    pub extracted_km: Option<f64>,
    pub extracted_calories: Option<f64>,
}

/// Stable machine-readable outcome codes, a closed taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCode {
    /// Pipeline ran and the claim was corroborated
    Success,
    /// Pipeline ran and the business verdict is negative. Not an error.
    VerificationFailed,
    /// Extraction provider signaled quota exhaustion
    RateLimited,
    /// Extractor did not respond within the bound
    Timeout,
    /// Transport-level failure reaching the extractor
    ExtractorUnreachable,
    /// Proof path missing or blob store unreachable
    ProofUnavailable,
    /// Any other unexpected failure
    InternalError,
}

/// Caller-facing envelope for a verification attempt, serialized directly as
/// the API response body. Verdict and extraction fields are flattened so a
/// calling UI can react without a second lookup.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Outcome {
    /// HTTP-like status for this outcome, also used as the response status
    pub status: u16,
    pub ok: bool,
    pub code: OutcomeCode,
    pub message: String,
    pub should_retry: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}
