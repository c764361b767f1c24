//! Deterministic evaluation of a claim against an extraction
//!
//! Pure function, no I/O. Two modes, selected solely by the claimed value:
//! auto-extract (claimed 0, accept any positive reading) and claim
//! verification (tolerance-band comparison). Date mismatches and low
//! confidence are advisory: they add notes, never flip the verdict.

use super::prompts::format_number;
use crate::model::{ClaimContext, Confidence, ExtractionResult, Verdict};

/// Relative tolerance band for claim verification
const TOLERANCE_RATIO: f64 = 0.03;

/// Floor on the tolerance band, so small claims are not held to an
/// unrealistically tight absolute tolerance
const TOLERANCE_FLOOR: f64 = 300.0;

/// Allowed absolute deviation for a claimed value
pub fn tolerance_for(claimed_value: f64) -> f64 {
    (claimed_value * TOLERANCE_RATIO).round().max(TOLERANCE_FLOOR)
}

/// Evaluate the claim against the validated extraction
pub fn evaluate(claim: &ClaimContext, extraction: &ExtractionResult) -> Verdict {
    let mut notes: Vec<String> = Vec::new();

    let comparison = if claim.is_auto_extract() {
        evaluate_auto_extract(extraction)
    } else {
        evaluate_against_claim(claim, extraction)
    };
    let Comparison {
        verified,
        tolerance,
        difference,
        primary_note,
        magnitude_note,
    } = comparison;

    // Notes in decreasing order of importance: this string is the only audit
    // trail a human reviewer sees.
    if let Some(note) = primary_note {
        notes.push(note);
    }

    // Advisory only: a date mismatch is worth flagging for a human reviewer,
    // but screenshots are routinely taken the morning after.
    if let (Some(claimed_date), Some(extracted_date)) = (&claim.claimed_date, &extraction.date) {
        if claimed_date != extracted_date {
            notes.push(format!(
                "Date mismatch: claim is for {}, proof shows {}.",
                claimed_date, extracted_date
            ));
        }
    }

    if let Some(note) = magnitude_note {
        notes.push(note);
    }

    if extraction.confidence == Some(Confidence::Low) {
        notes.push("Extraction confidence is low; manual review recommended.".to_string());
    }

    if !extraction.notes.trim().is_empty() {
        notes.push(extraction.notes.trim().to_string());
    }

    let notes = if notes.is_empty() {
        if verified {
            "Verification succeeded.".to_string()
        } else {
            "Verification failed.".to_string()
        }
    } else {
        notes.join(" ")
    };

    Verdict {
        verified,
        tolerance,
        difference,
        notes,
        extracted_km: extraction.distance_km,
        extracted_calories: extraction.calories,
    }
}

/// Mode-specific comparison result, notes kept separate so the final trail
/// can interleave advisory notes at the right priority
struct Comparison {
    verified: bool,
    tolerance: f64,
    difference: Option<f64>,
    primary_note: Option<String>,
    magnitude_note: Option<String>,
}

/// No claim to diff against: any positive extracted value is accepted at face value.
fn evaluate_auto_extract(extraction: &ExtractionResult) -> Comparison {
    let (verified, difference, primary_note) = match extraction.value {
        Some(value) if value > 0.0 => (
            true,
            Some(0.0),
            format!("Auto-extracted {} steps.", format_number(value)),
        ),
        Some(_) => (
            false,
            Some(0.0),
            "Could not extract a positive value from the proof image.".to_string(),
        ),
        None => (
            false,
            None,
            "Could not extract a value from the proof image.".to_string(),
        ),
    };

    Comparison {
        verified,
        tolerance: 0.0,
        difference,
        primary_note: Some(primary_note),
        magnitude_note: None,
    }
}

/// Tolerance-band comparison of the extracted value against the claim
fn evaluate_against_claim(claim: &ClaimContext, extraction: &ExtractionResult) -> Comparison {
    let tolerance = tolerance_for(claim.claimed_value);

    let Some(value) = extraction.value else {
        return Comparison {
            verified: false,
            tolerance,
            difference: None,
            primary_note: Some("Could not extract a value from the proof image.".to_string()),
            magnitude_note: None,
        };
    };

    let difference = (value - claim.claimed_value).abs();
    let verified = difference <= tolerance;

    let magnitude_note = (!verified).then(|| {
        format!(
            "Extracted {} steps differs from the claimed {} by {} (tolerance {}).",
            format_number(value),
            format_number(claim.claimed_value),
            format_number(difference),
            format_number(tolerance)
        )
    });

    Comparison {
        verified,
        tolerance,
        difference: Some(difference),
        primary_note: None,
        magnitude_note,
    }
}
