//! Extractor response model and lenient parsing
//!
//! The extraction model returns free-form text that is expected to contain one
//! JSON object, possibly wrapped in prose or code fences. Parsing is
//! validate-or-empty: a response that does not match the expected schema yields
//! an empty result and a logged warning, never an error. A strict failure here
//! would turn every minor formatting quirk of the model into a hard failure.

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::Confidence;

/// Validated structured reading of a proof image.
///
/// Any field may be absent: extraction uncertainty is first-class and is never
/// defaulted to zero unless the model explicitly reports a zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ExtractionResult {
    /// Primary metric read from the image (steps)
    pub value: Option<f64>,
    pub distance_km: Option<f64>,
    pub calories: Option<f64>,
    /// ISO date shown in the image, if any
    pub date: Option<String>,
    pub confidence: Option<Confidence>,
    /// Extractor's own free-text rationale
    pub notes: String,
    /// The raw model response, kept verbatim for auditing
    pub raw_text: String,
}

impl ExtractionResult {
    /// Empty result: nothing could be extracted. Keeps the raw response for auditing.
    pub fn empty(raw_text: &str) -> Self {
        Self {
            raw_text: raw_text.to_string(),
            ..Self::default()
        }
    }
}

/// Field names the extractor is allowed to return
const KNOWN_FIELDS: &[&str] = &["value", "distance_km", "calories", "date", "confidence", "notes"];

/// Parse a raw model response into a validated [`ExtractionResult`].
///
/// Locates the outermost `{...}` in the text, since models routinely wrap the
/// JSON in prose. Numeric fields may arrive as numeric-looking strings and are
/// coerced. Unknown or malformed fields invalidate the whole object: a partial
/// reading is not trustworthy, so the result degrades to empty.
pub fn parse_extraction(raw_text: &str) -> ExtractionResult {
    let object = match locate_json_object(raw_text) {
        Some(slice) => slice,
        None => {
            tracing::warn!("Extractor response contains no JSON object");
            return ExtractionResult::empty(raw_text);
        }
    };

    let value: Value = match serde_json::from_str(object) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "Extractor response JSON does not parse");
            return ExtractionResult::empty(raw_text);
        }
    };

    match validate_payload(&value, raw_text) {
        Some(result) => result,
        None => {
            tracing::warn!("Extractor response JSON does not match the expected schema");
            ExtractionResult::empty(raw_text)
        }
    }
}

/// Slice out the outermost `{...}` from possibly prose-wrapped text
fn locate_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

/// Validate a parsed JSON value against the expected schema, or yield None
fn validate_payload(value: &Value, raw_text: &str) -> Option<ExtractionResult> {
    let map = value.as_object()?;

    // A field we do not recognize means the object is not the one we asked for
    for key in map.keys() {
        if !KNOWN_FIELDS.contains(&key.as_str()) {
            return None;
        }
    }

    Some(ExtractionResult {
        value: numeric_field(map.get("value"))?,
        distance_km: numeric_field(map.get("distance_km"))?,
        calories: numeric_field(map.get("calories"))?,
        date: string_field(map.get("date"))?,
        confidence: confidence_field(map.get("confidence"))?,
        notes: string_field(map.get("notes"))?.unwrap_or_default(),
        raw_text: raw_text.to_string(),
    })
}

/// Accept a number, a numeric-looking string, null, or absence.
/// Returns None (schema violation) for anything else.
fn numeric_field(value: Option<&Value>) -> Option<Option<f64>> {
    match value {
        None | Some(Value::Null) => Some(None),
        Some(Value::Number(n)) => Some(n.as_f64()),
        Some(Value::String(s)) => {
            // Models sometimes return "10,250" or "10250" for numbers
            let cleaned = s.trim().replace(',', "");
            cleaned.parse::<f64>().ok().map(Some)
        }
        Some(_) => None,
    }
}

fn string_field(value: Option<&Value>) -> Option<Option<String>> {
    match value {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(s.clone())),
        Some(_) => None,
    }
}

fn confidence_field(value: Option<&Value>) -> Option<Option<Confidence>> {
    match value {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "high" => Some(Some(Confidence::High)),
            "medium" => Some(Some(Confidence::Medium)),
            "low" => Some(Some(Confidence::Low)),
            _ => None,
        },
        Some(_) => None,
    }
}
