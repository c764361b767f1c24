//! Prompt construction for proof-image extraction
//!
//! The prompt is deterministic given the claim context and the current date.
//! Everything the extractor needs to resolve relative or partial dates is
//! embedded as absolute ISO anchors, because proof screenshots say "today",
//! "yesterday", or "Sat, 22 Nov" in whatever locale the phone was set to.

use chrono::{Datelike, Duration, NaiveDate};

use crate::model::ClaimContext;

/// Standing instruction describing the task, the reading rules, and the
/// confidence policy the extractor must self-apply.
const EXTRACTION_RULES: &str = r#"## Reading Rules

1. **Prefer the recorded value over a goal.** Fitness apps display a target
   ("Goal: 10,000") next to the actual count. Always extract the actual
   recorded value, never the goal or target.
2. **Partial-day displays are valid.** A "so far today" or mid-day reading is
   a legitimate extraction; report the partial value with "medium" confidence.
3. **An explicit zero is a reading.** If the screen clearly shows 0 steps,
   report value 0. Only report null when no value can be read at all.
4. **Report what you see.** If the image is unreadable, unrelated to activity
   tracking, or shows no usable number, return null for value and explain in
   notes.

## Confidence Policy

Self-report confidence for your primary value:
- "high": the primary metric is unambiguous and the date is explicit.
- "medium": minor inference was needed (small text, inferred date, slight blur,
  partial-day reading).
- "low": any of: the image is rotated more than 15 degrees, multiple candidate
  totals are visible, the screen shows a weekly or aggregate view instead of a
  daily one, or you are less than 70% sure of the reading.
- null: the image is unreadable or unrelated.

## Output

Return exactly one JSON object, and nothing else, with these fields:
{
  "value": <number|null>  // daily step count read from the image
  "distance_km": <number|null>
  "calories": <number|null>
  "date": <"YYYY-MM-DD"|null>  // the date the reading is for, resolved to ISO
  "confidence": <"high"|"medium"|"low"|null>
  "notes": <string>  // one or two sentences on what you saw and any caveats
}"#;

/// Build the extraction instruction for a claim. Deterministic given `today`.
pub fn build_extraction_prompt(claim: &ClaimContext, today: NaiveDate) -> String {
    let mut prompt = String::from(
        "You are reading a screenshot from a fitness or step-tracking app. \
         Extract the activity data it shows.\n\n",
    );

    prompt.push_str(&date_context(today));
    prompt.push('\n');
    prompt.push_str(&claim_context(claim));
    prompt.push('\n');
    prompt.push_str(EXTRACTION_RULES);

    prompt
}

/// Absolute date anchors plus the relative-date vocabulary across the locales
/// proof images are captured in.
fn date_context(today: NaiveDate) -> String {
    let yesterday = today - Duration::days(1);
    let two_days_ago = today - Duration::days(2);
    let three_days_ago = today - Duration::days(3);

    format!(
        r#"## Date Context

- Today is {today} (year {year}).
- Yesterday was {yesterday}.
- 2 days ago was {two_days_ago}.
- 3 days ago was {three_days_ago}.

The screenshot may label its reading with a relative word in any language.
Resolve these to the anchors above:
- English: "today" = {today}, "yesterday" = {yesterday}
- Chinese: "今天" = {today}, "昨天" = {yesterday}
- Spanish: "hoy" = {today}, "ayer" = {yesterday}
- German: "heute" = {today}, "gestern" = {yesterday}
- Korean: "오늘" = {today}, "어제" = {yesterday}
- French: "aujourd'hui" = {today}, "hier" = {yesterday}

Partial dates without a year (e.g. "Sat, 22 Nov") belong to year {year} unless
that would put them in the future, in which case use the previous year.
"#,
        today = today.format("%Y-%m-%d"),
        yesterday = yesterday.format("%Y-%m-%d"),
        two_days_ago = two_days_ago.format("%Y-%m-%d"),
        three_days_ago = three_days_ago.format("%Y-%m-%d"),
        year = today.year(),
    )
}

/// What the user asserted, if anything. An asserted value helps disambiguate
/// between multiple numbers on screen; it is never a value to blindly confirm.
fn claim_context(claim: &ClaimContext) -> String {
    let mut section = String::from("## Claim Context\n\n");

    if claim.is_auto_extract() {
        section.push_str(
            "The user has not asserted a value. There is no claim to check: \
             report your own best-effort reading of the image.\n",
        );
    } else {
        section.push_str(&format!(
            "The user claims {} steps. Use this only to pick between multiple \
             candidate numbers on screen; do not let it override what the image \
             actually shows.\n",
            format_number(claim.claimed_value)
        ));
        if let Some(date) = &claim.claimed_date {
            section.push_str(&format!("The claim is for the date {}.\n", date));
        }
    }

    if let Some(hint) = &claim.filename_hint {
        section.push_str(&format!(
            "The original upload filename was \"{}\"; it may carry a capture date.\n",
            hint
        ));
    }

    section
}

/// Render a numeric value without a trailing ".0" for whole numbers
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(claimed_value: f64) -> ClaimContext {
        ClaimContext {
            claimed_value,
            claimed_date: Some("2026-01-10".to_string()),
            proof_path: "user-1/run.png".to_string(),
            requester_id: "user-1".to_string(),
            league_id: None,
            claim_id: None,
            filename_hint: None,
        }
    }

    fn anchor_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 12).unwrap()
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = build_extraction_prompt(&claim(10000.0), anchor_date());
        let b = build_extraction_prompt(&claim(10000.0), anchor_date());

        assert_eq!(a, b);
    }

    #[test]
    fn test_date_anchors_are_absolute() {
        let prompt = build_extraction_prompt(&claim(10000.0), anchor_date());

        assert!(prompt.contains("Today is 2026-01-12"));
        assert!(prompt.contains("Yesterday was 2026-01-11"));
        assert!(prompt.contains("2 days ago was 2026-01-10"));
        assert!(prompt.contains("3 days ago was 2026-01-09"));
        assert!(prompt.contains("year 2026"));
    }

    #[test]
    fn test_anchors_cross_month_boundary() {
        let prompt = build_extraction_prompt(
            &claim(10000.0),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        );

        assert!(prompt.contains("Yesterday was 2026-02-28"));
    }

    #[test]
    fn test_multilingual_vocabulary() {
        let prompt = build_extraction_prompt(&claim(10000.0), anchor_date());

        for word in ["today", "今天", "hoy", "heute", "오늘", "aujourd'hui"] {
            assert!(prompt.contains(word), "missing today-word {word}");
        }
        for word in ["yesterday", "昨天", "ayer", "gestern", "어제", "hier"] {
            assert!(prompt.contains(word), "missing yesterday-word {word}");
        }
    }

    #[test]
    fn test_claim_mode_includes_asserted_value_and_date() {
        let prompt = build_extraction_prompt(&claim(12500.0), anchor_date());

        assert!(prompt.contains("The user claims 12500 steps"));
        assert!(prompt.contains("the date 2026-01-10"));
        assert!(!prompt.contains("no claim to check"));
    }

    #[test]
    fn test_auto_extract_mode_signals_no_claim() {
        let prompt = build_extraction_prompt(&claim(0.0), anchor_date());

        assert!(prompt.contains("no claim to check"));
        assert!(!prompt.contains("The user claims"));
    }

    #[test]
    fn test_filename_hint_is_passed_through() {
        let mut c = claim(10000.0);
        c.filename_hint = Some("Screenshot_2026-01-10.png".to_string());
        let prompt = build_extraction_prompt(&c, anchor_date());

        assert!(prompt.contains("Screenshot_2026-01-10.png"));
    }

    #[test]
    fn test_confidence_policy_and_edge_rules_present() {
        let prompt = build_extraction_prompt(&claim(10000.0), anchor_date());

        assert!(prompt.contains("never the goal or target"));
        assert!(prompt.contains("\"medium\""));
        assert!(prompt.contains("weekly or aggregate view"));
        assert!(prompt.contains("report value 0"));
    }
}
