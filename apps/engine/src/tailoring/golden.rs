//! Golden Rule Validator — deterministic structural checks on the
//! reconstructed résumé. No network calls.
//!
//! Distinct from model-based scoring: a golden-rule failure is a correctness
//! failure (the output is not a usable résumé), while a low score is a
//! quality failure. Both consume an attempt; neither aborts the job.

use crate::tailoring::sections::has_generation_artifacts;

/// Minimum character count for a plausible résumé.
pub const MIN_RESUME_LENGTH: usize = 200;

/// How many leading non-empty lines may hold the contact block.
const CONTACT_SCAN_LINES: usize = 6;

#[derive(Debug, Clone)]
pub struct GoldenReport {
    pub passed: bool,
    /// Names of violated rules, stable identifiers suitable for feedback.
    pub violations: Vec<String>,
}

/// Applies every golden rule to the reconstructed résumé text.
pub fn validate(text: &str) -> GoldenReport {
    let mut violations = Vec::new();

    if text.trim().is_empty() {
        violations.push("non_empty".to_string());
        // Everything else fails vacuously on empty input; report just the root cause.
        return GoldenReport {
            passed: false,
            violations,
        };
    }

    if text.trim().chars().count() < MIN_RESUME_LENGTH {
        violations.push("min_length".to_string());
    }

    if !has_contact_block(text) {
        violations.push("contact_block".to_string());
    }

    if has_generation_artifacts(text) {
        violations.push("no_artifacts".to_string());
    }

    GoldenReport {
        passed: violations.is_empty(),
        violations,
    }
}

/// The contact/header block must appear near the top: an email address or a
/// phone-like digit run within the first few non-empty lines.
fn has_contact_block(text: &str) -> bool {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .take(CONTACT_SCAN_LINES)
        .any(|line| {
            line.contains('@') || line.chars().filter(|c| c.is_ascii_digit()).count() >= 7
        })
}
