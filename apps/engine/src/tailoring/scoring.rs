//! Scoring Client — measures a tailored résumé against the job description
//! through the scoring model.
//!
//! Failure policy: one retry after a fixed delay for transient provider
//! errors; malformed JSON is a hard failure with no partial-parse recovery;
//! on unrecoverable failure the client degrades to fixed fallback scores
//! instead of propagating. Scoring must never abort the convergence loop.

use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{strip_json_fences, CompletionRequest, LlmError, LlmProvider};

/// Score used for both dimensions when the scoring model is unavailable.
pub const FALLBACK_SCORE: u8 = 60;
/// Bounded prefix sent to the scoring model, in characters.
const MAX_EXCERPT_CHARS: usize = 3000;
const RETRY_DELAY_MS: u64 = 1000;
const SCORING_TEMPERATURE: f32 = 0.0;

/// Template slots: {resume_excerpt}, {jd_excerpt}.
const SCORING_PROMPT_TEMPLATE: &str = r#"Evaluate how well the resume below matches the job description.

Return a JSON object with this EXACT schema (no extra fields):
{
  "ats_score": 0,
  "jd_score": 0,
  "ats_feedback": "How to improve automated applicant-tracking compatibility",
  "jd_feedback": "How to improve alignment with this specific job"
}

Scoring rules:
- "ats_score": 0-100, compatibility with automated applicant-tracking parsing
  (standard section headers, parseable formatting, relevant keywords)
- "jd_score": 0-100, alignment between resume content and this job description
- Feedback strings must be concrete and actionable, one or two sentences each

RESUME:
{resume_excerpt}

JOB DESCRIPTION:
{jd_excerpt}"#;

/// Strict scoring payload. Missing fields fail deserialization outright —
/// no best-effort extraction.
#[derive(Debug, Deserialize)]
struct RawScorePayload {
    ats_score: f64,
    jd_score: f64,
    ats_feedback: String,
    jd_feedback: String,
}

/// Clamped, integer scores plus feedback. `degraded` marks fallback results.
#[derive(Debug, Clone)]
pub struct ScoreReport {
    pub ats_score: u8,
    pub jd_score: u8,
    pub ats_feedback: String,
    pub jd_feedback: String,
    pub degraded: bool,
}

impl ScoreReport {
    fn fallback(reason: &str) -> Self {
        ScoreReport {
            ats_score: FALLBACK_SCORE,
            jd_score: FALLBACK_SCORE,
            ats_feedback: format!("Scoring unavailable: {reason}"),
            jd_feedback: format!("Scoring unavailable: {reason}"),
            degraded: true,
        }
    }
}

pub struct ScoringClient {
    provider: Arc<dyn LlmProvider>,
}

impl ScoringClient {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Scores the résumé against the job description. Infallible by design:
    /// any unrecoverable failure yields fallback scores with an annotation.
    pub async fn score(&self, resume_text: &str, job_description: &str) -> ScoreReport {
        let request = CompletionRequest {
            prompt: SCORING_PROMPT_TEMPLATE
                .replace("{resume_excerpt}", truncate_chars(resume_text, MAX_EXCERPT_CHARS))
                .replace("{jd_excerpt}", truncate_chars(job_description, MAX_EXCERPT_CHARS)),
            system: JSON_ONLY_SYSTEM.to_string(),
            temperature: SCORING_TEMPERATURE,
        };

        let raw = match self.complete_with_retry(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Scoring call failed, degrading to fallback scores: {e}");
                return ScoreReport::fallback(&e.to_string());
            }
        };

        match serde_json::from_str::<RawScorePayload>(strip_json_fences(&raw)) {
            Ok(payload) => ScoreReport {
                ats_score: clamp_score(payload.ats_score),
                jd_score: clamp_score(payload.jd_score),
                ats_feedback: payload.ats_feedback,
                jd_feedback: payload.jd_feedback,
                degraded: false,
            },
            Err(e) => {
                warn!("Scoring response was not valid JSON, degrading: {e}");
                ScoreReport::fallback(&format!("malformed scoring response: {e}"))
            }
        }
    }

    /// One retry after a fixed delay, and only for transient failures.
    async fn complete_with_retry(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        match self.provider.complete(request).await {
            Ok(text) => Ok(text),
            Err(e) if e.is_transient() => {
                warn!("Scoring call hit transient error, retrying once: {e}");
                tokio::time::sleep(std::time::Duration::from_millis(RETRY_DELAY_MS)).await;
                self.provider.complete(request).await
            }
            Err(e) => Err(e),
        }
    }
}

/// Rounds to the nearest integer and clamps into [0, 100].
fn clamp_score(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}

/// Char-boundary-safe prefix.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    /// Replays a queue of scripted outcomes, one per `complete()` call.
    struct ScriptedProvider {
        outcomes: Mutex<VecDeque<Result<String, u16>>>,
    }

    impl ScriptedProvider {
        fn new(outcomes: Vec<Result<String, u16>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
            match self.outcomes.lock().await.pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(status)) => Err(LlmError::Api {
                    status,
                    message: "scripted failure".to_string(),
                }),
                None => panic!("ScriptedProvider ran out of outcomes"),
            }
        }
    }

    const GOOD_PAYLOAD: &str = r#"{"ats_score": 88, "jd_score": 91, "ats_feedback": "Solid keyword coverage.", "jd_feedback": "Strong alignment."}"#;

    #[tokio::test]
    async fn test_well_formed_payload_is_returned() {
        let client = ScoringClient::new(ScriptedProvider::new(vec![Ok(GOOD_PAYLOAD.to_string())]));
        let report = client.score("resume text", "jd text").await;
        assert_eq!(report.ats_score, 88);
        assert_eq!(report.jd_score, 91);
        assert!(!report.degraded);
    }

    #[tokio::test]
    async fn test_fenced_payload_is_accepted() {
        let fenced = format!("```json\n{GOOD_PAYLOAD}\n```");
        let client = ScoringClient::new(ScriptedProvider::new(vec![Ok(fenced)]));
        let report = client.score("resume", "jd").await;
        assert_eq!(report.ats_score, 88);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_retries_once_then_succeeds() {
        let client = ScoringClient::new(ScriptedProvider::new(vec![
            Err(503),
            Ok(GOOD_PAYLOAD.to_string()),
        ]));
        let report = client.score("resume", "jd").await;
        assert_eq!(report.ats_score, 88);
        assert!(!report.degraded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_transient_failures_degrade_to_fallback() {
        let client = ScoringClient::new(ScriptedProvider::new(vec![Err(503), Err(503)]));
        let report = client.score("resume", "jd").await;
        assert_eq!(report.ats_score, FALLBACK_SCORE);
        assert_eq!(report.jd_score, FALLBACK_SCORE);
        assert!(report.degraded);
        assert!(report.ats_feedback.contains("Scoring unavailable"));
    }

    #[tokio::test]
    async fn test_permanent_failure_does_not_retry() {
        // Only one scripted outcome: a second call would panic the provider.
        let client = ScoringClient::new(ScriptedProvider::new(vec![Err(401)]));
        let report = client.score("resume", "jd").await;
        assert!(report.degraded);
    }

    #[tokio::test]
    async fn test_malformed_json_degrades_without_retry() {
        let client = ScoringClient::new(ScriptedProvider::new(vec![Ok(
            "the resume looks great!".to_string()
        )]));
        let report = client.score("resume", "jd").await;
        assert!(report.degraded);
        assert!(report.ats_feedback.contains("malformed"));
    }

    #[tokio::test]
    async fn test_missing_field_is_malformed() {
        let client = ScoringClient::new(ScriptedProvider::new(vec![Ok(
            r#"{"ats_score": 80, "jd_score": 75}"#.to_string(),
        )]));
        let report = client.score("resume", "jd").await;
        assert!(report.degraded);
    }

    #[tokio::test]
    async fn test_out_of_range_scores_are_clamped() {
        let client = ScoringClient::new(ScriptedProvider::new(vec![Ok(
            r#"{"ats_score": 150, "jd_score": -5, "ats_feedback": "x", "jd_feedback": "y"}"#
                .to_string(),
        )]));
        let report = client.score("resume", "jd").await;
        assert_eq!(report.ats_score, 100);
        assert_eq!(report.jd_score, 0);
    }

    #[test]
    fn test_clamp_score_rounds_to_nearest() {
        assert_eq!(clamp_score(86.5), 87);
        assert_eq!(clamp_score(86.4), 86);
        assert_eq!(clamp_score(100.0), 100);
        assert_eq!(clamp_score(-3.2), 0);
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        let text = "résumé".repeat(1000);
        let prefix = truncate_chars(&text, MAX_EXCERPT_CHARS);
        assert_eq!(prefix.chars().count(), MAX_EXCERPT_CHARS);
    }
}
