//! Convergence Controller — the attempt state machine that drives tailoring.
//!
//! Flow per attempt: compile prompt → generate → parse/clean/reconstruct →
//! track changes → score → golden-rule validation → persist attempt record →
//! decide (stop/retry). The controller is the sole caller of every other
//! tailoring component and the only writer of a job's attempt and progress
//! records.
//!
//! Failure semantics: generation failures are retried inside the attempt,
//! then consume the attempt; scoring failures degrade to fallback scores;
//! golden-rule failures and low scores trigger another attempt until the
//! budget runs out. Budget exhaustion is a business outcome, not an error:
//! the job completes with its best attempt. `Failed` is reserved for jobs
//! where no attempt ever produced output, or an unexpected internal error.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::anyhow;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::EngineError;
use crate::llm_client::{CompletionRequest, LlmError, LlmProvider};
use crate::models::resume::{
    JobStatus, TailoringAttempt, TailoringJob, TailoringProgress,
};
use crate::store::TailoringStore;
use crate::tailoring::changes::track_changes;
use crate::tailoring::golden;
use crate::tailoring::prompts::{self, TAILOR_SYSTEM};
use crate::tailoring::scoring::ScoringClient;
use crate::tailoring::sections::{extract_sections, reconstruct_from_sections};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Both scores must reach this, with golden rules passing, to stop early.
pub const DEFAULT_PASS_THRESHOLD: u8 = 95;

/// Extra generation calls per attempt after the first one fails.
const MAX_GENERATION_RETRIES: u32 = 2;
/// Fixed delay between generation retries. Deliberately not exponential.
const GENERATION_RETRY_DELAY_MS: u64 = 1000;

/// Acknowledgment returned by `start_tailoring`. The job itself runs as a
/// spawned task; callers poll `get_progress` for liveness.
#[derive(Debug, Clone, Serialize)]
pub struct StartAck {
    pub resume_id: Uuid,
    pub max_attempts: u32,
}

/// The engine façade: owns the provider, the scoring client, and the store,
/// and exposes the two outward entry points.
pub struct TailoringEngine {
    store: Arc<dyn TailoringStore>,
    llm: Arc<dyn LlmProvider>,
    scoring: ScoringClient,
    max_attempts: u32,
    pass_threshold: u8,
    /// Per-resume single-flight guard: at most one running job per résumé id.
    in_flight: Mutex<HashSet<Uuid>>,
}

/// The surviving output of one attempt, kept so the best one can be
/// persisted at terminal time.
struct AttemptOutcome {
    text: String,
    record: TailoringAttempt,
}

/// Golden pass beats any score sum; among equals, higher combined score wins.
fn outcome_rank(outcome: &AttemptOutcome) -> (bool, u16) {
    (
        outcome.record.golden_passed,
        outcome.record.ats_score as u16 + outcome.record.jd_score as u16,
    )
}

fn running_progress(attempt: u32, max_attempts: u32) -> u8 {
    (5 + ((attempt - 1) * 90) / max_attempts.max(1)).min(100) as u8
}

impl TailoringEngine {
    pub fn new(
        store: Arc<dyn TailoringStore>,
        llm: Arc<dyn LlmProvider>,
        max_attempts: u32,
        pass_threshold: u8,
    ) -> Arc<Self> {
        Arc::new(Self {
            scoring: ScoringClient::new(llm.clone()),
            store,
            llm,
            max_attempts: max_attempts.max(1),
            pass_threshold,
            in_flight: Mutex::new(HashSet::new()),
        })
    }

    pub fn from_config(
        store: Arc<dyn TailoringStore>,
        llm: Arc<dyn LlmProvider>,
        config: &Config,
    ) -> Arc<Self> {
        Self::new(store, llm, config.max_attempts, config.pass_threshold)
    }

    /// Kicks off a tailoring job asynchronously. Rejects unknown résumés,
    /// empty inputs, and a second concurrent start for the same résumé id.
    pub async fn start_tailoring(
        self: &Arc<Self>,
        resume_id: Uuid,
        is_refinement: bool,
    ) -> Result<StartAck, EngineError> {
        let resume = self
            .store
            .get_resume(resume_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("resume {resume_id}")))?;

        if resume.text.trim().is_empty() {
            return Err(EngineError::Validation("resume text is empty".to_string()));
        }
        if resume.job_description.trim().is_empty() {
            return Err(EngineError::Validation(
                "job description is empty".to_string(),
            ));
        }

        if !self.in_flight.lock().await.insert(resume_id) {
            return Err(EngineError::Conflict(format!(
                "tailoring already in progress for resume {resume_id}"
            )));
        }

        match self.prepare_job(resume_id, is_refinement).await {
            Ok(job) => {
                let engine = Arc::clone(self);
                tokio::spawn(async move { engine.run_job(job).await });
                Ok(StartAck {
                    resume_id,
                    max_attempts: self.max_attempts,
                })
            }
            Err(e) => {
                self.in_flight.lock().await.remove(&resume_id);
                Err(e)
            }
        }
    }

    /// The polling surface callers use for liveness.
    pub async fn get_progress(&self, resume_id: Uuid) -> Result<TailoringProgress, EngineError> {
        self.store
            .get_progress(resume_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("no tailoring job for resume {resume_id}")))
    }

    /// Snapshots lineage for refinements, writes the pending progress record,
    /// and builds the immutable job.
    async fn prepare_job(
        &self,
        resume_id: Uuid,
        is_refinement: bool,
    ) -> Result<TailoringJob, EngineError> {
        if is_refinement {
            let parent_id = self.store.snapshot_parent(resume_id).await?;
            info!("Refinement of resume {resume_id}: archived parent {parent_id}");
        }

        let resume = self
            .store
            .get_resume(resume_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("resume {resume_id}")))?;

        self.store
            .put_progress(resume_id, TailoringProgress::pending(self.max_attempts))
            .await?;

        Ok(TailoringJob {
            resume_id,
            original_text: resume.text,
            job_description: resume.job_description,
            mode: resume.mode,
            is_refinement,
            prior_feedback: if is_refinement { resume.feedback } else { Vec::new() },
        })
    }

    /// Task body. Whatever happens inside, the progress record ends in a
    /// terminal state and the single-flight slot is released.
    async fn run_job(self: Arc<Self>, job: TailoringJob) {
        let resume_id = job.resume_id;
        if let Err(e) = self.run_attempt_loop(&job).await {
            error!("Tailoring job for resume {resume_id} aborted: {e:#}");
            let mut progress = match self.store.get_progress(resume_id).await {
                Ok(Some(p)) => p,
                _ => TailoringProgress::pending(self.max_attempts),
            };
            progress.status = JobStatus::Failed;
            progress.progress = 100;
            progress.error = Some(format!("internal error: {e}"));
            if let Err(e2) = self.store.put_progress(resume_id, progress).await {
                error!("Failed to persist terminal progress for resume {resume_id}: {e2:#}");
            }
        }
        self.in_flight.lock().await.remove(&resume_id);
    }

    async fn run_attempt_loop(&self, job: &TailoringJob) -> anyhow::Result<()> {
        let original_sections = extract_sections(&job.original_text);
        let mut feedback = job.prior_feedback.clone();
        let mut best: Option<AttemptOutcome> = None;
        let mut final_attempt = 0;

        for attempt in 1..=self.max_attempts {
            final_attempt = attempt;
            self.store
                .put_progress(
                    job.resume_id,
                    TailoringProgress {
                        status: JobStatus::Running,
                        progress: running_progress(attempt, self.max_attempts),
                        current_attempt: attempt,
                        max_attempts: self.max_attempts,
                        error: None,
                    },
                )
                .await?;

            info!(
                "Tailoring attempt {attempt}/{} for resume {} (mode {:?})",
                self.max_attempts, job.resume_id, job.mode
            );

            let prompt = prompts::compile(job, &job.original_text, &feedback);
            let generated = match self
                .generate_with_retry(&prompt, job.mode.temperature())
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    warn!(
                        "Attempt {attempt} for resume {} produced no output: {e}",
                        job.resume_id
                    );
                    self.store
                        .append_attempt(
                            job.resume_id,
                            TailoringAttempt {
                                attempt_number: attempt,
                                ats_score: 0,
                                jd_score: 0,
                                golden_passed: false,
                                feedback: format!("Generation failed: {e}"),
                                suggestions: String::new(),
                                modified_sections: vec![],
                            },
                        )
                        .await?;
                    continue;
                }
            };

            let mut sections = extract_sections(&generated);
            sections.clean_contents();
            let final_text = reconstruct_from_sections(&sections);

            let changes = track_changes(&original_sections, &sections, attempt, job.is_refinement);
            let scores = self.scoring.score(&final_text, &job.job_description).await;
            let report = golden::validate(&final_text);

            info!(
                "Attempt {attempt} for resume {}: ats={} jd={} golden={} modified={:?}",
                job.resume_id,
                scores.ats_score,
                scores.jd_score,
                report.passed,
                changes.modified_sections
            );

            let record = TailoringAttempt {
                attempt_number: attempt,
                ats_score: scores.ats_score,
                jd_score: scores.jd_score,
                golden_passed: report.passed,
                feedback: scores.ats_feedback.clone(),
                suggestions: scores.jd_feedback.clone(),
                modified_sections: changes.modified_sections.clone(),
            };
            self.store.append_attempt(job.resume_id, record.clone()).await?;

            let outcome = AttemptOutcome {
                text: final_text,
                record,
            };
            if best
                .as_ref()
                .map(|current| outcome_rank(&outcome) > outcome_rank(current))
                .unwrap_or(true)
            {
                best = Some(outcome);
            }

            // Fold this attempt's findings into the next prompt and into the
            // feedback persisted for future refinements. Degraded fallback
            // feedback is noise, not guidance — skip it.
            if !scores.degraded {
                feedback.push(format!("ATS feedback: {}", scores.ats_feedback));
                feedback.push(format!("Job match feedback: {}", scores.jd_feedback));
            }
            for violation in &report.violations {
                feedback.push(format!("Structural issue to fix: {violation}"));
            }

            let passed = report.passed
                && scores.ats_score >= self.pass_threshold
                && scores.jd_score >= self.pass_threshold;
            if passed {
                info!(
                    "Resume {} passed all gates on attempt {attempt}",
                    job.resume_id
                );
                break;
            }
        }

        match best {
            Some(outcome) => {
                let mut resume = self
                    .store
                    .get_resume(job.resume_id)
                    .await?
                    .ok_or_else(|| anyhow!("resume {} disappeared mid-job", job.resume_id))?;
                resume.text = outcome.text;
                resume.ats_score = Some(outcome.record.ats_score);
                resume.jd_score = Some(outcome.record.jd_score);
                resume.golden_passed = Some(outcome.record.golden_passed);
                resume.version += 1;
                resume.feedback = feedback;
                self.store.update_resume(resume).await?;

                self.store
                    .put_progress(
                        job.resume_id,
                        TailoringProgress {
                            status: JobStatus::Completed,
                            progress: 100,
                            current_attempt: final_attempt,
                            max_attempts: self.max_attempts,
                            error: None,
                        },
                    )
                    .await?;
            }
            None => {
                self.store
                    .put_progress(
                        job.resume_id,
                        TailoringProgress {
                            status: JobStatus::Failed,
                            progress: 100,
                            current_attempt: final_attempt,
                            max_attempts: self.max_attempts,
                            error: Some("all generation attempts failed".to_string()),
                        },
                    )
                    .await?;
            }
        }

        Ok(())
    }

    /// Retries the whole generation call with a fixed delay. An empty
    /// completion counts as a failure.
    async fn generate_with_retry(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let request = CompletionRequest {
            prompt: prompt.to_string(),
            system: TAILOR_SYSTEM.to_string(),
            temperature,
        };

        let mut last_error = None;
        for call in 0..=MAX_GENERATION_RETRIES {
            if call > 0 {
                warn!(
                    "Generation call failed, retry {call}/{MAX_GENERATION_RETRIES} after fixed delay"
                );
                tokio::time::sleep(std::time::Duration::from_millis(GENERATION_RETRY_DELAY_MS))
                    .await;
            }
            match self.llm.complete(&request).await {
                Ok(text) if !text.trim().is_empty() => return Ok(text),
                Ok(_) => last_error = Some(LlmError::EmptyContent),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or(LlmError::EmptyContent))
    }
}
