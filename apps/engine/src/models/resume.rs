//! Core data shapes: résumé records, tailoring jobs, attempts, and progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Editing aggressiveness policy for a tailoring job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TailoringMode {
    /// Keyword substitution only; no structural rewrites.
    #[default]
    Basic,
    /// Full rewrite allowed, authorial tone preserved.
    Personalized,
    /// Restructuring and terminology maximization allowed.
    Aggressive,
}

impl TailoringMode {
    /// Generation temperature for this mode.
    pub fn temperature(&self) -> f32 {
        match self {
            TailoringMode::Basic => 0.4,
            TailoringMode::Personalized => 0.65,
            TailoringMode::Aggressive => 0.75,
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "basic" => Some(TailoringMode::Basic),
            "personalized" => Some(TailoringMode::Personalized),
            "aggressive" => Some(TailoringMode::Aggressive),
            _ => None,
        }
    }
}

/// One tailoring request. Immutable for the lifetime of the job.
#[derive(Debug, Clone)]
pub struct TailoringJob {
    pub resume_id: Uuid,
    pub original_text: String,
    pub job_description: String,
    pub mode: TailoringMode,
    pub is_refinement: bool,
    /// Feedback carried forward from a prior job when refining. Empty on a
    /// first pass; the controller appends per-attempt feedback as it loops.
    pub prior_feedback: Vec<String>,
}

/// One iteration of the convergence loop. Append-only, immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailoringAttempt {
    pub attempt_number: u32,
    pub ats_score: u8,
    pub jd_score: u8,
    pub golden_passed: bool,
    pub feedback: String,
    pub suggestions: String,
    pub modified_sections: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// The single mutable record callers poll for liveness. Only the job's own
/// controller writes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailoringProgress {
    pub status: JobStatus,
    pub progress: u8,
    pub current_attempt: u32,
    pub max_attempts: u32,
    /// Set when the job terminates abnormally; a job must never be left in
    /// `Running` without either completing or carrying an error annotation.
    pub error: Option<String>,
}

impl TailoringProgress {
    pub fn pending(max_attempts: u32) -> Self {
        TailoringProgress {
            status: JobStatus::Pending,
            progress: 0,
            current_attempt: 0,
            max_attempts,
            error: None,
        }
    }
}

/// Stored résumé shape at the persistence boundary.
///
/// Lineage is a single parent pointer: refining a résumé snapshots the current
/// text into an archival parent record and points `parent_id` at it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub id: Uuid,
    pub text: String,
    pub job_description: String,
    pub mode: TailoringMode,
    pub version: u32,
    pub parent_id: Option<Uuid>,
    pub ats_score: Option<u8>,
    pub jd_score: Option<u8>,
    pub golden_passed: Option<bool>,
    /// Accumulated scoring feedback from the most recent tailoring job,
    /// carried into the next refinement's prompt.
    pub feedback: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResumeRecord {
    pub fn new(text: String, job_description: String, mode: TailoringMode) -> Self {
        let now = Utc::now();
        ResumeRecord {
            id: Uuid::new_v4(),
            text,
            job_description,
            mode,
            version: 1,
            parent_id: None,
            ats_score: None,
            jd_score: None,
            golden_passed: None,
            feedback: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
