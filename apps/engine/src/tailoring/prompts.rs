//! Prompt Compiler — builds the generation instruction from résumé text,
//! job description, tailoring mode, and accumulated feedback.
//!
//! Pure function of its inputs; no side effects. Templates follow the
//! `.replace()`-slot convention used across the codebase.

use crate::llm_client::prompts::{NO_FABRICATION_INSTRUCTION, PLAIN_TEXT_OUTPUT_INSTRUCTION};
use crate::models::resume::{TailoringJob, TailoringMode};

/// System prompt for tailoring calls — plain résumé text out, nothing else.
pub const TAILOR_SYSTEM: &str = "You are an expert resume writer tailoring a \
    candidate's resume to a specific job description. \
    You rewrite only within the editing constraints you are given. \
    You MUST return only the tailored resume text with no commentary.";

const BASIC_MODE_CONSTRAINTS: &str = "\
EDITING CONSTRAINTS (basic mode):
- Do NOT restructure the resume or reorder, add, or remove sections
- Limit changes to substituting and weaving in job-relevant keywords
- Keep every sentence's original structure wherever possible";

const PERSONALIZED_MODE_CONSTRAINTS: &str = "\
EDITING CONSTRAINTS (personalized mode):
- You may fully rewrite sentences and paragraphs
- Preserve the candidate's authorial tone and voice as detected in the original
- Keep the existing section structure";

const AGGRESSIVE_MODE_CONSTRAINTS: &str = "\
EDITING CONSTRAINTS (aggressive mode):
- You may restructure sections and rewrite content freely
- Maximize use of the job description's terminology wherever the original
  content supports it";

/// Template slots: {mode_constraints}, {no_fabrication}, {feedback_block},
/// {resume}, {job_description}, {output_instruction}.
const TAILOR_PROMPT_TEMPLATE: &str = "\
Tailor the resume below to the job description.

{mode_constraints}

{no_fabrication}

{feedback_block}RESUME:
{resume}
JOB DESCRIPTION:
{job_description}

{output_instruction}";

fn mode_constraints(mode: TailoringMode) -> &'static str {
    match mode {
        TailoringMode::Basic => BASIC_MODE_CONSTRAINTS,
        TailoringMode::Personalized => PERSONALIZED_MODE_CONSTRAINTS,
        TailoringMode::Aggressive => AGGRESSIVE_MODE_CONSTRAINTS,
    }
}

/// Compiles the generation prompt for one attempt. `feedback` is the ordered
/// accumulation of prior-attempt feedback for this job (empty on attempt 1 of
/// a first-pass job; refinements start with the carried-forward feedback).
pub fn compile(job: &TailoringJob, resume_text: &str, feedback: &[String]) -> String {
    let feedback_block = if feedback.is_empty() {
        String::new()
    } else {
        let bullets = feedback
            .iter()
            .map(|item| format!("- {item}"))
            .collect::<Vec<_>>()
            .join("\n");
        format!("FEEDBACK FROM PRIOR ATTEMPTS (address every point):\n{bullets}\n\n")
    };

    TAILOR_PROMPT_TEMPLATE
        .replace("{mode_constraints}", mode_constraints(job.mode))
        .replace("{no_fabrication}", NO_FABRICATION_INSTRUCTION)
        .replace("{feedback_block}", &feedback_block)
        .replace("{resume}", resume_text)
        .replace("{job_description}", &job.job_description)
        .replace("{output_instruction}", PLAIN_TEXT_OUTPUT_INSTRUCTION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_job(mode: TailoringMode, is_refinement: bool, prior: Vec<String>) -> TailoringJob {
        TailoringJob {
            resume_id: Uuid::new_v4(),
            original_text: "HEADER\nJane Doe".to_string(),
            job_description: "Senior Rust engineer: Python, cloud, leadership".to_string(),
            mode,
            is_refinement,
            prior_feedback: prior,
        }
    }

    #[test]
    fn test_compile_includes_resume_and_jd_verbatim() {
        let job = sample_job(TailoringMode::Basic, false, vec![]);
        let prompt = compile(&job, &job.original_text, &[]);
        assert!(prompt.contains("RESUME:\nHEADER\nJane Doe\n"));
        assert!(prompt.contains("JOB DESCRIPTION:\nSenior Rust engineer"));
    }

    #[test]
    fn test_basic_mode_forbids_restructuring() {
        let job = sample_job(TailoringMode::Basic, false, vec![]);
        let prompt = compile(&job, &job.original_text, &[]);
        assert!(prompt.contains("basic mode"));
        assert!(prompt.contains("Do NOT restructure"));
    }

    #[test]
    fn test_personalized_mode_preserves_tone_and_forbids_fabrication() {
        let job = sample_job(TailoringMode::Personalized, false, vec![]);
        let prompt = compile(&job, &job.original_text, &[]);
        assert!(prompt.contains("authorial tone"));
        assert!(prompt.contains("Do NOT invent"));
    }

    #[test]
    fn test_aggressive_mode_still_forbids_fabrication() {
        let job = sample_job(TailoringMode::Aggressive, false, vec![]);
        let prompt = compile(&job, &job.original_text, &[]);
        assert!(prompt.contains("restructure sections"));
        assert!(prompt.contains("Do NOT invent"));
    }

    #[test]
    fn test_no_feedback_block_on_first_attempt() {
        let job = sample_job(TailoringMode::Basic, false, vec![]);
        let prompt = compile(&job, &job.original_text, &[]);
        assert!(!prompt.contains("FEEDBACK FROM PRIOR ATTEMPTS"));
    }

    #[test]
    fn test_feedback_rendered_as_bullets_in_order() {
        let job = sample_job(TailoringMode::Basic, false, vec![]);
        let feedback = vec![
            "Add cloud keywords".to_string(),
            "Quantify leadership outcomes".to_string(),
        ];
        let prompt = compile(&job, &job.original_text, &feedback);
        let first = prompt.find("- Add cloud keywords").unwrap();
        let second = prompt.find("- Quantify leadership outcomes").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_refinement_prior_feedback_appears_in_first_prompt() {
        let prior = vec!["Emphasize Python and cloud work".to_string()];
        let job = sample_job(TailoringMode::Personalized, true, prior.clone());
        let prompt = compile(&job, &job.original_text, &job.prior_feedback);
        assert!(prompt.contains("Emphasize Python and cloud work"));
    }

    #[test]
    fn test_output_instruction_demands_plain_text() {
        let job = sample_job(TailoringMode::Basic, false, vec![]);
        let prompt = compile(&job, &job.original_text, &[]);
        assert!(prompt.contains("Return ONLY the tailored resume text"));
    }
}
