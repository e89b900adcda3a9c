// The tailoring convergence engine.
// Implements: prompt compilation, section parsing/cleaning/reconstruction,
// scoring with degradation, change tracking, golden-rule validation, and the
// attempt state machine. All LLM calls go through llm_client — no direct
// provider calls here.

pub mod changes;
pub mod controller;
pub mod golden;
pub mod prompts;
pub mod scoring;
pub mod sections;
