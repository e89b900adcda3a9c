//! Tailor Engine — the résumé tailoring convergence loop.
//!
//! The engine takes a stored résumé, a target job description, and a tailoring
//! mode, then repeatedly generates a tailored draft, scores it, validates it
//! against deterministic golden rules, and retries with accumulated feedback
//! until the draft passes or the attempt budget runs out.
//!
//! Page routing, auth, billing, rendering, and export live elsewhere; this
//! crate is the in-process computation behind `start_tailoring`/`get_progress`.

pub mod config;
pub mod errors;
pub mod llm_client;
pub mod models;
pub mod store;
pub mod tailoring;

pub use config::Config;
pub use errors::EngineError;
pub use tailoring::controller::TailoringEngine;
