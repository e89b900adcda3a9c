use thiserror::Error;

/// Engine-level error type returned by the public entry points.
///
/// Failures that happen *inside* the convergence loop are absorbed into the
/// attempt and progress records rather than raised; these variants surface
/// only for caller mistakes and genuinely unrecoverable internal failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
