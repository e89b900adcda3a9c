use anyhow::{Context, Result};

/// Which LLM backend the engine talks to.
///
/// `Stub` is the deterministic offline provider used for local development
/// and tests. Selection happens once at startup — never by runtime
/// import-failure detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Anthropic,
    Stub,
}

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderKind,
    pub anthropic_api_key: Option<String>,
    /// Attempt budget for the convergence loop.
    pub max_attempts: u32,
    /// Both ATS and JD scores must reach this (and golden rules pass) to stop early.
    pub pass_threshold: u8,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let anthropic_api_key = std::env::var("ANTHROPIC_API_KEY").ok();

        // Explicit LLM_PROVIDER wins; otherwise use Anthropic when a key is set.
        let provider = match std::env::var("LLM_PROVIDER").ok().as_deref() {
            Some("anthropic") => ProviderKind::Anthropic,
            Some("stub") => ProviderKind::Stub,
            Some(other) => anyhow::bail!("Unknown LLM_PROVIDER '{other}' (expected 'anthropic' or 'stub')"),
            None if anthropic_api_key.is_some() => ProviderKind::Anthropic,
            None => ProviderKind::Stub,
        };

        if provider == ProviderKind::Anthropic && anthropic_api_key.is_none() {
            anyhow::bail!("LLM_PROVIDER=anthropic requires ANTHROPIC_API_KEY to be set");
        }

        Ok(Config {
            provider,
            anthropic_api_key,
            max_attempts: std::env::var("TAILOR_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse::<u32>()
                .context("TAILOR_MAX_ATTEMPTS must be a positive integer")?,
            pass_threshold: std::env::var("TAILOR_PASS_THRESHOLD")
                .unwrap_or_else(|_| "95".to_string())
                .parse::<u8>()
                .context("TAILOR_PASS_THRESHOLD must be an integer 0-100")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
