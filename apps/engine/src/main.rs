use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tailor_engine::config::{Config, ProviderKind};
use tailor_engine::llm_client::{AnthropicProvider, LlmProvider, StubProvider, MODEL};
use tailor_engine::models::resume::{JobStatus, ResumeRecord, TailoringMode};
use tailor_engine::store::{InMemoryStore, TailoringStore};
use tailor_engine::TailoringEngine;

const USAGE: &str = "usage: tailor-engine <resume.txt> <job-description.txt> [basic|personalized|aggressive]";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.rust_log)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tailor-engine v{}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let resume_path = args.next().context(USAGE)?;
    let jd_path = args.next().context(USAGE)?;
    let mode = match args.next() {
        Some(raw) => TailoringMode::from_str_loose(&raw)
            .with_context(|| format!("unknown mode '{raw}' — {USAGE}"))?,
        None => TailoringMode::Basic,
    };

    let resume_text = std::fs::read_to_string(&resume_path)
        .with_context(|| format!("failed to read resume file '{resume_path}'"))?;
    let jd_text = std::fs::read_to_string(&jd_path)
        .with_context(|| format!("failed to read job description file '{jd_path}'"))?;

    let llm: Arc<dyn LlmProvider> = match config.provider {
        ProviderKind::Anthropic => {
            info!("Using Anthropic provider (model: {MODEL})");
            let api_key = config
                .anthropic_api_key
                .clone()
                .context("ANTHROPIC_API_KEY is not set")?;
            Arc::new(AnthropicProvider::new(api_key)?)
        }
        ProviderKind::Stub => {
            info!("Using offline stub provider (set ANTHROPIC_API_KEY for real tailoring)");
            Arc::new(StubProvider)
        }
    };

    let store = Arc::new(InMemoryStore::new());
    let record = ResumeRecord::new(resume_text, jd_text, mode);
    let resume_id = record.id;
    store.create_resume(record).await?;

    let engine = TailoringEngine::from_config(store.clone(), llm, &config);
    let ack = engine.start_tailoring(resume_id, false).await?;
    info!(
        "Tailoring job accepted for resume {} (max {} attempts, mode {:?})",
        ack.resume_id, ack.max_attempts, mode
    );

    loop {
        let progress = engine.get_progress(resume_id).await?;
        info!(
            "status={:?} progress={}% attempt={}/{}",
            progress.status, progress.progress, progress.current_attempt, progress.max_attempts
        );
        if matches!(progress.status, JobStatus::Completed | JobStatus::Failed) {
            if let Some(error) = &progress.error {
                eprintln!("job failed: {error}");
            }
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    }

    println!("--- attempts ---");
    for attempt in store.list_attempts(resume_id).await? {
        println!(
            "attempt {}: ats={} jd={} golden={} modified={:?}",
            attempt.attempt_number,
            attempt.ats_score,
            attempt.jd_score,
            attempt.golden_passed,
            attempt.modified_sections
        );
    }

    let resume = store
        .get_resume(resume_id)
        .await?
        .context("resume record missing after job")?;
    println!("--- tailored resume (v{}) ---", resume.version);
    println!("{}", resume.text);

    Ok(())
}
