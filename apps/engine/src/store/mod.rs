//! Persistence boundary.
//!
//! The engine depends only on this trait — the three record shapes and their
//! create/update/read operations — never on a storage technology. The bundled
//! `InMemoryStore` backs the CLI and the tests; a database-backed caller
//! implements the same trait.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::resume::{ResumeRecord, TailoringAttempt, TailoringProgress};

#[async_trait]
pub trait TailoringStore: Send + Sync {
    async fn create_resume(&self, record: ResumeRecord) -> Result<()>;
    async fn get_resume(&self, id: Uuid) -> Result<Option<ResumeRecord>>;
    async fn update_resume(&self, record: ResumeRecord) -> Result<()>;

    /// Archives the résumé's current text as a new parent record and points
    /// the live record's `parent_id` at it. Called once at the start of a
    /// refinement job; returns the archived parent's id.
    async fn snapshot_parent(&self, id: Uuid) -> Result<Uuid>;

    /// Appends an attempt record. Attempts are append-only and ordered by
    /// `attempt_number` ascending.
    async fn append_attempt(&self, resume_id: Uuid, attempt: TailoringAttempt) -> Result<()>;
    async fn list_attempts(&self, resume_id: Uuid) -> Result<Vec<TailoringAttempt>>;

    async fn put_progress(&self, resume_id: Uuid, progress: TailoringProgress) -> Result<()>;
    async fn get_progress(&self, resume_id: Uuid) -> Result<Option<TailoringProgress>>;
}

#[derive(Default)]
struct InMemoryInner {
    resumes: HashMap<Uuid, ResumeRecord>,
    attempts: HashMap<Uuid, Vec<TailoringAttempt>>,
    progress: HashMap<Uuid, TailoringProgress>,
}

/// Process-local store used by the CLI and tests.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<InMemoryInner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TailoringStore for InMemoryStore {
    async fn create_resume(&self, record: ResumeRecord) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.resumes.insert(record.id, record);
        Ok(())
    }

    async fn get_resume(&self, id: Uuid) -> Result<Option<ResumeRecord>> {
        let inner = self.inner.lock().await;
        Ok(inner.resumes.get(&id).cloned())
    }

    async fn update_resume(&self, mut record: ResumeRecord) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if !inner.resumes.contains_key(&record.id) {
            return Err(anyhow!("resume {} does not exist", record.id));
        }
        record.updated_at = Utc::now();
        inner.resumes.insert(record.id, record);
        Ok(())
    }

    async fn snapshot_parent(&self, id: Uuid) -> Result<Uuid> {
        let mut inner = self.inner.lock().await;
        let live = inner
            .resumes
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow!("resume {id} does not exist"))?;

        // The archive keeps the live record's old parent pointer, so the
        // chain stays intact: live -> archive -> previous archive -> ...
        let mut archive = live.clone();
        archive.id = Uuid::new_v4();
        let archive_id = archive.id;
        inner.resumes.insert(archive_id, archive);

        let live = inner
            .resumes
            .get_mut(&id)
            .ok_or_else(|| anyhow!("resume {id} does not exist"))?;
        live.parent_id = Some(archive_id);
        live.updated_at = Utc::now();

        Ok(archive_id)
    }

    async fn append_attempt(&self, resume_id: Uuid, attempt: TailoringAttempt) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.attempts.entry(resume_id).or_default().push(attempt);
        Ok(())
    }

    async fn list_attempts(&self, resume_id: Uuid) -> Result<Vec<TailoringAttempt>> {
        let inner = self.inner.lock().await;
        Ok(inner.attempts.get(&resume_id).cloned().unwrap_or_default())
    }

    async fn put_progress(&self, resume_id: Uuid, progress: TailoringProgress) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.progress.insert(resume_id, progress);
        Ok(())
    }

    async fn get_progress(&self, resume_id: Uuid) -> Result<Option<TailoringProgress>> {
        let inner = self.inner.lock().await;
        Ok(inner.progress.get(&resume_id).cloned())
    }
}
