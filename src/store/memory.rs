// src/store/memory.rs
//! In-process store seeded from a JSON file. Used for local runs and tests.
//!
//! Seed shape:
//! {
//!   "questions":  [{"question": "...", "answer": "..."}],
//!   "categories": [{"slug": "horarios", "title": "...", "description": "...",
//!                   "documents": [], "subjects": []}],
//!   "admins":     [{"email": "...", "password_sha256": "..."}]
//! }
//!
//! The consultation log is a capped in-memory buffer; the oldest rows are dropped first.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, RwLock};
use tracing::warn;

use super::{
    AdminDirectory, CategoryDirectory, DataAccessError, DataStore, InteractionLog, QuestionBank,
    StoreResult,
};
use crate::model::{AdminUser, CategoryContent, Consulta, NewConsulta, Question};

const MAX_LOG_CAPACITY: usize = 100_000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub categories: Vec<CategoryContent>,
    #[serde(default)]
    pub admins: Vec<AdminUser>,
}

#[derive(Debug)]
pub struct MemoryStore {
    questions: RwLock<Vec<Question>>,
    categories: RwLock<Vec<CategoryContent>>,
    admins: RwLock<Vec<AdminUser>>,
    consultas: Mutex<Vec<Consulta>>,
    cap: usize,
    next_id: AtomicI64,
}

fn poisoned() -> DataAccessError {
    DataAccessError::Unreachable("memory store lock poisoned".to_string())
}

impl MemoryStore {
    pub fn new(seed: SeedData, log_capacity: usize) -> Self {
        let cap = log_capacity.clamp(1, MAX_LOG_CAPACITY);
        Self {
            questions: RwLock::new(seed.questions),
            categories: RwLock::new(seed.categories),
            admins: RwLock::new(seed.admins),
            consultas: Mutex::new(Vec::with_capacity(cap.min(1024))),
            cap,
            next_id: AtomicI64::new(1),
        }
    }

    pub fn empty() -> Self {
        Self::new(SeedData::default(), 1000)
    }

    /// Read the seed file; a missing file gives an empty store.
    pub fn from_seed_file(path: &Path, log_capacity: usize) -> anyhow::Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "seed file not found; starting with an empty store");
            return Ok(Self::new(SeedData::default(), log_capacity));
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading seed data from {}", path.display()))?;
        let seed: SeedData = serde_json::from_str(&raw)
            .with_context(|| format!("parsing seed data from {}", path.display()))?;
        Ok(Self::new(seed, log_capacity))
    }

    /// Replace the question bank wholesale.
    pub fn set_questions(&self, questions: Vec<Question>) -> StoreResult<()> {
        *self.questions.write().map_err(|_| poisoned())? = questions;
        Ok(())
    }

    /// Append a row with an explicit timestamp.
    pub fn insert_consulta_at(
        &self,
        new: NewConsulta,
        created_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut rows = self.consultas.lock().map_err(|_| poisoned())?;
        rows.push(Consulta::from_new(id, new, created_at));
        if rows.len() > self.cap {
            let excess = rows.len() - self.cap;
            rows.drain(0..excess);
        }
        Ok(())
    }

    fn newest_first<F>(&self, keep: F) -> StoreResult<Vec<Consulta>>
    where
        F: Fn(&Consulta) -> bool,
    {
        let rows = self.consultas.lock().map_err(|_| poisoned())?;
        let mut out: Vec<Consulta> = rows.iter().filter(|c| keep(c)).cloned().collect();
        // Stable sort keeps insertion order reversed for equal timestamps.
        out.reverse();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }
}

#[async_trait]
impl QuestionBank for MemoryStore {
    async fn fetch_all_questions(&self) -> StoreResult<Vec<Question>> {
        Ok(self.questions.read().map_err(|_| poisoned())?.clone())
    }
}

#[async_trait]
impl CategoryDirectory for MemoryStore {
    async fn fetch_category_by_slug(&self, slug: &str) -> StoreResult<Option<CategoryContent>> {
        let categories = self.categories.read().map_err(|_| poisoned())?;
        Ok(categories.iter().find(|c| c.slug == slug).cloned())
    }
}

#[async_trait]
impl InteractionLog for MemoryStore {
    async fn record_interaction(&self, consulta: NewConsulta) -> StoreResult<()> {
        self.insert_consulta_at(consulta, Utc::now())
    }

    async fn list_consultas(&self) -> StoreResult<Vec<Consulta>> {
        self.newest_first(|_| true)
    }

    async fn consultas_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<Consulta>> {
        self.newest_first(|c| c.created_at >= since)
    }
}

#[async_trait]
impl AdminDirectory for MemoryStore {
    async fn find_admin(&self, email: &str) -> StoreResult<Option<AdminUser>> {
        let admins = self.admins.read().map_err(|_| poisoned())?;
        Ok(admins.iter().find(|a| a.email == email).cloned())
    }
}

impl DataStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConsultaStatus;
    use chrono::Duration;

    fn new_consulta(query: &str) -> NewConsulta {
        NewConsulta {
            query: query.to_string(),
            category: "general".to_string(),
            response: "ok".to_string(),
            response_time_ms: Some(3.0),
            session_id: None,
            status: ConsultaStatus::Ok,
        }
    }

    #[tokio::test]
    async fn log_is_capped_and_newest_first() {
        let store = MemoryStore::new(SeedData::default(), 2);
        let t0 = Utc::now();
        store.insert_consulta_at(new_consulta("a"), t0).unwrap();
        store.insert_consulta_at(new_consulta("b"), t0 + Duration::seconds(1)).unwrap();
        store.insert_consulta_at(new_consulta("c"), t0 + Duration::seconds(2)).unwrap();

        let rows = store.list_consultas().await.unwrap();
        let queries: Vec<_> = rows.iter().map(|c| c.query.as_str()).collect();
        assert_eq!(queries, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn since_filters_by_timestamp() {
        let store = MemoryStore::empty();
        let now = Utc::now();
        store.insert_consulta_at(new_consulta("old"), now - Duration::minutes(10)).unwrap();
        store.insert_consulta_at(new_consulta("new"), now - Duration::minutes(1)).unwrap();

        let rows = store.consultas_since(now - Duration::minutes(5)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].query, "new");
    }

    #[tokio::test]
    async fn question_snapshot_reflects_replacement() {
        let store = MemoryStore::empty();
        assert!(store.fetch_all_questions().await.unwrap().is_empty());
        store
            .set_questions(vec![Question::new("¿Hay examen?", "Sí.")])
            .unwrap();
        assert_eq!(store.fetch_all_questions().await.unwrap().len(), 1);
    }

    #[test]
    fn missing_seed_file_gives_empty_store() {
        let store = MemoryStore::from_seed_file(Path::new("does/not/exist.json"), 10).unwrap();
        assert_eq!(store.cap, 10);
    }
}
