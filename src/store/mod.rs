// src/store/mod.rs
//! Data-access collaborators: question bank, category content, consultation log, admins.
//!
//! Every call is a single request/response. Retries are not attempted here; timeouts
//! are applied by the backend (see `supabase::SupabaseStore`).

pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::model::{AdminUser, CategoryContent, Consulta, NewConsulta, Question};

pub use memory::{MemoryStore, SeedData};
pub use supabase::SupabaseStore;

#[derive(Debug, thiserror::Error)]
pub enum DataAccessError {
    #[error("store unreachable: {0}")]
    Unreachable(String),
    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed rows: {0}")]
    Malformed(String),
}

pub type StoreResult<T> = Result<T, DataAccessError>;

#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Current snapshot, in store order.
    async fn fetch_all_questions(&self) -> StoreResult<Vec<Question>>;
}

#[async_trait]
pub trait CategoryDirectory: Send + Sync {
    async fn fetch_category_by_slug(&self, slug: &str) -> StoreResult<Option<CategoryContent>>;
}

#[async_trait]
pub trait InteractionLog: Send + Sync {
    async fn record_interaction(&self, consulta: NewConsulta) -> StoreResult<()>;
    /// All rows, newest first.
    async fn list_consultas(&self) -> StoreResult<Vec<Consulta>>;
    /// Rows created at or after `since`, newest first.
    async fn consultas_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<Consulta>>;
}

#[async_trait]
pub trait AdminDirectory: Send + Sync {
    async fn find_admin(&self, email: &str) -> StoreResult<Option<AdminUser>>;
}

/// Everything the service needs from its backing store.
pub trait DataStore: QuestionBank + CategoryDirectory + InteractionLog + AdminDirectory {
    fn name(&self) -> &'static str;
}

/// Build the configured backend.
pub fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn DataStore>> {
    let store: Arc<dyn DataStore> = match &config.store {
        StoreBackend::Memory { seed_path } => Arc::new(MemoryStore::from_seed_file(
            seed_path,
            config.consulta_log_capacity,
        )?),
        StoreBackend::Supabase { url, service_key } => Arc::new(SupabaseStore::new(
            url.clone(),
            service_key.clone(),
            config.store_timeout,
        )?),
    };
    tracing::info!(backend = store.name(), "data store ready");
    Ok(store)
}
