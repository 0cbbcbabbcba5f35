// src/config/app.rs
use anyhow::{anyhow, bail};
use std::path::PathBuf;
use std::time::Duration;

use crate::matching::rules::DEFAULT_RULES_PATH;

pub const DEFAULT_SEED_PATH: &str = "data/seed.json";
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_CONSULTA_LOG_CAPACITY: usize = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory { seed_path: PathBuf },
    Supabase { url: String, service_key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub store_timeout: Duration,
    /// Bearer token for the consultation log; `None` locks the endpoint.
    pub admin_token: Option<String>,
    pub matching_rules_path: PathBuf,
    pub matching_hot_reload: bool,
    pub consulta_log_capacity: usize,
}

impl AppConfig {
    /// Read from the process environment (call `dotenvy::dotenv()` first to pick up `.env`).
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let backend = get("STORE_BACKEND")
            .unwrap_or_else(|| "memory".to_string())
            .to_ascii_lowercase();
        let store = match backend.as_str() {
            "memory" => StoreBackend::Memory {
                seed_path: get("SEED_DATA_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SEED_PATH)),
            },
            "supabase" => StoreBackend::Supabase {
                url: get("SUPABASE_URL")
                    .ok_or_else(|| anyhow!("Missing SUPABASE_URL env var"))?,
                service_key: get("SUPABASE_SERVICE_KEY")
                    .ok_or_else(|| anyhow!("Missing SUPABASE_SERVICE_KEY env var"))?,
            },
            other => bail!("Unsupported STORE_BACKEND: {other}"),
        };

        let timeout_ms = match get("STORE_TIMEOUT_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| anyhow!("STORE_TIMEOUT_MS must be milliseconds: {e}"))?,
            None => DEFAULT_STORE_TIMEOUT_MS,
        };

        let consulta_log_capacity = match get("CONSULTA_LOG_CAPACITY") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|e| anyhow!("CONSULTA_LOG_CAPACITY must be a count: {e}"))?,
            None => DEFAULT_CONSULTA_LOG_CAPACITY,
        };

        Ok(Self {
            store,
            store_timeout: Duration::from_millis(timeout_ms.max(1)),
            admin_token: get("ADMIN_TOKEN"),
            matching_rules_path: get("MATCHING_RULES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RULES_PATH)),
            matching_hot_reload: get("MATCHING_HOT_RELOAD").is_some_and(|v| v == "1"),
            consulta_log_capacity,
        })
    }
}
