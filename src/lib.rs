// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod analytics;
pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod matching;
pub mod metrics;
pub mod model;
pub mod store;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::chat::{ChatReply, ChatService};
pub use crate::matching::{detect_category, rank_candidates, Category, MatchingRules, RulesHandle};
pub use crate::model::Question;

use tracing::info;

/// Assemble the full application router from configuration: data store, keyword
/// tables (with optional hot reload) and API routes. The Prometheus `/metrics`
/// route is added by the binary, which owns the global recorder.
pub fn build_app(config: &config::AppConfig) -> anyhow::Result<axum::Router> {
    let store = store::build_store(config)?;

    // Taken before loading so an edit racing the load is reloaded, not lost.
    let baseline = matching::rules_mtime(&config.matching_rules_path);
    let rules = matching::load_rules(&config.matching_rules_path)?;
    let handle = RulesHandle::new(rules);
    if config.matching_hot_reload {
        matching::start_hot_reload_thread(
            handle.clone(),
            config.matching_rules_path.clone(),
            baseline,
        );
        info!(path = %config.matching_rules_path.display(), "matching rules hot reload enabled");
    }

    let state = AppState::new(store, handle, config.admin_token.clone());
    Ok(router(state))
}
