// src/matching/mod.rs
//! Query classification and similarity ranking.
//!
//! Pure, synchronous and request-scoped: nothing here keeps state between calls
//! except the injected keyword tables (`MatchingRules`). The only async entry is
//! `find_similar_questions`, which fetches a fresh question-bank snapshot first.

pub mod category;
pub mod normalize;
pub mod ranker;
pub mod rules;
pub mod similarity;
pub mod topic;

pub use category::{detect_category, Category};
pub use normalize::normalize;
pub use ranker::{find_similar_questions, rank_candidates, rank_scored, ScoredQuestion};
pub use rules::{
    load_rules, rules_mtime, start_hot_reload_thread, KeywordSet, MatchingRules, RulesHandle,
};
pub use similarity::{breakdown, similarity, SimilarityBreakdown};
pub use topic::{detect_topic, TopicBucket};
