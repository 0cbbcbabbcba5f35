// src/bin/rank_query.rs
// Offline check of the matcher: detect the category of a query and print the ranked
// candidates from a seed file, with their scores.
//
// cargo run --bin rank_query -- "¿Cuándo es el examen final?" data/seed.json

use std::path::PathBuf;

use faq_assistant::config::{app::DEFAULT_SEED_PATH, AppConfig, StoreBackend};
use faq_assistant::matching::{detect_category, load_rules, rank_scored};
use faq_assistant::store::{MemoryStore, QuestionBank};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Same keyword tables as the service: honours MATCHING_RULES_PATH from env or .env.
    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env()?;

    let mut args = std::env::args().skip(1);
    let Some(query) = args.next() else {
        anyhow::bail!("usage: rank_query <query> [seed.json]");
    };
    let seed = match (args.next(), &config.store) {
        (Some(path), _) => PathBuf::from(path),
        (None, StoreBackend::Memory { seed_path }) => seed_path.clone(),
        (None, _) => PathBuf::from(DEFAULT_SEED_PATH),
    };

    let rules = load_rules(&config.matching_rules_path)?;
    let store = MemoryStore::from_seed_file(&seed, 1)?;

    let category = detect_category(&query, &rules.categories);
    println!("category: {category}");

    let questions = store.fetch_all_questions().await?;
    let ranked = rank_scored(&query, questions, &rules);
    if ranked.is_empty() {
        println!("no candidates above threshold");
    }
    for (i, sq) in ranked.iter().enumerate() {
        println!("{}. [{:.3}] {}", i + 1, sq.similarity, sq.question.question);
    }
    Ok(())
}
