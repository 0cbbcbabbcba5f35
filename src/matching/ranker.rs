// src/matching/ranker.rs
//! Candidate ranking: score every question, diversify by topic, filter, truncate.
//!
//! Order of operations:
//! 1) score = max(sim(query, question) * 1.2, sim(query, answer) * 0.8)
//! 2) bucket by topic of the question text (buckets keep first-seen order)
//! 3) per bucket: stable sort desc, keep top 2
//! 4) merge, stable sort desc            (`finalize`)
//! 5) keep score > 0.2, truncate to 5     (`finalize`)
//!
//! The per-bucket cut happens before the global filter, so a strong third entry of a
//! crowded bucket never reaches the merged list.

use metrics::{counter, histogram};
use tracing::{debug, warn};

use super::rules::MatchingRules;
use super::similarity::similarity;
use super::topic::{detect_topic, TopicBucket};
use crate::model::Question;
use crate::store::QuestionBank;
use crate::telemetry::query_id;

pub const QUESTION_WEIGHT: f64 = 1.2;
pub const ANSWER_WEIGHT: f64 = 0.8;
pub const PER_TOPIC_CAP: usize = 2;
pub const SIMILARITY_FLOOR: f64 = 0.2;
pub const MAX_CANDIDATES: usize = 5;

/// A question with its request-scoped ranking score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredQuestion {
    pub question: Question,
    pub similarity: f64,
}

/// Asymmetric candidate score: resembling the stored question outweighs
/// resembling the stored answer.
pub fn score_question(query: &str, question: &Question, rules: &MatchingRules) -> f64 {
    let against_question = similarity(query, &question.question, &rules.themes) * QUESTION_WEIGHT;
    let against_answer = similarity(query, &question.answer, &rules.themes) * ANSWER_WEIGHT;
    against_question.max(against_answer)
}

pub fn score_all(
    query: &str,
    questions: Vec<Question>,
    rules: &MatchingRules,
) -> Vec<ScoredQuestion> {
    questions
        .into_iter()
        .map(|q| ScoredQuestion {
            similarity: score_question(query, &q, rules),
            question: q,
        })
        .collect()
}

/// Partition by topic bucket. Buckets appear in the order their first member was seen;
/// members keep input order.
pub fn group_by_topic(
    scored: Vec<ScoredQuestion>,
    rules: &MatchingRules,
) -> Vec<(TopicBucket, Vec<ScoredQuestion>)> {
    let mut groups: Vec<(TopicBucket, Vec<ScoredQuestion>)> = Vec::new();
    for sq in scored {
        let bucket = detect_topic(&sq.question.question, &rules.topics);
        match groups.iter_mut().find(|(b, _)| *b == bucket) {
            Some((_, members)) => members.push(sq),
            None => groups.push((bucket, vec![sq])),
        }
    }
    groups
}

/// Best `PER_TOPIC_CAP` of each bucket, concatenated in bucket order.
pub fn top_per_topic(groups: Vec<(TopicBucket, Vec<ScoredQuestion>)>) -> Vec<ScoredQuestion> {
    groups
        .into_iter()
        .flat_map(|(_, mut members)| {
            sort_desc(&mut members);
            members.truncate(PER_TOPIC_CAP);
            members
        })
        .collect()
}

/// Final stage over the merged pool: sort desc, keep scores strictly above
/// `SIMILARITY_FLOOR`, cap at `MAX_CANDIDATES`.
pub fn finalize(mut pool: Vec<ScoredQuestion>) -> Vec<ScoredQuestion> {
    sort_desc(&mut pool);
    pool.retain(|sq| sq.similarity > SIMILARITY_FLOOR);
    pool.truncate(MAX_CANDIDATES);
    pool
}

/// Full pipeline, keeping scores (for diagnostics and the demo binary).
pub fn rank_scored(
    query: &str,
    questions: Vec<Question>,
    rules: &MatchingRules,
) -> Vec<ScoredQuestion> {
    let scored = score_all(query, questions, rules);
    finalize(top_per_topic(group_by_topic(scored, rules)))
}

/// Ranked candidates for `query` over a question-bank snapshot.
pub fn rank_candidates(
    query: &str,
    questions: Vec<Question>,
    rules: &MatchingRules,
) -> Vec<Question> {
    rank_scored(query, questions, rules)
        .into_iter()
        .map(|sq| sq.question)
        .collect()
}

/// Fetch a fresh snapshot from `bank` and rank it. A failed fetch is logged and
/// yields no candidates.
pub async fn find_similar_questions<B>(
    bank: &B,
    query: &str,
    rules: &MatchingRules,
) -> Vec<Question>
where
    B: QuestionBank + ?Sized,
{
    let questions = match bank.fetch_all_questions().await {
        Ok(qs) => qs,
        Err(e) => {
            warn!(
                target: "ranker",
                error = %e,
                "question bank fetch failed; returning no candidates"
            );
            counter!("ranker_fetch_errors_total").increment(1);
            return Vec::new();
        }
    };

    let bank_size = questions.len();
    let ranked = rank_candidates(query, questions, rules);
    histogram!("ranker_candidates_returned").record(ranked.len() as f64);
    debug!(
        target: "ranker",
        id = %query_id(query),
        bank_size,
        returned = ranked.len(),
        "ranked question bank"
    );
    ranked
}

// Stable: equal scores keep their relative order.
fn sort_desc(items: &mut [ScoredQuestion]) {
    items.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
}
