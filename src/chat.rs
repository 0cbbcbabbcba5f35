// src/chat.rs
//! Chat orchestration: category content for known categories, similarity search
//! for everything else, then a fire-and-forget log of the exchange.

use metrics::{counter, histogram};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::matching::{
    detect_category, find_similar_questions, Category, MatchingRules, RulesHandle,
};
use crate::model::{ConsultaStatus, Document, NewConsulta, Subject};
use crate::store::DataStore;
use crate::telemetry::query_id;

pub const NO_MATCHES_MESSAGE: &str =
    "No encontré preguntas similares. ¿Podrías reformular tu consulta?";
pub const MATCHES_MESSAGE: &str = "Encontré estas preguntas relacionadas:";
pub const SUGGESTED_SUBJECT_TITLE: &str = "Preguntas sugeridas";
pub const CATEGORY_NOT_FOUND_MESSAGE: &str =
    "Lo siento, no encontré información relacionada con tu consulta.";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("query must be a non-empty string")]
    InvalidInput,
    #[error("category `{0}` not found")]
    CategoryNotFound(String),
}

/// Caller-facing reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<Document>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<Subject>>,
}

#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn DataStore>,
    rules: RulesHandle,
}

impl ChatService {
    pub fn new(store: Arc<dyn DataStore>, rules: RulesHandle) -> Self {
        Self { store, rules }
    }

    /// Answer `query`. Both outcomes are logged: a missing category is recorded
    /// with status `error` and the apology text.
    pub async fn respond(
        &self,
        query: &str,
        session_id: Option<String>,
    ) -> Result<ChatReply, ChatError> {
        if query.trim().is_empty() {
            return Err(ChatError::InvalidInput);
        }
        let started = Instant::now();
        let rules = self.rules.current();
        let category = detect_category(query, &rules.categories);

        let outcome = if category.is_general() {
            Ok(self.similar_questions_reply(query, &rules).await)
        } else {
            self.category_reply(category).await
        };

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        counter!("chat_queries_total", "category" => category.slug()).increment(1);
        histogram!("chat_response_ms").record(elapsed_ms);

        let (response, status) = match &outcome {
            Ok(reply) => {
                let suggestions: usize = reply
                    .subjects
                    .iter()
                    .flatten()
                    .map(|s| s.questions.len())
                    .sum();
                info!(
                    target: "chat",
                    id = %query_id(query),
                    category = category.slug(),
                    suggestions,
                    elapsed_ms,
                    "chat reply"
                );
                (reply.response.clone(), ConsultaStatus::Ok)
            }
            Err(_) => (CATEGORY_NOT_FOUND_MESSAGE.to_string(), ConsultaStatus::Error),
        };

        self.record(NewConsulta {
            query: query.to_string(),
            category: category.slug().to_string(),
            response,
            response_time_ms: Some(elapsed_ms),
            session_id,
            status,
        });

        outcome
    }

    async fn similar_questions_reply(&self, query: &str, rules: &MatchingRules) -> ChatReply {
        let questions = find_similar_questions(&*self.store, query, rules).await;
        if questions.is_empty() {
            counter!("chat_fallback_total").increment(1);
            return ChatReply {
                response: NO_MATCHES_MESSAGE.to_string(),
                category: Category::General.slug().to_string(),
                documents: None,
                subjects: None,
            };
        }
        ChatReply {
            response: MATCHES_MESSAGE.to_string(),
            category: Category::General.slug().to_string(),
            documents: None,
            subjects: Some(vec![Subject {
                title: SUGGESTED_SUBJECT_TITLE.to_string(),
                questions,
            }]),
        }
    }

    async fn category_reply(&self, category: Category) -> Result<ChatReply, ChatError> {
        let slug = category.slug();
        match self.store.fetch_category_by_slug(slug).await {
            Ok(Some(content)) => Ok(ChatReply {
                response: content.description,
                category: slug.to_string(),
                documents: Some(content.documents),
                subjects: Some(content.subjects),
            }),
            Ok(None) => {
                warn!(target: "chat", slug, "category content missing");
                Err(ChatError::CategoryNotFound(slug.to_string()))
            }
            Err(e) => {
                warn!(target: "chat", slug, error = %e, "category fetch failed");
                Err(ChatError::CategoryNotFound(slug.to_string()))
            }
        }
    }

    // Never awaited by the request path.
    fn record(&self, consulta: NewConsulta) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.record_interaction(consulta).await {
                warn!(target: "chat", error = %e, "failed to record interaction");
                counter!("interaction_log_errors_total").increment(1);
            }
        });
    }
}
