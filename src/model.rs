// src/model.rs
//! Shared value types: question bank rows, category content, consultation log rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A question-bank entry. Immutable from the matching core's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub answer: String,
}

impl Question {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Pre-authored content returned verbatim when a query maps to a known category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryContent {
    pub slug: String,
    #[serde(default)]
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultaStatus {
    Ok,
    Error,
}

/// A chat exchange about to be appended to the consultation log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewConsulta {
    pub query: String,
    pub category: String,
    pub response: String,
    #[serde(rename = "response_time", skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub status: ConsultaStatus,
}

/// A stored consultation log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consulta {
    #[serde(default)]
    pub id: Option<i64>,
    pub query: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default, rename = "response_time")]
    pub response_time_ms: Option<f64>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub status: Option<ConsultaStatus>,
    pub created_at: DateTime<Utc>,
}

impl Consulta {
    pub fn from_new(id: i64, new: NewConsulta, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Some(id),
            query: new.query,
            category: Some(new.category),
            response: Some(new.response),
            response_time_ms: new.response_time_ms,
            session_id: new.session_id,
            status: Some(new.status),
            created_at,
        }
    }
}

/// Admin account; only the SHA-256 hex digest of the password is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub email: String,
    pub password_sha256: String,
}
