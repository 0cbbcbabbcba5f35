// src/store/supabase.rs
//! Hosted Postgres via the Supabase PostgREST interface.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::{
    AdminDirectory, CategoryDirectory, DataAccessError, DataStore, InteractionLog, QuestionBank,
    StoreResult,
};
use crate::model::{AdminUser, CategoryContent, Consulta, Document, NewConsulta, Question, Subject};

#[derive(Clone)]
pub struct SupabaseStore {
    base_url: String,
    service_key: String,
    client: Client,
}

impl SupabaseStore {
    pub fn new(base_url: String, service_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            client,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn send(&self, req: RequestBuilder) -> StoreResult<reqwest::Response> {
        let rsp = self
            .authorized(req)
            .send()
            .await
            .map_err(|e| DataAccessError::Unreachable(e.to_string()))?;
        let status = rsp.status();
        if !status.is_success() {
            let body = rsp.text().await.unwrap_or_default();
            return Err(DataAccessError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(rsp)
    }

    async fn get_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        let req = self.client.get(self.table_url(table)).query(query);
        let rsp = self.send(req).await?;
        rsp.json::<Vec<T>>()
            .await
            .map_err(|e| DataAccessError::Malformed(format!("{table}: {e}")))
    }
}

const CATEGORY_SELECT: &str =
    "slug,title,description,documents,subjects(title,questions(question,answer))";

// Row shape of `categories` with embedded subjects/questions.
#[derive(Debug, Deserialize)]
struct CategoryRow {
    slug: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    documents: Option<Vec<Document>>,
    #[serde(default)]
    subjects: Vec<SubjectRow>,
}

#[derive(Debug, Deserialize)]
struct SubjectRow {
    title: String,
    #[serde(default)]
    questions: Vec<Question>,
}

impl From<CategoryRow> for CategoryContent {
    fn from(row: CategoryRow) -> Self {
        Self {
            slug: row.slug,
            title: row.title.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
            documents: row.documents.unwrap_or_default(),
            subjects: row
                .subjects
                .into_iter()
                .map(|s| Subject {
                    title: s.title,
                    questions: s.questions,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl QuestionBank for SupabaseStore {
    async fn fetch_all_questions(&self) -> StoreResult<Vec<Question>> {
        self.get_rows("questions", &[("select", "question,answer".to_string())])
            .await
    }
}

#[async_trait]
impl CategoryDirectory for SupabaseStore {
    async fn fetch_category_by_slug(&self, slug: &str) -> StoreResult<Option<CategoryContent>> {
        let rows: Vec<CategoryRow> = self
            .get_rows(
                "categories",
                &[
                    ("select", CATEGORY_SELECT.to_string()),
                    ("slug", format!("eq.{slug}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next().map(CategoryContent::from))
    }
}

#[async_trait]
impl InteractionLog for SupabaseStore {
    async fn record_interaction(&self, consulta: NewConsulta) -> StoreResult<()> {
        let req = self
            .client
            .post(self.table_url("consultas"))
            .header("Prefer", "return=minimal")
            .json(&[consulta]);
        self.send(req).await?;
        Ok(())
    }

    async fn list_consultas(&self) -> StoreResult<Vec<Consulta>> {
        self.get_rows(
            "consultas",
            &[
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn consultas_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<Consulta>> {
        let iso = since.to_rfc3339_opts(SecondsFormat::Millis, true);
        self.get_rows(
            "consultas",
            &[
                ("select", "*".to_string()),
                ("created_at", format!("gte.{iso}")),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }
}

#[async_trait]
impl AdminDirectory for SupabaseStore {
    async fn find_admin(&self, email: &str) -> StoreResult<Option<AdminUser>> {
        let rows: Vec<AdminUser> = self
            .get_rows(
                "admin_users",
                &[
                    ("select", "email,password_sha256".to_string()),
                    ("email", format!("eq.{email}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}

impl DataStore for SupabaseStore {
    fn name(&self) -> &'static str {
        "supabase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_url_strips_trailing_slash() {
        let store = SupabaseStore::new(
            "https://example.supabase.co/".into(),
            "key".into(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            store.table_url("questions"),
            "https://example.supabase.co/rest/v1/questions"
        );
    }

    #[test]
    fn category_row_fills_missing_fields() {
        let raw = r#"{"slug":"eventos","description":null,"subjects":[{"title":"Talleres"}]}"#;
        let row: CategoryRow = serde_json::from_str(raw).unwrap();
        let content = CategoryContent::from(row);
        assert_eq!(content.slug, "eventos");
        assert_eq!(content.description, "");
        assert!(content.documents.is_empty());
        assert_eq!(content.subjects[0].title, "Talleres");
        assert!(content.subjects[0].questions.is_empty());
    }
}
