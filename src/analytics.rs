// src/analytics.rs
//! Aggregations over the consultation log for the admin dashboard.
//!
//! Both entry points are pure: callers fetch the rows, these functions only count.
//! JSON field names are camelCase, which is what the dashboard reads.

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::model::{Consulta, ConsultaStatus};

pub const FREQUENT_QUERIES_LIMIT: usize = 10;
pub const METRICS_WINDOW_MINUTES: i64 = 5;
pub const UNCATEGORIZED: &str = "sin_categoria";

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStats {
    /// First phrasing seen (rows arrive newest first, so the latest one).
    pub query: String,
    pub count: usize,
    pub category: String,
    pub average_response_time: f64,
    pub last_used: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category: String,
    pub total_queries: usize,
    pub percentage_of_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultaStats {
    pub frequent_queries: Vec<QueryStats>,
    pub category_stats: Vec<CategoryStats>,
    pub total_queries: usize,
}

// Running sums while grouping; turned into `QueryStats` at the end.
struct QueryAcc {
    query: String,
    count: usize,
    category: String,
    time_sum: f64,
    time_rows: usize,
    last_used: DateTime<Utc>,
}

/// Grouping key for "same question": lower-case, trimmed, single spaces.
pub fn query_key(query: &str) -> String {
    RE_WS
        .replace_all(query.trim(), " ")
        .to_lowercase()
}

pub fn consulta_stats(consultas: &[Consulta]) -> ConsultaStats {
    let total = consultas.len();

    let mut by_query: Vec<QueryAcc> = Vec::new();
    let mut query_index: HashMap<String, usize> = HashMap::new();
    let mut by_category: Vec<(String, usize)> = Vec::new();

    for c in consultas {
        let category = c
            .category
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        let key = query_key(&c.query);
        let idx = *query_index.entry(key).or_insert_with(|| {
            by_query.push(QueryAcc {
                query: c.query.clone(),
                count: 0,
                category: category.clone(),
                time_sum: 0.0,
                time_rows: 0,
                last_used: c.created_at,
            });
            by_query.len() - 1
        });
        let acc = &mut by_query[idx];
        acc.count += 1;
        if let Some(rt) = c.response_time_ms {
            acc.time_sum += rt;
            acc.time_rows += 1;
        }
        if c.created_at > acc.last_used {
            acc.last_used = c.created_at;
        }

        match by_category.iter_mut().find(|(name, _)| *name == category) {
            Some((_, n)) => *n += 1,
            None => by_category.push((category, 1)),
        }
    }

    let mut category_stats: Vec<CategoryStats> = by_category
        .into_iter()
        .map(|(category, n)| CategoryStats {
            category,
            total_queries: n,
            percentage_of_total: n as f64 / total as f64 * 100.0,
        })
        .collect();
    category_stats.sort_by(|a, b| b.total_queries.cmp(&a.total_queries));

    let mut frequent_queries: Vec<QueryStats> = by_query
        .into_iter()
        .map(|acc| QueryStats {
            query: acc.query,
            count: acc.count,
            category: acc.category,
            average_response_time: if acc.time_rows == 0 {
                0.0
            } else {
                acc.time_sum / acc.time_rows as f64
            },
            last_used: acc.last_used,
        })
        .collect();
    frequent_queries.sort_by(|a, b| b.count.cmp(&a.count));
    frequent_queries.truncate(FREQUENT_QUERIES_LIMIT);

    ConsultaStats {
        frequent_queries,
        category_stats,
        total_queries: total,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    pub response_time: f64,
    pub requests_per_minute: f64,
    pub active_users: usize,
    pub error_rate: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlySeries {
    pub labels: Vec<String>,
    pub response_time: Vec<f64>,
    pub requests: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performance {
    pub hourly: HourlySeries,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub metrics: SystemMetrics,
    pub performance: Performance,
}

/// Start of the live-metrics window ending at `now`.
pub fn metrics_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::minutes(METRICS_WINDOW_MINUTES)
}

/// Live metrics over rows from the last `METRICS_WINDOW_MINUTES`. Rows older than
/// the window are ignored even if the caller passes them.
pub fn system_metrics(rows: &[Consulta], now: DateTime<Utc>) -> MetricsReport {
    let since = metrics_window_start(now);
    let recent: Vec<&Consulta> = rows.iter().filter(|c| c.created_at >= since).collect();

    let timed: Vec<f64> = recent.iter().filter_map(|c| c.response_time_ms).collect();
    let response_time = if timed.is_empty() {
        0.0
    } else {
        timed.iter().sum::<f64>() / timed.len() as f64
    };

    let requests_per_minute = recent.len() as f64 / METRICS_WINDOW_MINUTES as f64;

    let active_users = recent
        .iter()
        .filter_map(|c| c.session_id.as_deref())
        .filter(|s| !s.is_empty())
        .collect::<HashSet<_>>()
        .len();

    let error_rate = if recent.is_empty() {
        0.0
    } else {
        let errors = recent
            .iter()
            .filter(|c| c.status == Some(ConsultaStatus::Error))
            .count();
        errors as f64 / recent.len() as f64
    };

    MetricsReport {
        metrics: SystemMetrics {
            response_time,
            requests_per_minute,
            active_users,
            error_rate,
            last_updated: now,
        },
        performance: Performance {
            hourly: HourlySeries {
                labels: vec![now.format("%H:%M:%S").to_string()],
                response_time: vec![response_time],
                requests: vec![requests_per_minute],
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(query: &str, category: Option<&str>, rt: Option<f64>, at: DateTime<Utc>) -> Consulta {
        Consulta {
            id: None,
            query: query.to_string(),
            category: category.map(str::to_string),
            response: None,
            response_time_ms: rt,
            session_id: None,
            status: Some(ConsultaStatus::Ok),
            created_at: at,
        }
    }

    #[test]
    fn empty_log_is_all_zero() {
        let s = consulta_stats(&[]);
        assert_eq!(s.total_queries, 0);
        assert!(s.frequent_queries.is_empty());
        assert!(s.category_stats.is_empty());
    }

    #[test]
    fn groups_queries_and_counts_categories() {
        let t = Utc::now();
        let rows = vec![
            row("Horario  de clases ", Some("horarios"), Some(10.0), t),
            row("horario de clases", Some("horarios"), Some(20.0), t - Duration::hours(1)),
            row("¿Hay taller?", Some("eventos"), None, t),
            row("algo raro", None, Some(5.0), t),
        ];
        let s = consulta_stats(&rows);
        assert_eq!(s.total_queries, 4);

        let top = &s.frequent_queries[0];
        assert_eq!(top.query, "Horario  de clases ");
        assert_eq!(top.count, 2);
        assert!((top.average_response_time - 15.0).abs() < 1e-9);
        assert_eq!(top.last_used, t);

        assert_eq!(s.category_stats[0].category, "horarios");
        assert_eq!(s.category_stats[0].total_queries, 2);
        assert!((s.category_stats[0].percentage_of_total - 50.0).abs() < 1e-9);
        assert!(s.category_stats.iter().any(|c| c.category == UNCATEGORIZED));
    }

    #[test]
    fn frequent_queries_are_capped() {
        let t = Utc::now();
        let rows: Vec<_> = (0..15)
            .map(|i| row(&format!("pregunta {i}"), Some("general"), None, t))
            .collect();
        assert_eq!(consulta_stats(&rows).frequent_queries.len(), FREQUENT_QUERIES_LIMIT);
    }

    #[test]
    fn metrics_over_window() {
        let now = Utc::now();
        let mut a = row("a", Some("general"), Some(100.0), now - Duration::minutes(1));
        a.session_id = Some("s1".into());
        let mut b = row("b", Some("general"), None, now - Duration::minutes(2));
        b.session_id = Some("s1".into());
        b.status = Some(ConsultaStatus::Error);
        let mut c = row("c", Some("general"), Some(300.0), now - Duration::minutes(3));
        c.session_id = Some("s2".into());
        let stale = row("d", Some("general"), Some(9_999.0), now - Duration::minutes(30));

        let r = system_metrics(&[a, b, c, stale], now);
        assert!((r.metrics.response_time - 200.0).abs() < 1e-9);
        assert!((r.metrics.requests_per_minute - 0.6).abs() < 1e-9);
        assert_eq!(r.metrics.active_users, 2);
        assert!((r.metrics.error_rate - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(r.performance.hourly.labels.len(), 1);
    }

    #[test]
    fn metrics_serialize_camel_case() {
        let r = system_metrics(&[], Utc::now());
        let v = serde_json::to_value(&r).unwrap();
        assert!(v["metrics"].get("requestsPerMinute").is_some());
        assert!(v["metrics"].get("activeUsers").is_some());
        assert!(v["performance"]["hourly"].get("responseTime").is_some());
    }
}
