// src/matching/category.rs
//! Top-level category detection: keyword containment over the lower-cased query.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::rules::{first_match, KeywordSet};

/// Category with pre-authored content, or the `General` sentinel that routes
/// the query to similarity search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Horarios,
    ServicioSocial,
    Eventos,
    General,
}

impl Category {
    pub fn slug(self) -> &'static str {
        match self {
            Category::Horarios => "horarios",
            Category::ServicioSocial => "servicio_social",
            Category::Eventos => "eventos",
            Category::General => "general",
        }
    }

    pub fn is_general(self) -> bool {
        self == Category::General
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// First category in `table` order with a keyword contained in the query, else `General`.
/// Total: every input maps to exactly one label.
pub fn detect_category(query: &str, table: &[KeywordSet<Category>]) -> Category {
    first_match(query, table).unwrap_or(Category::General)
}
