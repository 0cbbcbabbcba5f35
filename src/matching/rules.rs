// src/matching/rules.rs
//! Keyword tables for category detection, topic grouping and the thematic bonus.
//!
//! Tables are plain immutable data. `MatchingRules::default()` carries the built-in
//! sets; a TOML file with the same shape can replace any of the three sections:
//!
//! ```toml
//! [[categories]]
//! label = "horarios"
//! keywords = ["horario", "calendario"]
//!
//! [[topics]]
//! label = "examenes"
//! keywords = ["examen"]
//!
//! [[themes]]
//! label = "tiempo"
//! keywords = ["cuando"]
//! ```
//!
//! Sections left out of the file keep their defaults. Table order is the tie-break.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

use super::category::Category;
use super::normalize::normalize;
use super::topic::TopicBucket;

pub const DEFAULT_RULES_PATH: &str = "config/matching.toml";

const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Horarios,
        &["horario", "calendario", "clases", "semestre", "fecha"],
    ),
    (Category::ServicioSocial, &["servicio", "social", "pre-registro"]),
    (
        Category::Eventos,
        &["evento", "conferencia", "taller", "avisos", "importantes"],
    ),
];

const TOPIC_KEYWORDS: &[(TopicBucket, &[&str])] = &[
    (
        TopicBucket::Examenes,
        &["examen", "parcial", "final", "extraordinario"],
    ),
    (
        TopicBucket::Clases,
        &["clase", "curso", "laboratorio", "horario"],
    ),
    (
        TopicBucket::Tramites,
        &["baja", "inscripcion", "registro", "servicio"],
    ),
    (TopicBucket::Fechas, &["fecha", "cuando", "inicio", "termino"]),
];

const THEME_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "tiempo",
        &["cuando", "fecha", "dia", "horario", "inicio", "termina", "empiezan"],
    ),
    (
        "accion",
        &["hacer", "realizar", "comenzar", "terminar", "iniciar", "inscribir"],
    ),
    ("documentos", &["calendario", "horario", "programa", "documento"]),
    (
        "academico",
        &["clase", "examen", "curso", "laboratorio", "parcial", "final"],
    ),
];

/// A labelled keyword list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeywordSet<L> {
    pub label: L,
    pub keywords: Vec<String>,
}

impl<L> KeywordSet<L> {
    pub fn new(label: L, keywords: &[&str]) -> Self {
        Self {
            label,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// True if any keyword occurs as a substring of `haystack` (caller prepares case).
    pub fn matches(&self, haystack: &str) -> bool {
        self.keywords.iter().any(|k| haystack.contains(k.as_str()))
    }
}

/// Label of the first set (in declaration order) matching the lower-cased `text`.
pub fn first_match<L: Clone>(text: &str, table: &[KeywordSet<L>]) -> Option<L> {
    let lowered = text.to_lowercase();
    table
        .iter()
        .find(|set| set.matches(&lowered))
        .map(|set| set.label.clone())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingRules {
    pub categories: Vec<KeywordSet<Category>>,
    pub topics: Vec<KeywordSet<TopicBucket>>,
    pub themes: Vec<KeywordSet<String>>,
}

impl Default for MatchingRules {
    fn default() -> Self {
        Self {
            categories: CATEGORY_KEYWORDS
                .iter()
                .map(|(label, words)| KeywordSet::new(*label, words))
                .collect(),
            topics: TOPIC_KEYWORDS
                .iter()
                .map(|(label, words)| KeywordSet::new(*label, words))
                .collect(),
            themes: THEME_KEYWORDS
                .iter()
                .map(|(label, words)| KeywordSet::new(label.to_string(), words))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesFile {
    #[serde(default)]
    categories: Option<Vec<KeywordSet<Category>>>,
    #[serde(default)]
    topics: Option<Vec<KeywordSet<TopicBucket>>>,
    #[serde(default)]
    themes: Option<Vec<KeywordSet<String>>>,
}

impl MatchingRules {
    /// Parse a TOML override; missing sections fall back to the defaults.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let file: RulesFile = toml::from_str(toml_str).context("parsing matching rules TOML")?;
        let defaults = Self::default();

        let categories = match file.categories {
            Some(sets) => lowercase_sets(sets),
            None => defaults.categories,
        };
        let topics = match file.topics {
            Some(sets) => lowercase_sets(sets),
            None => defaults.topics,
        };
        // Themes are compared against normalized text, so normalize the keywords too.
        let themes = match file.themes {
            Some(sets) => sets
                .into_iter()
                .map(|s| KeywordSet {
                    label: s.label,
                    keywords: s.keywords.iter().map(|k| normalize(k)).collect(),
                })
                .collect(),
            None => defaults.themes,
        };

        let rules = Self {
            categories,
            topics,
            themes,
        };
        rules.validate()?;
        Ok(rules)
    }

    fn validate(&self) -> anyhow::Result<()> {
        for set in &self.categories {
            if set.label == Category::General {
                bail!("`general` is the fallback category and cannot carry keywords");
            }
            check_keywords(set.label.slug(), &set.keywords)?;
        }
        for set in &self.topics {
            if set.label == TopicBucket::Otros {
                bail!("`otros` is the fallback topic and cannot carry keywords");
            }
            check_keywords(set.label.as_str(), &set.keywords)?;
        }
        for set in &self.themes {
            check_keywords(&set.label, &set.keywords)?;
        }
        Ok(())
    }
}

fn lowercase_sets<L>(sets: Vec<KeywordSet<L>>) -> Vec<KeywordSet<L>> {
    sets.into_iter()
        .map(|s| KeywordSet {
            label: s.label,
            keywords: s.keywords.iter().map(|k| k.trim().to_lowercase()).collect(),
        })
        .collect()
}

// An empty keyword would match every text.
fn check_keywords(label: &str, keywords: &[String]) -> anyhow::Result<()> {
    if keywords.is_empty() {
        bail!("keyword set `{label}` is empty");
    }
    if keywords.iter().any(|k| k.is_empty()) {
        bail!("keyword set `{label}` contains an empty keyword");
    }
    Ok(())
}

/// Load rules from `path`; a missing file means built-in defaults.
pub fn load_rules(path: &Path) -> anyhow::Result<MatchingRules> {
    if !path.exists() {
        info!(
            target: "matching",
            path = %path.display(),
            "rules file absent, using built-in keyword tables"
        );
        return Ok(MatchingRules::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading matching rules from {}", path.display()))?;
    MatchingRules::from_toml_str(&content)
        .with_context(|| format!("loading matching rules from {}", path.display()))
}

/* ----------------------------
Shared handle + hot reload
---------------------------- */

/// Cloneable handle to the current rules. Readers take an `Arc` snapshot per request.
#[derive(Clone)]
pub struct RulesHandle {
    inner: Arc<RwLock<Arc<MatchingRules>>>,
}

impl RulesHandle {
    pub fn new(rules: MatchingRules) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(rules))),
        }
    }

    pub fn current(&self) -> Arc<MatchingRules> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn replace(&self, rules: MatchingRules) {
        match self.inner.write() {
            Ok(mut guard) => *guard = Arc::new(rules),
            Err(poisoned) => *poisoned.into_inner() = Arc::new(rules),
        }
    }
}

impl Default for RulesHandle {
    fn default() -> Self {
        Self::new(MatchingRules::default())
    }
}

/// Modification time of the rules file, `None` when it does not exist.
pub fn rules_mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Poll `path` every 2s and swap in the new tables when its mtime differs from
/// `baseline` (the mtime seen when the active tables were loaded, `None` if the
/// file was absent). A file that appears later counts as a change. A file that
/// fails to parse is logged and the previous tables stay active.
pub fn start_hot_reload_thread(handle: RulesHandle, path: PathBuf, baseline: Option<SystemTime>) {
    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime = baseline;

        loop {
            let current = rules_mtime(&path);
            let changed = match (last_mtime, current) {
                (_, None) => false,
                (None, Some(_)) => true,
                (Some(prev), Some(now)) => now != prev,
            };
            if changed {
                match load_rules(&path) {
                    Ok(rules) => {
                        handle.replace(rules);
                        info!(
                            target: "matching",
                            path = %path.display(),
                            "matching rules reloaded"
                        );
                    }
                    Err(e) => {
                        warn!(
                            target: "matching",
                            error = ?e,
                            "matching rules reload failed; keeping previous tables"
                        );
                    }
                }
            }
            // A deleted file resets the baseline so a recreated one is picked up.
            last_mtime = current;
            thread::sleep(poll);
        }
    });
}
