// src/matching/similarity.rs
//! Heuristic multi-signal string similarity.
//!
//! Both inputs are normalized first, then four signals are blended:
//! - word overlap   : words of `a` found in `b`, over the longer word list
//! - substring      : 0.5 if either string contains the other
//! - keyword bonus  : +0.3 per thematic set hit on both sides (up to 1.2)
//! - length penalty : `1 - 0.5 * |len_a - len_b| / max(len_a, len_b)`
//!
//! The blend is not clamped, so results slightly above 1.0 are possible.

use serde::Serialize;

use super::normalize::normalize;
use super::rules::KeywordSet;

pub const WORD_OVERLAP_WEIGHT: f64 = 0.4;
pub const SUBSTRING_WEIGHT: f64 = 0.2;
pub const KEYWORD_WEIGHT: f64 = 0.3;
pub const LENGTH_WEIGHT: f64 = 0.1;

pub const SUBSTRING_SCORE: f64 = 0.5;
pub const THEME_BONUS: f64 = 0.3;

/// Per-signal values before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarityBreakdown {
    pub word_overlap: f64,
    pub substring: f64,
    pub keyword: f64,
    pub length_penalty: f64,
}

impl SimilarityBreakdown {
    pub fn total(&self) -> f64 {
        WORD_OVERLAP_WEIGHT * self.word_overlap
            + SUBSTRING_WEIGHT * self.substring
            + KEYWORD_WEIGHT * self.keyword
            + LENGTH_WEIGHT * self.length_penalty
    }
}

/// Blended similarity of `a` against `b`.
pub fn similarity(a: &str, b: &str, themes: &[KeywordSet<String>]) -> f64 {
    breakdown(a, b, themes).total()
}

pub fn breakdown(a: &str, b: &str, themes: &[KeywordSet<String>]) -> SimilarityBreakdown {
    let s1 = normalize(a);
    let s2 = normalize(b);
    SimilarityBreakdown {
        word_overlap: word_overlap(&s1, &s2),
        substring: substring_score(&s1, &s2),
        keyword: keyword_score(&s1, &s2, themes),
        length_penalty: length_penalty(&s1, &s2),
    }
}

/// Not deduplicated: a word repeated in `s1` counts once per occurrence.
fn word_overlap(s1: &str, s2: &str) -> f64 {
    let words1: Vec<&str> = s1.split_whitespace().collect();
    let words2: Vec<&str> = s2.split_whitespace().collect();
    let longest = words1.len().max(words2.len());
    if words1.is_empty() || words2.is_empty() {
        return 0.0;
    }
    let common = words1.iter().filter(|w| words2.contains(w)).count();
    common as f64 / longest as f64
}

fn substring_score(s1: &str, s2: &str) -> f64 {
    if s1.contains(s2) || s2.contains(s1) {
        SUBSTRING_SCORE
    } else {
        0.0
    }
}

fn keyword_score(s1: &str, s2: &str, themes: &[KeywordSet<String>]) -> f64 {
    let hits = themes
        .iter()
        .filter(|set| set.matches(s1) && set.matches(s2))
        .count();
    THEME_BONUS * hits as f64
}

fn length_penalty(s1: &str, s2: &str) -> f64 {
    let len1 = s1.chars().count();
    let len2 = s2.chars().count();
    let longest = len1.max(len2);
    if longest == 0 {
        return 1.0;
    }
    let diff = len1.abs_diff(len2) as f64 / longest as f64;
    1.0 - diff * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::rules::MatchingRules;

    const EPS: f64 = 1e-9;

    fn themes() -> Vec<KeywordSet<String>> {
        MatchingRules::default().themes
    }

    #[test]
    fn identical_text_without_keywords() {
        let b = breakdown("Hola mundo", "hola mundo", &themes());
        assert!((b.word_overlap - 1.0).abs() < EPS);
        assert!((b.substring - 0.5).abs() < EPS);
        assert_eq!(b.keyword, 0.0);
        assert!((b.length_penalty - 1.0).abs() < EPS);
        assert!((b.total() - 0.6).abs() < EPS);
    }

    #[test]
    fn identical_text_with_keywords_gets_bonus() {
        // "examen final" hits only the academico theme.
        let s = similarity("examen final", "examen final", &themes());
        assert!((s - 0.69).abs() < EPS, "got {s}");
    }

    #[test]
    fn worked_example_against_question_text() {
        let b = breakdown("cuando sera el examen", "¿Cuándo es el examen final?", &themes());
        // 3 of 5 words (cuando, el, examen) against the longer list.
        assert!((b.word_overlap - 0.6).abs() < EPS);
        assert_eq!(b.substring, 0.0);
        // tiempo (cuando) + academico (examen).
        assert!((b.keyword - 0.6).abs() < EPS);
        // 21 vs 25 chars.
        assert!((b.length_penalty - 0.92).abs() < EPS);
        assert!((b.total() - 0.512).abs() < EPS);
    }

    #[test]
    fn keyword_term_can_exceed_one() {
        let t = "cuando hacer el horario de la clase";
        let b = breakdown(t, t, &themes());
        // tiempo, accion, documentos, academico all hit.
        assert!((b.keyword - 1.2).abs() < EPS);
        assert!(b.total() > 0.9);
    }

    #[test]
    fn empty_inputs_do_not_produce_nan() {
        let b = breakdown("", "", &themes());
        assert_eq!(b.word_overlap, 0.0);
        assert_eq!(b.length_penalty, 1.0);
        assert!(b.total().is_finite());

        let one_side = breakdown("¿?", "algo", &themes());
        assert_eq!(one_side.word_overlap, 0.0);
        assert!((one_side.length_penalty - 0.5).abs() < EPS);
    }

    #[test]
    fn repeated_words_make_overlap_order_dependent() {
        let ab = breakdown("si si si", "si no", &themes()).word_overlap;
        let ba = breakdown("si no", "si si si", &themes()).word_overlap;
        assert!((ab - 1.0).abs() < EPS);
        assert!((ba - 1.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn substring_either_direction() {
        let b = breakdown("examen", "el examen parcial", &[]);
        assert_eq!(b.substring, 0.5);
        let b = breakdown("el examen parcial", "examen", &[]);
        assert_eq!(b.substring, 0.5);
        let b = breakdown("examen", "clase", &[]);
        assert_eq!(b.substring, 0.0);
    }
}
