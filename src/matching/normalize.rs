// src/matching/normalize.rs
//! Canonical text form shared by every scoring step.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Punctuation removed before comparison.
pub const STRIPPED_PUNCTUATION: [char; 6] = ['.', ',', '¿', '?', '¡', '!'];

/// Lower-case, NFD-decompose, drop combining marks and `STRIPPED_PUNCTUATION`, trim.
///
/// Idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c) && !STRIPPED_PUNCTUATION.contains(c))
        .collect();
    folded.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_accents_case_and_punctuation() {
        assert_eq!(
            normalize("¿Cuándo INICIAN las clases?"),
            "cuando inician las clases"
        );
        assert_eq!(normalize("¡Inscripción, ya!"), "inscripcion ya");
    }

    #[test]
    fn keeps_inner_whitespace_and_other_symbols() {
        assert_eq!(normalize("  pre-registro  del   día  "), "pre-registro  del   dia");
    }

    #[test]
    fn tilde_n_loses_its_mark() {
        assert_eq!(normalize("Año"), "ano");
    }

    #[test]
    fn empty_and_punctuation_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" ¿?¡! "), "");
    }

    #[test]
    fn is_idempotent_on_samples() {
        for s in ["Él Ñandú", "¿Qué?", "  x  ", "ÜBER.straße", "İstanbul"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "input: {s:?}");
        }
    }
}
