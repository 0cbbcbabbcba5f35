// src/matching/topic.rs
//! Coarse topic buckets used only to diversify ranked candidates.

use serde::{Deserialize, Serialize};

use super::rules::{first_match, KeywordSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicBucket {
    Examenes,
    Clases,
    Tramites,
    Fechas,
    Otros,
}

impl TopicBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            TopicBucket::Examenes => "examenes",
            TopicBucket::Clases => "clases",
            TopicBucket::Tramites => "tramites",
            TopicBucket::Fechas => "fechas",
            TopicBucket::Otros => "otros",
        }
    }
}

/// Bucket for a candidate's question text; same first-match policy as categories.
pub fn detect_topic(text: &str, table: &[KeywordSet<TopicBucket>]) -> TopicBucket {
    first_match(text, table).unwrap_or(TopicBucket::Otros)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::rules::MatchingRules;

    fn topic(t: &str) -> TopicBucket {
        detect_topic(t, &MatchingRules::default().topics)
    }

    #[test]
    fn buckets_by_keyword() {
        assert_eq!(topic("¿Cuándo es el examen final?"), TopicBucket::Examenes);
        assert_eq!(topic("¿Dónde es el laboratorio?"), TopicBucket::Clases);
        assert_eq!(topic("¿Cómo doy de baja una materia?"), TopicBucket::Tramites);
        assert_eq!(topic("¿Cuando termina el periodo?"), TopicBucket::Fechas);
        assert_eq!(topic("¿Quién es el coordinador?"), TopicBucket::Otros);
    }

    #[test]
    fn earlier_bucket_wins() {
        // "horario" (clases) and "fecha" (fechas) both present.
        assert_eq!(topic("fecha y horario"), TopicBucket::Clases);
        // "final" (examenes) beats "inicio" (fechas).
        assert_eq!(topic("inicio del final"), TopicBucket::Examenes);
    }

    #[test]
    fn accented_spelling_does_not_fold() {
        // "inscripción" does not contain "inscripcion"; "cuándo" does not contain "cuando".
        assert_eq!(topic("¿Cuándo es la inscripción?"), TopicBucket::Otros);
    }
}
