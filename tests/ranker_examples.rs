//! End-to-end ranking scenarios over small hand-built question banks.
//! Category detection runs first; the ranker only sees `general` queries.

use async_trait::async_trait;
use faq_assistant::matching::{
    detect_category, find_similar_questions, rank_candidates, rank_scored, Category,
    MatchingRules,
};
use faq_assistant::model::Question;
use faq_assistant::store::{DataAccessError, MemoryStore, QuestionBank, SeedData, StoreResult};

fn q(question: &str, answer: &str) -> Question {
    Question::new(question, answer)
}

struct DownBank;

#[async_trait]
impl QuestionBank for DownBank {
    async fn fetch_all_questions(&self) -> StoreResult<Vec<Question>> {
        Err(DataAccessError::Unreachable("connection refused".into()))
    }
}

#[test]
fn class_start_query_routes_to_horarios() {
    let rules = MatchingRules::default();
    assert_eq!(
        detect_category("¿Cuándo inician las clases?", &rules.categories),
        Category::Horarios
    );
}

#[test]
fn vague_query_is_general_and_empty_bank_ranks_nothing() {
    let rules = MatchingRules::default();
    let query = "no se que hacer con mi vida";
    assert_eq!(detect_category(query, &rules.categories), Category::General);
    assert!(rank_candidates(query, Vec::new(), &rules).is_empty());
}

#[test]
fn single_exam_question_is_the_sole_candidate() {
    let rules = MatchingRules::default();
    let bank = vec![q("¿Cuándo es el examen final?", "El 15 de diciembre.")];
    let ranked = rank_scored("cuando sera el examen", bank, &rules);

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].question.question, "¿Cuándo es el examen final?");
    assert!(ranked[0].similarity > 0.2, "score {}", ranked[0].similarity);
}

#[test]
fn crowded_topic_contributes_at_most_two() {
    let rules = MatchingRules::default();
    let bank = vec![
        q("¿Cuándo es el examen final de física?", "Consulta el calendario."),
        q("¿Cuándo es el examen final?", "El 15 de diciembre."),
        q("¿Cuándo es el examen final de química?", "Consulta el calendario."),
    ];
    let ranked = rank_scored("cuando es el examen final", bank, &rules);

    assert_eq!(ranked.len(), 2, "{ranked:?}");
    assert_eq!(ranked[0].question.question, "¿Cuándo es el examen final?");
}

#[test]
fn never_more_than_five_and_sorted_desc() {
    let rules = MatchingRules::default();
    let bank = vec![
        q("¿Cuándo es el examen parcial?", "En la semana 8."),
        q("¿Cuándo es el examen final?", "El 15 de diciembre."),
        q("¿Cuándo empieza el curso de verano?", "En junio."),
        q("¿Cuándo abre el laboratorio?", "A las 8."),
        q("¿Cuándo es la baja de materias?", "Hasta la semana 4."),
        q("¿Cuándo es la inscripcion?", "En enero."),
        q("¿Cuándo termina el periodo?", "En diciembre."),
        q("¿Cuándo inicio el periodo?", "En agosto."),
        q("¿Quién es el coordinador?", "La oficina 3."),
        q("¿Cuándo hay asesorias?", "Los martes."),
    ];
    let ranked = rank_scored("cuando es", bank, &rules);

    assert!(ranked.len() <= 5, "{ranked:?}");
    assert!(!ranked.is_empty());
    for pair in ranked.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity, "{ranked:?}");
    }
    assert!(ranked.iter().all(|sq| sq.similarity > 0.2));
}

#[tokio::test]
async fn unreachable_bank_yields_no_candidates() {
    let rules = MatchingRules::default();
    let out = find_similar_questions(&DownBank, "cuando sera el examen", &rules).await;
    assert!(out.is_empty());
}

#[tokio::test]
async fn memory_bank_is_read_fresh_on_each_call() {
    let rules = MatchingRules::default();
    let store = MemoryStore::new(SeedData::default(), 10);
    assert!(find_similar_questions(&store, "cuando sera el examen", &rules)
        .await
        .is_empty());

    store
        .set_questions(vec![q("¿Cuándo es el examen final?", "El 15 de diciembre.")])
        .expect("replace bank");
    let out = find_similar_questions(&store, "cuando sera el examen", &rules).await;
    assert_eq!(out.len(), 1);
}
