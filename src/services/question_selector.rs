use std::collections::HashSet;

use rand::Rng;

use crate::db::models::Question;

/// Picks the next question to serve.
///
/// Already answered questions are never candidates. Among the rest, objective
/// questions are preferred; essays are served only once every objective
/// question is answered. The pick within a partition is uniform.
pub(crate) fn pick_next<R: Rng + ?Sized>(
    questions: Vec<Question>,
    answered: &HashSet<String>,
    rng: &mut R,
) -> Option<Question> {
    let (objective, essays): (Vec<Question>, Vec<Question>) = questions
        .into_iter()
        .filter(|question| !answered.contains(&question.id))
        .partition(|question| question.kind.is_objective());

    let partition = if objective.is_empty() { essays } else { objective };
    if partition.is_empty() {
        return None;
    }

    let index = rng.gen_range(0..partition.len());
    partition.into_iter().nth(index)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use time::macros::datetime;

    use super::*;
    use crate::db::types::QuestionKind;

    fn question(id: &str, kind: QuestionKind) -> Question {
        Question {
            id: id.to_string(),
            exam_id: "exam-1".to_string(),
            kind,
            prompt: format!("prompt {id}"),
            choices: None,
            answer_key: None,
            image_url: None,
            points: 10,
            created_at: datetime!(2026-01-01 08:00),
            updated_at: datetime!(2026-01-01 08:00),
        }
    }

    fn answered(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn returns_none_when_everything_is_answered() {
        let mut rng = StdRng::seed_from_u64(7);
        let questions =
            vec![question("q1", QuestionKind::SingleChoice), question("q2", QuestionKind::Essay)];

        assert!(pick_next(questions, &answered(&["q1", "q2"]), &mut rng).is_none());
        assert!(pick_next(Vec::new(), &answered(&[]), &mut rng).is_none());
    }

    #[test]
    fn prefers_objective_questions() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let questions = vec![
                question("essay", QuestionKind::Essay),
                question("single", QuestionKind::SingleChoice),
                question("multi", QuestionKind::MultipleChoice),
            ];
            let picked = pick_next(questions, &answered(&[]), &mut rng).unwrap();
            assert!(picked.kind.is_objective(), "picked {}", picked.id);
        }
    }

    #[test]
    fn falls_back_to_essays_once_objective_questions_are_answered() {
        let mut rng = StdRng::seed_from_u64(3);
        let questions = vec![
            question("single", QuestionKind::SingleChoice),
            question("essay", QuestionKind::Essay),
        ];

        let picked = pick_next(questions, &answered(&["single"]), &mut rng).unwrap();
        assert_eq!(picked.id, "essay");
    }

    #[test]
    fn never_returns_an_answered_question() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let questions = vec![
                question("q1", QuestionKind::SingleChoice),
                question("q2", QuestionKind::SingleChoice),
                question("q3", QuestionKind::MultipleChoice),
            ];
            let picked = pick_next(questions, &answered(&["q1", "q3"]), &mut rng).unwrap();
            assert_eq!(picked.id, "q2");
        }
    }

    #[test]
    fn spreads_picks_across_the_partition() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let questions = vec![
                question("a", QuestionKind::SingleChoice),
                question("b", QuestionKind::SingleChoice),
                question("c", QuestionKind::MultipleChoice),
            ];
            let picked = pick_next(questions, &answered(&[]), &mut rng).unwrap();
            seen.insert(picked.id);
        }

        assert_eq!(seen.len(), 3);
    }
}
