use std::collections::BTreeSet;

use serde_json::Value;

use crate::db::types::{AnswerValue, QuestionKind};

/// Outcome of auto-scoring one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Scored {
    pub(crate) score: i32,
    /// `None` for kinds that need manual grading.
    pub(crate) is_correct: Option<bool>,
}

/// Coerces a raw submitted JSON value into its stored shape.
///
/// Arrays become a list of strings (non-string elements are rendered as JSON
/// text), scalars become text, objects become their canonical JSON text and
/// null stays null.
pub(crate) fn normalize_submission(raw: Option<&Value>) -> Option<AnswerValue> {
    match raw? {
        Value::Null => None,
        Value::String(text) => Some(AnswerValue::Text(text.clone())),
        Value::Number(number) => Some(AnswerValue::Text(number.to_string())),
        Value::Bool(flag) => Some(AnswerValue::Text(flag.to_string())),
        Value::Array(items) => Some(AnswerValue::Choices(items.iter().map(element_text).collect())),
        object @ Value::Object(_) => Some(AnswerValue::Text(object.to_string())),
    }
}

fn element_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Scores a submission against the question's key. Objective kinds earn the
/// full `points` or nothing; essays always start at 0.
pub(crate) fn score_answer(
    kind: QuestionKind,
    points: i32,
    key: Option<&AnswerValue>,
    submitted: Option<&AnswerValue>,
) -> Scored {
    let is_correct = match kind {
        QuestionKind::Essay => return Scored { score: 0, is_correct: None },
        QuestionKind::SingleChoice => single_choice_matches(key, submitted),
        QuestionKind::MultipleChoice => multiple_choice_matches(key, submitted),
    };

    Scored { score: if is_correct { points.max(0) } else { 0 }, is_correct: Some(is_correct) }
}

fn single_choice_matches(key: Option<&AnswerValue>, submitted: Option<&AnswerValue>) -> bool {
    let (Some(key), Some(submitted)) = (key, submitted) else {
        return false;
    };

    as_text(key).trim() == as_text(submitted).trim()
}

fn multiple_choice_matches(key: Option<&AnswerValue>, submitted: Option<&AnswerValue>) -> bool {
    let key = choice_set(key);
    let submitted = choice_set(submitted);

    !key.is_empty() && key == submitted
}

/// Reads a value as one choice. A one-element list is that element; longer
/// lists compare as their JSON text and so never match a plain key.
fn as_text(value: &AnswerValue) -> String {
    match value {
        AnswerValue::Text(text) => text.clone(),
        AnswerValue::Choices(items) => match items.as_slice() {
            [only] => only.clone(),
            _ => serde_json::to_string(items).unwrap_or_default(),
        },
    }
}

/// Reads a value as a set of choices. A text value is accepted when it holds a
/// JSON list of strings; anything else is the empty set.
fn choice_set(value: Option<&AnswerValue>) -> BTreeSet<String> {
    let items = match value {
        Some(AnswerValue::Choices(items)) => items.clone(),
        Some(AnswerValue::Text(text)) => {
            serde_json::from_str::<Vec<String>>(text.trim()).unwrap_or_default()
        }
        None => Vec::new(),
    };

    items.into_iter().map(|item| item.trim().to_string()).collect()
}
