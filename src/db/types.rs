use serde::{Deserialize, Deserializer, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Admin,
    Teacher,
    Student,
}

impl UserRole {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Teacher => "teacher",
            UserRole::Student => "student",
        }
    }

    pub(crate) fn is_staff(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Teacher)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "questionkind", rename_all = "snake_case")]
pub(crate) enum QuestionKind {
    SingleChoice,
    MultipleChoice,
    Essay,
}

impl QuestionKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            QuestionKind::SingleChoice => "single_choice",
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::Essay => "essay",
        }
    }

    /// Objective kinds are scored automatically on submission.
    pub(crate) fn is_objective(self) -> bool {
        matches!(self, QuestionKind::SingleChoice | QuestionKind::MultipleChoice)
    }
}

/// Stored shape of a submitted answer or an answer key: a single text value or a
/// list of choices. Persisted as JSONB.
///
/// Numbers and booleans are accepted on input and kept as their text, both as
/// a whole value and as list items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub(crate) enum AnswerValue {
    Text(String),
    Choices(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarInput {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl ScalarInput {
    fn into_text(self) -> String {
        match self {
            ScalarInput::Text(text) => text,
            ScalarInput::Number(number) => number.to_string(),
            ScalarInput::Flag(flag) => flag.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnswerValueInput {
    Scalar(ScalarInput),
    Choices(Vec<ScalarInput>),
}

impl<'de> Deserialize<'de> for AnswerValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match AnswerValueInput::deserialize(deserializer)? {
            AnswerValueInput::Scalar(scalar) => AnswerValue::Text(scalar.into_text()),
            AnswerValueInput::Choices(items) => {
                AnswerValue::Choices(items.into_iter().map(ScalarInput::into_text).collect())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_value_serializes_without_tag() {
        let text = serde_json::to_value(AnswerValue::Text("B".to_string())).unwrap();
        let choices =
            serde_json::to_value(AnswerValue::Choices(vec!["A".to_string(), "C".to_string()]))
                .unwrap();

        assert_eq!(text, serde_json::json!("B"));
        assert_eq!(choices, serde_json::json!(["A", "C"]));
    }

    #[test]
    fn answer_value_coerces_numbers_and_flags_to_text() {
        let number: AnswerValue = serde_json::from_value(serde_json::json!(4)).unwrap();
        let flag: AnswerValue = serde_json::from_value(serde_json::json!(true)).unwrap();
        let mixed: AnswerValue = serde_json::from_value(serde_json::json!(["A", 2])).unwrap();

        assert_eq!(number, AnswerValue::Text("4".to_string()));
        assert_eq!(flag, AnswerValue::Text("true".to_string()));
        assert_eq!(mixed, AnswerValue::Choices(vec!["A".to_string(), "2".to_string()]));
        assert!(serde_json::from_value::<AnswerValue>(serde_json::json!({"a": 1})).is_err());
    }

    #[test]
    fn question_kind_objective_split() {
        assert!(QuestionKind::SingleChoice.is_objective());
        assert!(QuestionKind::MultipleChoice.is_objective());
        assert!(!QuestionKind::Essay.is_objective());
    }

    #[test]
    fn roles_deserialize_lowercase() {
        let role: UserRole = serde_json::from_str("\"teacher\"").unwrap();
        assert_eq!(role, UserRole::Teacher);
        assert!(role.is_staff());
        assert!(!UserRole::Student.is_staff());
    }
}
