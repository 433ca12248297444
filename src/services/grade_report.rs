use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::db::models::{Exam, Module};

pub(crate) const STUDENT_NAME_FIELD: &str = "student_name";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ReportColumn {
    pub(crate) field: String,
    pub(crate) label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ReportTable {
    pub(crate) headers: Vec<ReportColumn>,
    pub(crate) rows: Vec<Map<String, Value>>,
}

/// A single report cell. `Missing` is distinct from a score of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReportCell {
    Score(i64),
    Missing,
}

impl ReportCell {
    fn render(self, marker: &str) -> Value {
        match self {
            ReportCell::Score(score) => Value::from(score),
            ReportCell::Missing => Value::from(marker),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ReportStudent {
    pub(crate) id: String,
    pub(crate) name: String,
}

/// Scores looked up by `(column id, student id)`.
#[derive(Debug, Default)]
pub(crate) struct ReportScores {
    /// Latest manual grade per module.
    pub(crate) modules: HashMap<(String, String), i32>,
    /// Live sum of answer scores per exam.
    pub(crate) exams: HashMap<(String, String), i64>,
}

impl ReportScores {
    fn module_cell(&self, module_id: &str, student_id: &str) -> ReportCell {
        self.modules
            .get(&(module_id.to_string(), student_id.to_string()))
            .map(|score| ReportCell::Score(i64::from(*score)))
            .unwrap_or(ReportCell::Missing)
    }

    fn exam_cell(&self, exam_id: &str, student_id: &str) -> ReportCell {
        self.exams
            .get(&(exam_id.to_string(), student_id.to_string()))
            .map(|total| ReportCell::Score(*total))
            .unwrap_or(ReportCell::Missing)
    }
}

pub(crate) fn module_field(module_id: &str) -> String {
    format!("module_{module_id}")
}

pub(crate) fn exam_field(exam_id: &str) -> String {
    format!("exam_{exam_id}")
}

fn module_label(module: &Module) -> String {
    [module.kind.trim(), module.name.trim()]
        .into_iter()
        .find(|label| !label.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Module {}", module.id))
}

fn score_columns(modules: &[&Module], exams: &[&Exam]) -> Vec<ReportColumn> {
    let module_columns = modules.iter().map(|module| ReportColumn {
        field: module_field(&module.id),
        label: module_label(module),
    });
    let exam_columns = exams
        .iter()
        .map(|exam| ReportColumn { field: exam_field(&exam.id), label: exam.kind.clone() });

    module_columns.chain(exam_columns).collect()
}

fn score_row(
    student_id: &str,
    modules: &[&Module],
    exams: &[&Exam],
    scores: &ReportScores,
    marker: &str,
) -> Map<String, Value> {
    let mut row = Map::new();
    for module in modules {
        row.insert(
            module_field(&module.id),
            scores.module_cell(&module.id, student_id).render(marker),
        );
    }
    for exam in exams {
        row.insert(exam_field(&exam.id), scores.exam_cell(&exam.id, student_id).render(marker));
    }
    row
}

/// Staff view of one class offering: one row per student, a name column
/// followed by one column per module and one per exam.
pub(crate) fn class_offering_table(
    students: &[ReportStudent],
    modules: &[Module],
    exams: &[Exam],
    scores: &ReportScores,
    marker: &str,
) -> ReportTable {
    let modules: Vec<&Module> = modules.iter().collect();
    let exams: Vec<&Exam> = exams.iter().collect();

    let mut headers = vec![ReportColumn {
        field: STUDENT_NAME_FIELD.to_string(),
        label: "Student name".to_string(),
    }];
    headers.extend(score_columns(&modules, &exams));

    let rows = students
        .iter()
        .map(|student| {
            let mut row = score_row(&student.id, &modules, &exams, scores, marker);
            row.insert("student_id".to_string(), Value::from(student.id.clone()));
            row.insert(STUDENT_NAME_FIELD.to_string(), Value::from(student.name.clone()));
            row
        })
        .collect();

    ReportTable { headers, rows }
}

/// Student view of one class offering: the offering's modules and exams as
/// columns and the student's own single row.
pub(crate) fn student_offering_table(
    student_id: &str,
    class_offering_id: &str,
    modules: &[Module],
    exams: &[Exam],
    scores: &ReportScores,
    marker: &str,
) -> ReportTable {
    let modules: Vec<&Module> =
        modules.iter().filter(|module| module.class_offering_id == class_offering_id).collect();
    let exams: Vec<&Exam> =
        exams.iter().filter(|exam| exam.class_offering_id == class_offering_id).collect();

    ReportTable {
        headers: score_columns(&modules, &exams),
        rows: vec![score_row(student_id, &modules, &exams, scores, marker)],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::*;

    fn module(id: &str, offering: &str, kind: &str, name: &str) -> Module {
        Module {
            id: id.to_string(),
            class_offering_id: offering.to_string(),
            name: name.to_string(),
            kind: kind.to_string(),
            description: None,
            start_time: None,
            end_time: None,
            created_by: None,
            created_at: datetime!(2026-01-10 08:00),
            updated_at: datetime!(2026-01-10 08:00),
        }
    }

    fn exam(id: &str, offering: &str, kind: &str) -> Exam {
        Exam {
            id: id.to_string(),
            class_offering_id: offering.to_string(),
            kind: kind.to_string(),
            start_time: datetime!(2026-02-01 08:00),
            end_time: datetime!(2026-02-01 10:00),
            created_by: None,
            created_at: datetime!(2026-01-10 08:00),
            updated_at: datetime!(2026-01-10 08:00),
        }
    }

    fn student(id: &str, name: &str) -> ReportStudent {
        ReportStudent { id: id.to_string(), name: name.to_string() }
    }

    fn key(column: &str, student: &str) -> (String, String) {
        (column.to_string(), student.to_string())
    }

    #[test]
    fn staff_table_has_name_then_modules_then_exams() {
        let table = class_offering_table(
            &[student("s1", "Ana")],
            &[module("m1", "co1", "Quiz 1", "Fractions")],
            &[exam("e1", "co1", "midterm")],
            &ReportScores::default(),
            "-",
        );

        let fields: Vec<&str> = table.headers.iter().map(|h| h.field.as_str()).collect();
        assert_eq!(fields, vec!["student_name", "module_m1", "exam_e1"]);
        assert_eq!(table.headers[1].label, "Quiz 1");
        assert_eq!(table.headers[2].label, "midterm");
    }

    #[test]
    fn missing_scores_render_marker_but_zero_stays_zero() {
        let mut scores = ReportScores::default();
        scores.exams.insert(key("e1", "s1"), 0);

        let table = class_offering_table(
            &[student("s1", "Ana"), student("s2", "Budi")],
            &[module("m1", "co1", "Quiz", "")],
            &[exam("e1", "co1", "final")],
            &scores,
            "-",
        );

        assert_eq!(table.rows[0]["exam_e1"], json!(0));
        assert_eq!(table.rows[0]["module_m1"], json!("-"));
        assert_eq!(table.rows[1]["exam_e1"], json!("-"));
        assert_eq!(table.rows[1][STUDENT_NAME_FIELD], json!("Budi"));
    }

    #[test]
    fn exam_cell_is_the_provided_live_total() {
        let mut scores = ReportScores::default();
        scores.exams.insert(key("e1", "s1"), 10);
        scores.modules.insert(key("m1", "s1"), 85);

        let table = class_offering_table(
            &[student("s1", "Ana")],
            &[module("m1", "co1", "", "Essay")],
            &[exam("e1", "co1", "final")],
            &scores,
            "n/a",
        );

        assert_eq!(table.rows[0]["exam_e1"], json!(10));
        assert_eq!(table.rows[0]["module_m1"], json!(85));
        assert_eq!(table.headers[1].label, "Essay");
    }

    #[test]
    fn module_label_falls_back_to_id() {
        let table = class_offering_table(
            &[],
            &[module("m9", "co1", " ", "")],
            &[],
            &ReportScores::default(),
            "-",
        );
        assert_eq!(table.headers[1].label, "Module m9");
        assert!(table.rows.is_empty());
    }

    #[test]
    fn student_table_only_uses_columns_of_its_offering() {
        let modules = vec![module("m1", "co1", "Quiz", ""), module("m2", "co2", "Lab", "")];
        let exams = vec![exam("e1", "co1", "midterm"), exam("e2", "co2", "final")];
        let mut scores = ReportScores::default();
        scores.modules.insert(key("m1", "s1"), 70);

        let table = student_offering_table("s1", "co1", &modules, &exams, &scores, "-");

        let fields: Vec<&str> = table.headers.iter().map(|h| h.field.as_str()).collect();
        assert_eq!(fields, vec!["module_m1", "exam_e1"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0]["module_m1"], json!(70));
        assert_eq!(table.rows[0]["exam_e1"], json!("-"));
        assert!(!table.rows[0].contains_key("module_m2"));
    }
}
