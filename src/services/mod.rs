pub(crate) mod exam_access;
pub(crate) mod grade_report;
pub(crate) mod question_selector;
pub(crate) mod scoring;
