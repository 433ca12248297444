pub(crate) mod academic_years;
pub(crate) mod answers;
pub(crate) mod class_offerings;
pub(crate) mod classes;
pub(crate) mod enrollments;
pub(crate) mod exams;
pub(crate) mod grades;
pub(crate) mod health;
pub(crate) mod modules;
pub(crate) mod questions;
pub(crate) mod subjects;
pub(crate) mod users;
