use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{AcademicYear, ClassOffering, Enrollment, SchoolClass, Subject};
use crate::repositories::enrollments::RosterStudent;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectCreate {
    #[validate(length(min = 1, max = 255, message = "name must not be empty"))]
    pub(crate) name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) created_at: String,
}

impl From<Subject> for SubjectResponse {
    fn from(subject: Subject) -> Self {
        Self { id: subject.id, name: subject.name, created_at: format_primitive(subject.created_at) }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AcademicYearCreate {
    #[validate(length(min = 1, max = 100, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(default, alias = "isActive")]
    pub(crate) is_active: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct AcademicYearResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl From<AcademicYear> for AcademicYearResponse {
    fn from(year: AcademicYear) -> Self {
        Self {
            id: year.id,
            name: year.name,
            is_active: year.is_active,
            created_at: format_primitive(year.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ClassCreate {
    #[validate(length(min = 1, max = 100, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(default, alias = "gradeLevel")]
    #[validate(range(min = 1, max = 12, message = "grade_level must be in range 1..12"))]
    pub(crate) grade_level: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) grade_level: Option<i32>,
    pub(crate) created_at: String,
}

impl From<SchoolClass> for ClassResponse {
    fn from(class: SchoolClass) -> Self {
        Self {
            id: class.id,
            name: class.name,
            grade_level: class.grade_level,
            created_at: format_primitive(class.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ClassOfferingCreate {
    #[validate(length(min = 1, message = "class_id must not be empty"))]
    pub(crate) class_id: String,
    #[validate(length(min = 1, message = "academic_year_id must not be empty"))]
    pub(crate) academic_year_id: String,
    #[validate(length(min = 1, message = "subject_id must not be empty"))]
    pub(crate) subject_id: String,
    #[serde(default)]
    pub(crate) teacher_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClassOfferingQuery {
    #[serde(default)]
    pub(crate) academic_year_id: Option<String>,
    #[serde(default)]
    pub(crate) class_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassOfferingResponse {
    pub(crate) id: String,
    pub(crate) class_id: String,
    pub(crate) academic_year_id: String,
    pub(crate) subject_id: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) created_at: String,
}

impl From<ClassOffering> for ClassOfferingResponse {
    fn from(offering: ClassOffering) -> Self {
        Self {
            id: offering.id,
            class_id: offering.class_id,
            academic_year_id: offering.academic_year_id,
            subject_id: offering.subject_id,
            teacher_id: offering.teacher_id,
            created_at: format_primitive(offering.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct EnrollmentCreate {
    #[validate(length(min = 1, message = "class_id must not be empty"))]
    pub(crate) class_id: String,
    #[validate(length(min = 1, message = "academic_year_id must not be empty"))]
    pub(crate) academic_year_id: String,
    #[validate(length(min = 1, max = 500, message = "student_ids must contain 1..500 items"))]
    pub(crate) student_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentResponse {
    pub(crate) id: String,
    pub(crate) class_id: String,
    pub(crate) academic_year_id: String,
    pub(crate) student_id: String,
    pub(crate) created_at: String,
}

impl From<Enrollment> for EnrollmentResponse {
    fn from(enrollment: Enrollment) -> Self {
        Self {
            id: enrollment.id,
            class_id: enrollment.class_id,
            academic_year_id: enrollment.academic_year_id,
            student_id: enrollment.student_id,
            created_at: format_primitive(enrollment.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RosterStudentResponse {
    pub(crate) id: String,
    pub(crate) full_name: String,
    pub(crate) student_number: Option<String>,
    pub(crate) national_student_number: Option<String>,
}

impl From<RosterStudent> for RosterStudentResponse {
    fn from(student: RosterStudent) -> Self {
        Self {
            id: student.id,
            full_name: student.full_name,
            student_number: student.student_number,
            national_student_number: student.national_student_number,
        }
    }
}
