//! Structural registry: subjects, academic years, classes, class offerings and
//! class rosters.

mod handlers;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn subjects_router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_subjects).post(handlers::create_subject))
        .route("/:subject_id", delete(handlers::delete_subject))
}

pub(crate) fn academic_years_router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_academic_years).post(handlers::create_academic_year))
        .route("/:academic_year_id", delete(handlers::delete_academic_year))
}

pub(crate) fn classes_router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_classes).post(handlers::create_class))
        .route("/:class_id", delete(handlers::delete_class))
}

pub(crate) fn class_offerings_router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_class_offerings).post(handlers::create_class_offering))
        .route(
            "/:class_offering_id",
            get(handlers::get_class_offering).delete(handlers::delete_class_offering),
        )
        .route("/:class_offering_id/students", get(handlers::list_offering_students))
}

pub(crate) fn enrollments_router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_enrollments))
        .route("/:enrollment_id", delete(handlers::delete_enrollment))
}
