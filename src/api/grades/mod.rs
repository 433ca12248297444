mod handlers;
mod reports;

use axum::{routing::get, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_grades).post(handlers::create_grades).put(handlers::update_grades),
        )
        .route("/class-offerings/:class_offering_id/report", get(reports::class_offering_report))
        .route("/students/me/academic-years/:academic_year_id/report", get(reports::student_report))
        .route("/:grade_id", get(handlers::get_grade).delete(handlers::delete_grade))
}
