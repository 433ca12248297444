mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_question))
        .route("/staff", get(handlers::list_staff_questions))
        .route("/student", get(handlers::list_student_questions))
        .route("/random/:exam_id", get(handlers::random_question))
        .route(
            "/:question_id",
            get(handlers::get_question)
                .patch(handlers::update_question)
                .delete(handlers::delete_question),
        )
}
