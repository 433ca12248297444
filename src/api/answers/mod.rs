mod handlers;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_answers).post(handlers::submit_answer))
        .route("/:answer_id", patch(handlers::grade_answer))
}
