use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::{AnswerValue, QuestionKind, UserRole};
use crate::test_support;

#[tokio::test]
async fn teacher_creates_exam_with_roster() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let db = ctx.state.db();

    let teacher =
        test_support::insert_user(db, "guru", "Guru", "teacher-pass", UserRole::Teacher).await;
    let student =
        test_support::insert_user(db, "ani", "Ani", "student-pass", UserRole::Student).await;
    let offering =
        test_support::insert_offering(db, "Matematika", &teacher.id, &[student.id.clone()]).await;
    let token = test_support::bearer_token(&teacher, ctx.state.settings());

    let payload = json!({
        "class_offering_id": offering.id,
        "kind": "UTS",
        "roster": [student.id, student.id],
        "start_time": "2026-03-01T08:00:00Z",
        "end_time": "2026-03-01T10:00:00Z"
    });

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&token),
            Some(payload.clone()),
        ))
        .await
        .expect("create exam");
    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["roster"], json!([student.id]));
    assert_eq!(created["start_time"], "2026-03-01T08:00:00Z");

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&token),
            Some(payload),
        ))
        .await
        .expect("create duplicate exam");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert_eq!(body["detail"], "An exam of this kind already exists for the class offering");
}

#[tokio::test]
async fn create_rejects_inverted_window() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let db = ctx.state.db();

    let teacher =
        test_support::insert_user(db, "guru", "Guru", "teacher-pass", UserRole::Teacher).await;
    let offering = test_support::insert_offering(db, "Kimia", &teacher.id, &[]).await;
    let token = test_support::bearer_token(&teacher, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&token),
            Some(json!({
                "class_offering_id": offering.id,
                "kind": "UAS",
                "roster": ["someone"],
                "start_time": "2026-03-01T10:00:00Z",
                "end_time": "2026-03-01T08:00:00Z"
            })),
        ))
        .await
        .expect("create exam");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert_eq!(body["errors"]["end_time"][0], "end_time must be after start_time");
}

#[tokio::test]
async fn list_marks_unregistered_and_completed_exams() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let db = ctx.state.db();

    let teacher =
        test_support::insert_user(db, "guru", "Guru", "teacher-pass", UserRole::Teacher).await;
    let student =
        test_support::insert_user(db, "ani", "Ani", "student-pass", UserRole::Student).await;
    let other =
        test_support::insert_user(db, "budi", "Budi", "student-pass", UserRole::Student).await;
    let offering = test_support::insert_offering(
        db,
        "Fisika",
        &teacher.id,
        &[student.id.clone(), other.id.clone()],
    )
    .await;

    let registered = test_support::insert_exam(
        db,
        &offering.id,
        "UTS",
        &teacher.id,
        test_support::open_window(),
        &[student.id.clone()],
    )
    .await;
    let foreign = test_support::insert_exam(
        db,
        &offering.id,
        "UAS",
        &teacher.id,
        test_support::open_window(),
        &[other.id.clone()],
    )
    .await;
    let question = test_support::insert_question(
        db,
        &registered.id,
        QuestionKind::SingleChoice,
        Some(AnswerValue::Text("A".to_string())),
        10,
    )
    .await;

    let token = test_support::bearer_token(&student, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/answers",
            Some(&token),
            Some(json!({"question_id": question.id, "value": "A"})),
        ))
        .await
        .expect("answer");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams?class_offering_id={}", offering.id),
            Some(&token),
            None,
        ))
        .await
        .expect("list exams");
    assert_eq!(response.status(), StatusCode::OK);
    let items = test_support::read_json(response).await;
    let items = items.as_array().expect("exam list");
    assert_eq!(items.len(), 2);

    let find = |id: &str| items.iter().find(|item| item["id"] == id).expect("exam listed");
    let registered_item = find(&registered.id);
    assert_eq!(registered_item["available"], false);
    assert_eq!(registered_item["notes"], "Already completed");
    assert_eq!(registered_item["student_count"], 2);
    assert_eq!(registered_item["roster_size"], 1);

    let foreign_item = find(&foreign.id);
    assert_eq!(foreign_item["available"], false);
    assert_eq!(foreign_item["notes"], "Not registered");
}

#[tokio::test]
async fn update_merges_fields_and_replaces_roster() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let db = ctx.state.db();

    let teacher =
        test_support::insert_user(db, "guru", "Guru", "teacher-pass", UserRole::Teacher).await;
    let first =
        test_support::insert_user(db, "ani", "Ani", "student-pass", UserRole::Student).await;
    let second =
        test_support::insert_user(db, "budi", "Budi", "student-pass", UserRole::Student).await;
    let offering = test_support::insert_offering(db, "Sejarah", &teacher.id, &[]).await;
    let exam = test_support::insert_exam(
        db,
        &offering.id,
        "UTS",
        &teacher.id,
        test_support::open_window(),
        &[first.id.clone()],
    )
    .await;
    let token = test_support::bearer_token(&teacher, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/exams/{}", exam.id),
            Some(&token),
            Some(json!({"kind": "Remedial UTS", "roster": [second.id]})),
        ))
        .await
        .expect("update exam");
    let status = response.status();
    let updated = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {updated}");
    assert_eq!(updated["kind"], "Remedial UTS");
    assert_eq!(updated["class_offering_id"], offering.id.as_str());
    assert_eq!(updated["roster"], json!([second.id]));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/exams/{}", exam.id),
            Some(&token),
            None,
        ))
        .await
        .expect("delete exam");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/{}", exam.id),
            Some(&token),
            None,
        ))
        .await
        .expect("get deleted exam");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn review_reports_live_totals_for_whole_roster() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };
    let db = ctx.state.db();

    let teacher =
        test_support::insert_user(db, "guru", "Guru", "teacher-pass", UserRole::Teacher).await;
    let ani = test_support::insert_user(db, "ani", "Ani", "student-pass", UserRole::Student).await;
    let budi =
        test_support::insert_user(db, "budi", "Budi", "student-pass", UserRole::Student).await;
    let offering = test_support::insert_offering(db, "Ekonomi", &teacher.id, &[]).await;
    let exam = test_support::insert_exam(
        db,
        &offering.id,
        "UTS",
        &teacher.id,
        test_support::open_window(),
        &[ani.id.clone(), budi.id.clone()],
    )
    .await;
    let question = test_support::insert_question(
        db,
        &exam.id,
        QuestionKind::SingleChoice,
        Some(AnswerValue::Text("B".to_string())),
        25,
    )
    .await;

    let student_token = test_support::bearer_token(&ani, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/answers",
            Some(&student_token),
            Some(json!({"question_id": question.id, "value": " B "})),
        ))
        .await
        .expect("answer");
    assert_eq!(response.status(), StatusCode::CREATED);

    let token = test_support::bearer_token(&teacher, ctx.state.settings());
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/{}/review", exam.id),
            Some(&token),
            None,
        ))
        .await
        .expect("review");
    assert_eq!(response.status(), StatusCode::OK);
    let review = test_support::read_json(response).await;
    assert_eq!(review["question_count"], 1);

    let students = review["students"].as_array().expect("students");
    assert_eq!(students.len(), 2);
    assert_eq!(students[0]["full_name"], "Ani");
    assert_eq!(students[0]["total_score"], 25);
    assert_eq!(students[1]["full_name"], "Budi");
    assert_eq!(students[1]["total_score"], 0);
}
