use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::UserRole;
use crate::test_support;

#[tokio::test]
async fn admin_can_create_update_and_delete_user() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };

    let admin =
        test_support::insert_user(ctx.state.db(), "admin", "Admin", "admin-pass", UserRole::Admin)
            .await;
    let token = test_support::bearer_token(&admin, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/users",
            Some(&token),
            Some(json!({
                "username": "budi",
                "full_name": "Budi Santoso",
                "password": "student-pass",
                "nis": "1001",
                "nisn": "0012345678"
            })),
        ))
        .await
        .expect("create user");

    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["role"], "student");
    assert_eq!(created["student_number"], "1001");
    assert!(created.get("hashed_password").is_none());
    let user_id = created["id"].as_str().expect("user id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/users/{user_id}"),
            Some(&token),
            Some(json!({"full_name": "Budi S.", "is_active": false})),
        ))
        .await
        .expect("update user");

    let status = response.status();
    let updated = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {updated}");
    assert_eq!(updated["full_name"], "Budi S.");
    assert_eq!(updated["is_active"], false);
    assert_eq!(updated["student_number"], "1001");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/users/{user_id}"),
            Some(&token),
            None,
        ))
        .await
        .expect("delete user");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/users/{user_id}"),
            Some(&token),
            None,
        ))
        .await
        .expect("get deleted user");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };

    let admin =
        test_support::insert_user(ctx.state.db(), "admin", "Admin", "admin-pass", UserRole::Admin)
            .await;
    test_support::insert_user(ctx.state.db(), "sari", "Sari", "student-pass", UserRole::Student)
        .await;
    let token = test_support::bearer_token(&admin, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/users",
            Some(&token),
            Some(json!({"username": "sari", "full_name": "Sari Lain", "password": "another-pass"})),
        ))
        .await
        .expect("create duplicate");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert_eq!(body["detail"], "User with this username already exists");
}

#[tokio::test]
async fn teacher_cannot_list_users() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };

    let teacher = test_support::insert_user(
        ctx.state.db(),
        "guru",
        "Guru Matematika",
        "teacher-pass",
        UserRole::Teacher,
    )
    .await;
    let token = test_support::bearer_token(&teacher, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::GET, "/api/v1/users", Some(&token), None))
        .await
        .expect("list users");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn login_me_and_logout_revokes_token() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };

    test_support::insert_user(ctx.state.db(), "rina", "Rina", "student-pass", UserRole::Student)
        .await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "rina", "password": "student-pass"})),
        ))
        .await
        .expect("login");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().expect("token").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/me", Some(&token), None))
        .await
        .expect("me");
    assert_eq!(response.status(), StatusCode::OK);
    let me = test_support::read_json(response).await;
    assert_eq!(me["username"], "rina");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/logout",
            Some(&token),
            None,
        ))
        .await
        .expect("logout");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/me", Some(&token), None))
        .await
        .expect("me after logout");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = test_support::read_json(response).await;
    assert_eq!(body["detail"], "Token has been revoked");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let Some(ctx) = test_support::setup_test_context().await else {
        return;
    };

    test_support::insert_user(ctx.state.db(), "rina", "Rina", "student-pass", UserRole::Student)
        .await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "rina", "password": "wrong-pass"})),
        ))
        .await
        .expect("login");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
