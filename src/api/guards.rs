use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::metrics;
use crate::core::redis::RevocationLookup;
use crate::core::security::{self, Claims};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Exam, User};
use crate::db::types::UserRole;
use crate::repositories;
use crate::services::exam_access;

const INVALID_CREDENTIALS: &str = "Invalid authentication credentials";

/// Authenticated request: the caller, the decoded claims and the id under
/// which the token would be revoked.
pub(crate) struct AuthSession {
    pub(crate) user: User,
    pub(crate) claims: Claims,
    pub(crate) token_id: String,
}

pub(crate) struct CurrentUser(pub(crate) User);
pub(crate) struct CurrentAdmin(pub(crate) User);
/// Admin or teacher.
pub(crate) struct CurrentStaff(pub(crate) User);
pub(crate) struct CurrentTeacher(pub(crate) User);
pub(crate) struct CurrentStudent(pub(crate) User);

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthorized(INVALID_CREDENTIALS))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized(INVALID_CREDENTIALS))?;

        let token_id = claims.revocation_id(token);
        let fail_closed = app_state.settings().security().revocation_fail_closed;
        match app_state.redis().revocation_lookup(&token_id).await {
            RevocationLookup::Active => {}
            RevocationLookup::Revoked => {
                return Err(ApiError::Unauthorized("Token has been revoked"));
            }
            RevocationLookup::Disconnected => {
                metrics::record_revocation_lookup_unavailable("disconnected");
                revocation_unavailable(fail_closed)?;
            }
            RevocationLookup::Failed(reason) => {
                metrics::record_revocation_lookup_unavailable("error");
                tracing::warn!(error = %reason, fail_closed, "Token revocation lookup failed");
                revocation_unavailable(fail_closed)?;
            }
        }

        let user = repositories::users::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

        let Some(user) = user else {
            return Err(ApiError::Unauthorized("User not found"));
        };

        if !user.is_active {
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
        }

        Ok(AuthSession { user, claims, token_id })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = AuthSession::from_request_parts(parts, state).await?;
        Ok(CurrentUser(session.user))
    }
}

/// Without a revocation answer a token is accepted unless the deployment
/// asks to fail closed.
fn revocation_unavailable(fail_closed: bool) -> Result<(), ApiError> {
    if fail_closed {
        Err(ApiError::Unauthorized("Token revocation status unavailable"))
    } else {
        Ok(())
    }
}

async fn user_with_role(
    parts: &mut Parts,
    state: &AppState,
    allowed: &[UserRole],
    message: &'static str,
) -> Result<User, ApiError> {
    let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

    if allowed.contains(&user.role) {
        Ok(user)
    } else {
        Err(ApiError::Forbidden(message))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        user_with_role(parts, state, &[UserRole::Admin], "Admin access required")
            .await
            .map(CurrentAdmin)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStaff {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        user_with_role(
            parts,
            state,
            &[UserRole::Admin, UserRole::Teacher],
            "Admin or teacher access required",
        )
        .await
        .map(CurrentStaff)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentTeacher {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        user_with_role(parts, state, &[UserRole::Teacher], "Teacher access required")
            .await
            .map(CurrentTeacher)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStudent {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        user_with_role(parts, state, &[UserRole::Student], "Student access required")
            .await
            .map(CurrentStudent)
    }
}

/// Loads an exam a student is about to work on and checks roster membership
/// and the exam window.
pub(crate) async fn require_exam_access(
    state: &AppState,
    exam_id: &str,
    student_id: &str,
) -> Result<Exam, ApiError> {
    let exam = repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let on_roster = repositories::exams::is_on_roster(state.db(), &exam.id, student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check exam roster"))?;

    exam_access::check_access(on_roster, exam.start_time, exam.end_time, primitive_now_utc())?;
    Ok(exam)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;
    use crate::core::config::Settings;
    use crate::core::redis::RedisHandle;
    use crate::test_support;

    #[test]
    fn unavailable_revocation_follows_policy() {
        assert!(revocation_unavailable(false).is_ok());
        assert!(matches!(revocation_unavailable(true), Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn fail_closed_rejects_tokens_without_redis() {
        let _guard = test_support::env_lock().await;
        std::env::set_var("SECRET_KEY", "test-secret");
        std::env::set_var("REVOCATION_FAIL_CLOSED", "1");
        let settings = Settings::load().expect("settings");
        std::env::remove_var("REVOCATION_FAIL_CLOSED");

        let token = security::create_access_token("u1", UserRole::Admin, &settings, None)
            .expect("token");
        let db = sqlx::PgPool::connect_lazy(&settings.database().database_url())
            .expect("lazy pool");
        let redis = RedisHandle::new("redis://127.0.0.1:1/0".to_string());
        let app = Router::new()
            .route("/me", get(|CurrentUser(user): CurrentUser| async move { user.id }))
            .with_state(AppState::new(settings, db, redis));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/me")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
