use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::{AuthSession, CurrentUser};
use crate::core::security;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::auth::{LoginRequest, TokenResponse};
use crate::schemas::user::UserResponse;
use crate::schemas::MessageResponse;

const BAD_CREDENTIALS: &str = "Incorrect username or password";

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/login", post(login)).route("/logout", post(logout)).route("/me", get(me))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.validate()?;

    let security_settings = state.settings().security();
    let rate_key = format!("rl:login:{}", payload.username);
    let allowed = state
        .redis()
        .rate_limit(
            &rate_key,
            security_settings.login_rate_limit,
            security_settings.login_rate_window_seconds,
        )
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let user = repositories::users::find_by_username(state.db(), &payload.username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized(BAD_CREDENTIALS))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized(BAD_CREDENTIALS))?;
    if !verified {
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS));
    }

    if !user.is_active {
        return Err(ApiError::BadRequest("Inactive user".to_string()));
    }

    let token = security::create_access_token(&user.id, user.role, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    tracing::info!(action = "login", user_id = %user.id, role = user.role.as_str(), "User logged in");

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: UserResponse::from_db(user),
    }))
}

async fn logout(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .redis()
        .revoke_token(&session.token_id, session.claims.remaining_seconds())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to revoke token"))?;

    tracing::info!(action = "logout", user_id = %session.user.id, "Token revoked");

    Ok(Json(MessageResponse::new("Logged out")))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}
