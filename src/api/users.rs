use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::CurrentAdmin;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::repositories;
use crate::schemas::user::{UserCreate, UserListQuery, UserResponse, UserUpdate};

const DUPLICATE_USERNAME: &str = "User with this username already exists";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:user_id", get(get_user).patch(update_user).delete(delete_user))
}

async fn list_users(
    Query(params): Query<UserListQuery>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = repositories::users::list(state.db(), params.role, params.skip, params.limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    Ok(Json(users.into_iter().map(UserResponse::from_db).collect()))
}

async fn get_user(
    Path(user_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = fetch_user(&state, &user_id).await?;
    Ok(Json(UserResponse::from_db(user)))
}

async fn create_user(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    payload.validate()?;

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;
    let now = primitive_now_utc();

    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username: &payload.username,
            full_name: &payload.full_name,
            email: payload.email.as_deref(),
            role: payload.role,
            student_number: payload.student_number.as_deref(),
            national_student_number: payload.national_student_number.as_deref(),
            hashed_password,
            is_active: payload.is_active,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, DUPLICATE_USERNAME, "Failed to create user"))?;

    tracing::info!(
        action = "user_create",
        admin_id = %admin.id,
        user_id = %user.id,
        role = user.role.as_str(),
        "User created"
    );

    Ok((StatusCode::CREATED, Json(UserResponse::from_db(user))))
}

async fn update_user(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    payload.validate()?;
    fetch_user(&state, &user_id).await?;

    let hashed_password = match payload.password.as_deref() {
        Some(password) => Some(
            security::hash_password(password)
                .map_err(|e| ApiError::internal(e, "Failed to hash password"))?,
        ),
        None => None,
    };

    repositories::users::update(
        state.db(),
        &user_id,
        repositories::users::UpdateUser {
            full_name: payload.full_name,
            email: payload.email,
            role: payload.role,
            student_number: payload.student_number,
            national_student_number: payload.national_student_number,
            is_active: payload.is_active,
            hashed_password,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update user"))?;

    tracing::info!(action = "user_update", admin_id = %admin.id, user_id = %user_id, "User updated");

    let user = fetch_user(&state, &user_id).await?;
    Ok(Json(UserResponse::from_db(user)))
}

async fn delete_user(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    if admin.id == user_id {
        return Err(ApiError::BadRequest("You cannot delete your own account".to_string()));
    }

    let deleted = repositories::users::soft_delete(state.db(), &user_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete user"))?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(action = "user_delete", admin_id = %admin.id, user_id = %user_id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_user(state: &AppState, user_id: &str) -> Result<User, ApiError> {
    repositories::users::find_by_id(state.db(), user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

#[cfg(test)]
mod tests;
