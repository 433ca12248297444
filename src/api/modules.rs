use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use time::PrimitiveDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::{CurrentStaff, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Module;
use crate::repositories;
use crate::schemas::module::{ModuleCreate, ModuleQuery, ModuleResponse, ModuleUpdate};
use crate::services::exam_access;

const DUPLICATE_KIND: &str = "A module of this kind already exists for the class offering";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_modules).post(create_module))
        .route("/:module_id", get(get_module).patch(update_module).delete(delete_module))
}

async fn list_modules(
    Query(params): Query<ModuleQuery>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ModuleResponse>>, ApiError> {
    let modules = repositories::modules::list(state.db(), params.class_offering_id.as_deref())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list modules"))?;
    Ok(Json(modules.into_iter().map(ModuleResponse::from).collect()))
}

async fn get_module(
    Path(module_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ModuleResponse>, ApiError> {
    let module = fetch_module(&state, &module_id).await?;
    Ok(Json(ModuleResponse::from(module)))
}

async fn create_module(
    CurrentStaff(staff): CurrentStaff,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ModuleCreate>,
) -> Result<(StatusCode, Json<ModuleResponse>), ApiError> {
    payload.validate()?;
    check_window(payload.start_time, payload.end_time)?;

    let offering = repositories::class_offerings::find_by_id(state.db(), &payload.class_offering_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class offering"))?;
    if offering.is_none() {
        return Err(ApiError::NotFound("Class offering not found".to_string()));
    }

    let module = repositories::modules::create(
        state.db(),
        repositories::modules::CreateModule {
            id: &Uuid::new_v4().to_string(),
            class_offering_id: &payload.class_offering_id,
            name: payload.name.trim(),
            kind: payload.kind.trim(),
            description: payload.description.as_deref(),
            start_time: payload.start_time,
            end_time: payload.end_time,
            created_by: &staff.id,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, DUPLICATE_KIND, "Failed to create module"))?;

    tracing::info!(
        action = "module_create",
        user_id = %staff.id,
        module_id = %module.id,
        class_offering_id = %module.class_offering_id,
        "Module created"
    );

    Ok((StatusCode::CREATED, Json(ModuleResponse::from(module))))
}

async fn update_module(
    Path(module_id): Path<String>,
    CurrentStaff(staff): CurrentStaff,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ModuleUpdate>,
) -> Result<Json<ModuleResponse>, ApiError> {
    payload.validate()?;

    let current = fetch_module(&state, &module_id).await?;
    check_window(
        payload.start_time.or(current.start_time),
        payload.end_time.or(current.end_time),
    )?;

    let module = repositories::modules::update(
        state.db(),
        &module_id,
        repositories::modules::UpdateModule {
            name: payload.name.map(|name| name.trim().to_string()),
            kind: payload.kind.map(|kind| kind.trim().to_string()),
            description: payload.description,
            start_time: payload.start_time,
            end_time: payload.end_time,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, DUPLICATE_KIND, "Failed to update module"))?
    .ok_or_else(|| ApiError::NotFound("Module not found".to_string()))?;

    tracing::info!(action = "module_update", user_id = %staff.id, module_id = %module_id, "Module updated");

    Ok(Json(ModuleResponse::from(module)))
}

async fn delete_module(
    Path(module_id): Path<String>,
    CurrentStaff(staff): CurrentStaff,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::modules::soft_delete(state.db(), &module_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete module"))?;
    if !deleted {
        return Err(ApiError::NotFound("Module not found".to_string()));
    }

    tracing::info!(action = "module_delete", user_id = %staff.id, module_id = %module_id, "Module deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn check_window(
    start: Option<PrimitiveDateTime>,
    end: Option<PrimitiveDateTime>,
) -> Result<(), ApiError> {
    if let (Some(start), Some(end)) = (start, end) {
        exam_access::validate_window(start, end)
            .map_err(|message| ApiError::invalid_field("end_time", message))?;
    }
    Ok(())
}

async fn fetch_module(state: &AppState, module_id: &str) -> Result<Module, ApiError> {
    repositories::modules::find_by_id(state.db(), module_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load module"))?
        .ok_or_else(|| ApiError::NotFound("Module not found".to_string()))
}
