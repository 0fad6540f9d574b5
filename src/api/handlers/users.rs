use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::api::errors::ApiError;
use crate::api::middleware::auth::JwtAuth;
use crate::api::pagination::{PageParams, USER_SORT_COLUMNS};
use crate::api::AppState;
use crate::domain::permission::Action;
use crate::services::{UpdateUserRequest, UserResponse};

/// List users, paginated and sortable
///
/// GET /api/users
pub async fn list_users(
    JwtAuth(caller_id): JwtAuth,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    state
        .permissions
        .require(caller_id, "users", Action::Select)
        .await?;

    let users = state
        .users
        .list_users(
            params.limit(),
            params.offset(),
            params.sort_by(USER_SORT_COLUMNS, "id"),
            params.descending(),
        )
        .await?;
    Ok(Json(users))
}

/// Fetch a single user
///
/// GET /api/users/:id
pub async fn get_user(
    JwtAuth(caller_id): JwtAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    state
        .permissions
        .require(caller_id, "users", Action::Select)
        .await?;

    let user = state.users.get_user(id).await?;
    Ok(Json(user))
}

/// Update a user's name and/or email
///
/// PUT /api/users/:id
pub async fn update_user(
    JwtAuth(caller_id): JwtAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    state
        .permissions
        .require(caller_id, "users", Action::Update)
        .await?;

    let user = state.users.update_user(id, req).await?;
    Ok(Json(user))
}

/// Delete a user
///
/// DELETE /api/users/:id
pub async fn delete_user(
    JwtAuth(caller_id): JwtAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .permissions
        .require(caller_id, "users", Action::Delete)
        .await?;

    state.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
