//! Handlers for `/users` and `/roles`. All require `manage-users`.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use hub_core::directory::{NewUser, Permission, Role, UserPatch, UserWithRole};
use uuid::Uuid;

use crate::{ApiState, HubStore, actor::CurrentActor, error::ApiError};

/// `GET /users`: live users with their roles.
pub async fn list<S: HubStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<UserWithRole>>, ApiError> {
  actor.require(Permission::ManageUsers)?;
  let users = state.store.list_users().await.map_err(ApiError::from_store)?;
  Ok(Json(users))
}

/// `POST /users`: returns 201 + the new user.
pub async fn create<S: HubStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
  actor.require(Permission::ManageUsers)?;
  let user = state
    .store
    .create_user(body, actor.attribution()?)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(user_id = %user.user_id, by = actor.display(), "user created");
  Ok((StatusCode::CREATED, Json(user)))
}

/// `PATCH /users/{id}`
pub async fn update<S: HubStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
  Json(patch): Json<UserPatch>,
) -> Result<impl IntoResponse, ApiError> {
  actor.require(Permission::ManageUsers)?;
  let user = state
    .store
    .update_user(id, patch, actor.attribution()?)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(user_id = %id, by = actor.display(), "user updated");
  Ok(Json(user))
}

/// `DELETE /users/{id}`: soft delete; returns 204.
pub async fn delete<S: HubStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  actor.require(Permission::ManageUsers)?;
  let user = state
    .store
    .soft_delete_user(id, actor.attribution()?)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(user_id = %id, by = actor.display(), "user deleted");
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /roles`
pub async fn roles<S: HubStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<Role>>, ApiError> {
  actor.require(Permission::ManageUsers)?;
  let roles = state.store.list_roles().await.map_err(ApiError::from_store)?;
  Ok(Json(roles))
}
