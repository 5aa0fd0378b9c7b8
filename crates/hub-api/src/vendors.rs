//! Handlers for `/vendors` and `/categories`.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use hub_core::directory::{Category, NewVendor, Permission, Vendor};

use crate::{ApiState, HubStore, actor::CurrentActor, error::ApiError};

/// `GET /vendors`
pub async fn list<S: HubStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(_actor): CurrentActor,
) -> Result<Json<Vec<Vendor>>, ApiError> {
  let vendors = state.store.list_vendors().await.map_err(ApiError::from_store)?;
  Ok(Json(vendors))
}

/// `POST /vendors`: requires `manage-vendors`; returns 201 + the vendor.
pub async fn create<S: HubStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<NewVendor>,
) -> Result<impl IntoResponse, ApiError> {
  actor.require(Permission::ManageVendors)?;
  let vendor = state
    .store
    .create_vendor(body, actor.attribution()?)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(vendor_id = %vendor.vendor_id, by = actor.display(), "vendor created");
  Ok((StatusCode::CREATED, Json(vendor)))
}

/// `GET /categories`
pub async fn categories<S: HubStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(_actor): CurrentActor,
) -> Result<Json<Vec<Category>>, ApiError> {
  let categories = state
    .store
    .list_categories()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(categories))
}
