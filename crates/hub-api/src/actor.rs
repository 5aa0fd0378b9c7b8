//! `X-Actor-Id` extractor.
//!
//! The header names the user on whose behalf the request runs. It is trusted
//! as given; an upstream session layer is expected to set it.

use axum::{extract::FromRequestParts, http::request::Parts};
use hub_core::directory::Actor;
use uuid::Uuid;

use crate::{ApiState, HubStore, error::ApiError};

pub const ACTOR_HEADER: &str = "x-actor-id";

/// The live user (and role) making the request.
pub struct CurrentActor(pub Actor);

impl<S: HubStore> FromRequestParts<ApiState<S>> for CurrentActor {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let id = parts
      .headers
      .get(ACTOR_HEADER)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| Uuid::parse_str(v.trim()).ok())
      .ok_or_else(|| ApiError::Unauthorized("missing or malformed X-Actor-Id".into()))?;

    let user = state
      .store
      .get_user(id)
      .await
      .map_err(ApiError::from_store)?
      .filter(|u| u.deleted_at.is_none())
      .ok_or_else(|| ApiError::Unauthorized(format!("unknown user {id}")))?;

    let role = state
      .store
      .get_role(user.role_id)
      .await
      .map_err(ApiError::from_store)?
      .ok_or_else(|| ApiError::Unauthorized(format!("user {id} has no role")))?;

    Ok(CurrentActor(Actor { user, role }))
  }
}
