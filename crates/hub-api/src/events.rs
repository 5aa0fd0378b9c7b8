//! Handlers for `/events` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/events` | Optional `status`, `category_id`, `vendor_id`, `featured`, `as_of` |
//! | `GET`    | `/events/board` | Featured carousel plus one section per status |
//! | `GET`    | `/events/calendar` | `from`, `to`; the caller's vendor only |
//! | `GET`    | `/events/{id}` | Single listed event; deleted events are 404 |
//! | `POST`   | `/events` | Body: [`NewEventBody`]; returns 201 + listed event |
//! | `PATCH`  | `/events/{id}` | Body: [`EventPatch`]; owning vendor only |
//! | `DELETE` | `/events/{id}` | Soft delete; owning vendor only; returns 204 |
//!
//! Status is always derived at `as_of` (default: now) and never read from
//! the stored row.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use hub_core::{
  directory::{Actor, Permission},
  event::{Event, EventPatch, EventQuery, NewEvent},
  listing::{EventBoard, ListedEvent, filter_by_status, resolve_all},
  status::EventStatus,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, HubStore, actor::CurrentActor, error::ApiError};

fn now_or<S>(state: &ApiState<S>, as_of: Option<DateTime<Utc>>) -> DateTime<Utc> {
  as_of.unwrap_or_else(|| state.clock.now())
}

fn warn_on_drift(listed: &[ListedEvent]) {
  for l in listed {
    if let Some(drift) = &l.drift {
      tracing::warn!(
        event_id = %l.event.event_id,
        stored = %drift.stored,
        derived = %drift.derived,
        "stored event status disagrees with schedule"
      );
    }
  }
}

/// A live event owned by the actor's vendor, or the matching error.
async fn owned_event<S: HubStore>(
  state: &ApiState<S>,
  actor: &Actor,
  id: Uuid,
) -> Result<Event, ApiError> {
  let event = state
    .store
    .get_event(id)
    .await
    .map_err(ApiError::from_store)?
    .filter(|e| !e.is_deleted())
    .ok_or_else(|| ApiError::NotFound(format!("event {id} not found")))?;
  if event.vendor_id != actor.vendor()? {
    return Err(ApiError::Forbidden(format!(
      "event {id} belongs to another vendor"
    )));
  }
  Ok(event)
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status:      Option<EventStatus>,
  pub category_id: Option<Uuid>,
  pub vendor_id:   Option<Uuid>,
  pub featured:    Option<bool>,
  /// Instant at which statuses are derived. Defaults to now.
  pub as_of:       Option<DateTime<Utc>>,
}

/// `GET /events`
pub async fn list<S: HubStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ListedEvent>>, ApiError> {
  actor.require(Permission::ViewEvent)?;
  let now = now_or(&state, params.as_of);

  let query = EventQuery {
    vendor_id: params.vendor_id,
    category_id: params.category_id,
    featured: params.featured,
    window: None,
  };
  let events = state
    .store
    .list_events(&query)
    .await
    .map_err(ApiError::from_store)?;

  let listed = filter_by_status(resolve_all(events, now)?, params.status);
  warn_on_drift(&listed);
  Ok(Json(listed))
}

// ─── Board ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AsOfParams {
  pub as_of: Option<DateTime<Utc>>,
}

/// `GET /events/board`
pub async fn board<S: HubStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
  Query(params): Query<AsOfParams>,
) -> Result<Json<EventBoard>, ApiError> {
  actor.require(Permission::ViewEvent)?;
  let now = now_or(&state, params.as_of);

  let events = state
    .store
    .list_events(&EventQuery::default())
    .await
    .map_err(ApiError::from_store)?;

  let board = EventBoard::assemble(events, now)?;
  warn_on_drift(&board.ongoing);
  warn_on_drift(&board.upcoming);
  warn_on_drift(&board.finished);
  Ok(Json(board))
}

// ─── Calendar ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CalendarParams {
  pub from:  DateTime<Utc>,
  pub to:    DateTime<Utc>,
  pub as_of: Option<DateTime<Utc>>,
}

/// `GET /events/calendar?from=...&to=...`: the caller's vendor's events
/// overlapping the window.
pub async fn calendar<S: HubStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
  Query(params): Query<CalendarParams>,
) -> Result<Json<Vec<ListedEvent>>, ApiError> {
  actor.require(Permission::ViewEvent)?;
  let vendor_id = actor.vendor()?;
  if params.to < params.from {
    return Err(ApiError::BadRequest("`to` is before `from`".into()));
  }
  let now = now_or(&state, params.as_of);

  let query = EventQuery {
    vendor_id: Some(vendor_id),
    window: Some((params.from, params.to)),
    ..Default::default()
  };
  let events = state
    .store
    .list_events(&query)
    .await
    .map_err(ApiError::from_store)?;

  let listed = resolve_all(events, now)?;
  warn_on_drift(&listed);
  Ok(Json(listed))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /events/{id}`
pub async fn get_one<S: HubStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
  Query(params): Query<AsOfParams>,
) -> Result<Json<ListedEvent>, ApiError> {
  actor.require(Permission::ViewEvent)?;
  let event = state
    .store
    .get_event(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("event {id} not found")))?;

  let listed = ListedEvent::resolve(event, now_or(&state, params.as_of))?
    .ok_or_else(|| ApiError::NotFound(format!("event {id} not found")))?;
  warn_on_drift(std::slice::from_ref(&listed));
  Ok(Json(listed))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /events`. The vendor is the caller's own.
#[derive(Debug, Deserialize)]
pub struct NewEventBody {
  pub category_id: Uuid,
  pub name:        String,
  pub description: String,
  pub location:    String,
  #[serde(default)]
  pub image:       String,
  pub event_start: DateTime<Utc>,
  pub event_end:   DateTime<Utc>,
  #[serde(default)]
  pub featured:    bool,
}

/// `POST /events`: returns 201 + the new event with its derived status.
pub async fn create<S: HubStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<NewEventBody>,
) -> Result<impl IntoResponse, ApiError> {
  actor.require(Permission::AddEvent)?;
  let vendor_id = actor.vendor()?;

  let input = NewEvent {
    vendor_id,
    category_id: body.category_id,
    name: body.name,
    description: body.description,
    location: body.location,
    image: body.image,
    event_start: body.event_start,
    event_end: body.event_end,
    featured: body.featured,
    stored_status: None,
  };
  let event = state
    .store
    .create_event(input, actor.attribution()?)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(event_id = %event.event_id, by = actor.display(), "event created");

  let id = event.event_id;
  let listed = ListedEvent::resolve(event, state.clock.now())?
    .ok_or_else(|| ApiError::NotFound(format!("event {id} not found")))?;
  Ok((StatusCode::CREATED, Json(listed)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /events/{id}`
pub async fn update<S: HubStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
  Json(patch): Json<EventPatch>,
) -> Result<Json<ListedEvent>, ApiError> {
  actor.require(Permission::EditEvent)?;
  owned_event(&state, &actor, id).await?;

  let event = state
    .store
    .update_event(id, patch, actor.attribution()?)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(event_id = %id, by = actor.display(), "event updated");

  let listed = ListedEvent::resolve(event, state.clock.now())?
    .ok_or_else(|| ApiError::NotFound(format!("event {id} not found")))?;
  Ok(Json(listed))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /events/{id}`: soft delete; the row is kept but never listed.
pub async fn delete<S: HubStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  actor.require(Permission::DeleteEvent)?;
  owned_event(&state, &actor, id).await?;

  let event = state
    .store
    .soft_delete_event(id, actor.attribution()?)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(event_id = %id, by = actor.display(), "event deleted");
  Ok(StatusCode::NO_CONTENT)
}
