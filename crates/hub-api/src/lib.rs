//! JSON REST API for the Event Hub.
//!
//! Exposes an axum [`Router`] backed by any store implementing the
//! `hub-core` store traits. Every route requires an `X-Actor-Id` header
//! naming a live user; session handling and TLS are the caller's concern.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", hub_api::api_router(state))
//! ```

pub mod actor;
pub mod audit;
pub mod error;
pub mod events;
pub mod users;
pub mod vendors;


use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch},
};
use chrono::{FixedOffset, Offset as _, Utc};
use hub_core::{
  clock::{Clock, SystemClock},
  store::{AuditStore, DirectoryStore, EventStore},
};

pub use actor::CurrentActor;
pub use error::ApiError;

/// Everything the API needs from a backend.
pub trait HubStore:
  EventStore + AuditStore + DirectoryStore + Send + Sync + 'static
{
}

impl<S> HubStore for S where
  S: EventStore + AuditStore + DirectoryStore + Send + Sync + 'static
{
}

/// Presentation settings for the audit log.
#[derive(Debug, Clone, Copy)]
pub struct ApiSettings {
  /// Reference offset used to group audit entries into calendar days.
  pub audit_offset:    FixedOffset,
  /// Page size used when a request does not name one.
  pub audit_page_size: u32,
}

impl Default for ApiSettings {
  fn default() -> Self {
    Self {
      audit_offset:    Utc.fix(),
      audit_page_size: 20,
    }
  }
}

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub settings: Arc<ApiSettings>,
  /// Source of "now" for status derivation when a request gives no `as_of`.
  pub clock:    Arc<dyn Clock>,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>, settings: ApiSettings) -> Self {
    Self {
      store,
      settings: Arc::new(settings),
      clock: Arc::new(SystemClock),
    }
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      settings: self.settings.clone(),
      clock:    self.clock.clone(),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: HubStore>(state: ApiState<S>) -> Router<()> {
  Router::new()
    // Events
    .route("/events", get(events::list::<S>).post(events::create::<S>))
    .route("/events/board", get(events::board::<S>))
    .route("/events/calendar", get(events::calendar::<S>))
    .route(
      "/events/{id}",
      get(events::get_one::<S>)
        .patch(events::update::<S>)
        .delete(events::delete::<S>),
    )
    // Audit
    .route("/audit", get(audit::list::<S>))
    // Directory
    .route("/users", get(users::list::<S>).post(users::create::<S>))
    .route(
      "/users/{id}",
      patch(users::update::<S>).delete(users::delete::<S>),
    )
    .route("/roles", get(users::roles::<S>))
    .route("/vendors", get(vendors::list::<S>).post(vendors::create::<S>))
    .route("/categories", get(vendors::categories::<S>))
    .with_state(state)
}
