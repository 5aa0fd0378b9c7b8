//! Persistence traits.
//!
//! Implemented by storage backends (e.g. `hub-store-sqlite`). Higher layers
//! (`hub-api`, `hub-server`) depend on these abstractions, not on any concrete
//! backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use uuid::Uuid;

use crate::{
  Error,
  audit::{AuditEntry, AuditPage, Attribution, NewAuditEntry, PageRequest},
  directory::{
    Category, NewUser, NewVendor, Role, User, UserPatch, UserWithRole, Vendor,
  },
  event::{Event, EventPatch, EventQuery, NewEvent},
};

/// Backend error types. They wrap this crate's [`Error`] so validation and
/// not-found failures survive the trip through a backend unchanged.
pub trait StoreError: std::error::Error + From<Error> + Send + Sync + 'static {
  /// The domain error inside, if this is one.
  fn as_core(&self) -> Option<&Error>;
}

/// Common supertrait fixing the backend's error type.
pub trait Store: Send + Sync {
  type Error: StoreError;
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// Every mutation takes an [`Attribution`] and appends its audit entry
/// atomically with the change: either both are persisted or neither is.
pub trait EventStore: Store {
  /// Validate and persist a new event.
  fn create_event(
    &self,
    input: NewEvent,
    by: Attribution,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Apply a partial edit to a live event. Deleted events are not found.
  fn update_event(
    &self,
    id: Uuid,
    patch: EventPatch,
    by: Attribution,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Set `deleted_at`. The row is never removed.
  fn soft_delete_event(
    &self,
    id: Uuid,
    by: Attribution,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Fetch an event by id, including soft-deleted ones.
  fn get_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  /// List live events matching `query`.
  fn list_events<'a>(
    &'a self,
    query: &'a EventQuery,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + 'a;
}

// ─── Audit trail ─────────────────────────────────────────────────────────────

/// Append-only audit persistence. There is no update or delete.
pub trait AuditStore: Store {
  /// Append one entry; `created_at` is assigned here and never decreases
  /// across calls.
  fn append_audit(
    &self,
    entry: NewAuditEntry,
  ) -> impl Future<Output = Result<AuditEntry, Self::Error>> + Send + '_;

  /// One page of entries, newest first, plus the total count.
  fn audit_page(
    &self,
    request: PageRequest,
  ) -> impl Future<Output = Result<AuditPage, Self::Error>> + Send + '_;
}

// ─── Directory ───────────────────────────────────────────────────────────────

/// Role and category creation is administrative setup and is not audited.
/// User and vendor mutations follow the same attribution rule as
/// [`EventStore`].
pub trait DirectoryStore: Store {
  fn create_role(
    &self,
    role: Role,
  ) -> impl Future<Output = Result<Role, Self::Error>> + Send + '_;

  fn list_roles(&self) -> impl Future<Output = Result<Vec<Role>, Self::Error>> + Send + '_;

  fn get_role(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Role>, Self::Error>> + Send + '_;

  fn create_user(
    &self,
    input: NewUser,
    by: Attribution,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Fetch a user by id, including soft-deleted ones.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Live users with their roles.
  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<UserWithRole>, Self::Error>> + Send + '_;

  fn update_user(
    &self,
    id: Uuid,
    patch: UserPatch,
    by: Attribution,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn soft_delete_user(
    &self,
    id: Uuid,
    by: Attribution,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn create_vendor(
    &self,
    input: NewVendor,
    by: Attribution,
  ) -> impl Future<Output = Result<Vendor, Self::Error>> + Send + '_;

  fn get_vendor(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Vendor>, Self::Error>> + Send + '_;

  fn list_vendors(
    &self,
  ) -> impl Future<Output = Result<Vec<Vendor>, Self::Error>> + Send + '_;

  fn create_category(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  fn list_categories(
    &self,
  ) -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send + '_;
}
