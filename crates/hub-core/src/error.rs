//! Error types for `hub-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::directory::Permission;

#[derive(Debug, Error)]
pub enum Error {
  /// An event ends before it starts. Rejected before any status is computed.
  #[error("invalid event range: end {end} is before start {start}")]
  InvalidRange {
    start: DateTime<Utc>,
    end:   DateTime<Utc>,
  },

  /// Malformed pagination, empty audit fields, or an empty required field.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("event not found: {0}")]
  EventNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("vendor not found: {0}")]
  VendorNotFound(Uuid),

  #[error("category not found: {0}")]
  CategoryNotFound(Uuid),

  #[error("role not found: {0}")]
  RoleNotFound(Uuid),

  #[error("missing permission: {0}")]
  PermissionDenied(Permission),

  #[error("user {0} is not affiliated with a vendor")]
  NoVendor(Uuid),

  #[error("email already registered: {0}")]
  EmailTaken(String),
}

impl Error {
  pub(crate) fn invalid(msg: impl Into<String>) -> Self {
    Self::InvalidArgument(msg.into())
  }

  /// Validation failures caused by bad caller input.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::InvalidRange { .. } | Self::InvalidArgument(_) | Self::EmailTaken(_)
    )
  }

  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::EventNotFound(_)
        | Self::UserNotFound(_)
        | Self::VendorNotFound(_)
        | Self::CategoryNotFound(_)
        | Self::RoleNotFound(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
