//! Users, roles, vendors and categories.
//!
//! These are the collaborators the event and audit rules consume: who is
//! acting, what they may do, and which vendor they act for.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result, audit::Attribution};

// ─── Permissions ─────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Permission {
  AddEvent,
  EditEvent,
  DeleteEvent,
  ViewEvent,
  ManageUsers,
  ManageVendors,
}

impl Permission {
  /// The permissions granted to the default `user` role.
  pub fn vendor_defaults() -> BTreeSet<Permission> {
    [Self::AddEvent, Self::EditEvent, Self::DeleteEvent, Self::ViewEvent].into()
  }

  pub fn all() -> BTreeSet<Permission> {
    use strum::IntoEnumIterator as _;
    Self::iter().collect()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
  pub role_id:     Uuid,
  pub name:        String,
  pub permissions: BTreeSet<Permission>,
}

impl Role {
  pub fn can(&self, permission: Permission) -> bool {
    self.permissions.contains(&permission)
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub email:      String,
  pub role_id:    Uuid,
  /// The vendor this user publishes events for, if any.
  pub vendor_id:  Option<Uuid>,
  pub created_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
  pub email:     String,
  pub role_id:   Uuid,
  #[serde(default)]
  pub vendor_id: Option<Uuid>,
}

impl NewUser {
  pub fn validate(&self) -> Result<()> { check_email(&self.email) }
}

/// Editable user fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
  pub email:   Option<String>,
  pub role_id: Option<Uuid>,
}

impl UserPatch {
  pub fn validate(&self) -> Result<()> {
    self.email.as_deref().map(check_email).transpose()?;
    Ok(())
  }
}

fn check_email(email: &str) -> Result<()> {
  let email = email.trim();
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
    _ => Err(Error::invalid(format!("invalid email address: {email:?}"))),
  }
}

/// A user paired with their role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserWithRole {
  #[serde(flatten)]
  pub user: User,
  pub role: Role,
}

// ─── Actor ───────────────────────────────────────────────────────────────────

/// The authenticated caller of a mutating operation, as supplied by the
/// identity collaborator.
#[derive(Debug, Clone)]
pub struct Actor {
  pub user: User,
  pub role: Role,
}

impl Actor {
  /// The string recorded as `person` in the audit trail.
  pub fn display(&self) -> &str { &self.user.email }

  pub fn require(&self, permission: Permission) -> Result<()> {
    if self.role.can(permission) {
      Ok(())
    } else {
      Err(Error::PermissionDenied(permission))
    }
  }

  /// Attribution for mutations made by this actor.
  pub fn attribution(&self) -> Result<Attribution> { Attribution::new(self.display()) }

  /// The vendor the actor publishes for.
  pub fn vendor(&self) -> Result<Uuid> {
    self.user.vendor_id.ok_or(Error::NoVendor(self.user.user_id))
  }
}

// ─── Vendors and categories ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
  pub vendor_id:    Uuid,
  pub name:         String,
  pub description:  Option<String>,
  pub address:      Option<String>,
  pub phone_number: Option<String>,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVendor {
  pub name:         String,
  pub description:  Option<String>,
  pub address:      Option<String>,
  pub phone_number: Option<String>,
}

impl NewVendor {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::invalid("vendor name is required"));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub category_id: Uuid,
  pub name:        String,
}
