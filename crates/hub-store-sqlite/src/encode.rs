//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings with microsecond
//! precision and a `Z` suffix, so lexical order equals chronological order
//! and range comparisons can run in SQL. UUIDs are stored as hyphenated
//! lowercase strings.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use hub_core::{
  audit::AuditEntry,
  directory::{Category, Permission, User, Vendor},
  event::Event,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// `dt` as it will read back after a round trip through a column.
pub fn stored_precision(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Permission ──────────────────────────────────────────────────────────────

pub fn decode_permission(s: &str) -> Result<Permission> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown permission: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const EVENT_COLUMNS: &str = "event_id, vendor_id, category_id, name, \
  description, location, image, event_start, event_end, featured, \
  stored_status, created_at, updated_at, deleted_at";

/// Raw values read directly from an `events` row.
pub struct RawEvent {
  pub event_id:      String,
  pub vendor_id:     String,
  pub category_id:   String,
  pub name:          String,
  pub description:   String,
  pub location:      String,
  pub image:         String,
  pub event_start:   String,
  pub event_end:     String,
  pub featured:      bool,
  pub stored_status: Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
  pub deleted_at:    Option<String>,
}

impl RawEvent {
  /// Map a row selected with [`EVENT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:      row.get(0)?,
      vendor_id:     row.get(1)?,
      category_id:   row.get(2)?,
      name:          row.get(3)?,
      description:   row.get(4)?,
      location:      row.get(5)?,
      image:         row.get(6)?,
      event_start:   row.get(7)?,
      event_end:     row.get(8)?,
      featured:      row.get(9)?,
      stored_status: row.get(10)?,
      created_at:    row.get(11)?,
      updated_at:    row.get(12)?,
      deleted_at:    row.get(13)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:      decode_uuid(&self.event_id)?,
      vendor_id:     decode_uuid(&self.vendor_id)?,
      category_id:   decode_uuid(&self.category_id)?,
      name:          self.name,
      description:   self.description,
      location:      self.location,
      image:         self.image,
      event_start:   decode_dt(&self.event_start)?,
      event_end:     decode_dt(&self.event_end)?,
      featured:      self.featured,
      stored_status: self.stored_status,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
      deleted_at:    decode_opt_dt(self.deleted_at)?,
    })
  }
}

/// Raw values read directly from an `audit_log` row.
pub struct RawAuditEntry {
  pub audit_id:   String,
  pub created_at: String,
  pub action:     String,
  pub person:     String,
}

impl RawAuditEntry {
  pub fn into_entry(self) -> Result<AuditEntry> {
    Ok(AuditEntry {
      audit_id:   decode_uuid(&self.audit_id)?,
      created_at: decode_dt(&self.created_at)?,
      action:     self.action,
      person:     self.person,
    })
  }
}

pub const USER_COLUMNS: &str =
  "user_id, email, role_id, vendor_id, created_at, deleted_at";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub email:      String,
  pub role_id:    String,
  pub vendor_id:  Option<String>,
  pub created_at: String,
  pub deleted_at: Option<String>,
}

impl RawUser {
  /// Map a row selected with [`USER_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      email:      row.get(1)?,
      role_id:    row.get(2)?,
      vendor_id:  row.get(3)?,
      created_at: row.get(4)?,
      deleted_at: row.get(5)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      email:      self.email,
      role_id:    decode_uuid(&self.role_id)?,
      vendor_id:  self.vendor_id.as_deref().map(decode_uuid).transpose()?,
      created_at: decode_dt(&self.created_at)?,
      deleted_at: decode_opt_dt(self.deleted_at)?,
    })
  }
}

pub const VENDOR_COLUMNS: &str =
  "vendor_id, name, description, address, phone_number, created_at";

/// Raw values read directly from a `vendors` row.
pub struct RawVendor {
  pub vendor_id:    String,
  pub name:         String,
  pub description:  Option<String>,
  pub address:      Option<String>,
  pub phone_number: Option<String>,
  pub created_at:   String,
}

impl RawVendor {
  /// Map a row selected with [`VENDOR_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      vendor_id:    row.get(0)?,
      name:         row.get(1)?,
      description:  row.get(2)?,
      address:      row.get(3)?,
      phone_number: row.get(4)?,
      created_at:   row.get(5)?,
    })
  }

  pub fn into_vendor(self) -> Result<Vendor> {
    Ok(Vendor {
      vendor_id:    decode_uuid(&self.vendor_id)?,
      name:         self.name,
      description:  self.description,
      address:      self.address,
      phone_number: self.phone_number,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

pub fn decode_category(id: &str, name: String) -> Result<Category> {
  Ok(Category { category_id: decode_uuid(id)?, name })
}
