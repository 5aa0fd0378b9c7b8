//! The audit trail: one immutable entry per mutating action.
//!
//! Entries are append-only. The store assigns `created_at`, never updates or
//! deletes a row, and always reads entries newest first.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, store::AuditStore};

/// One recorded action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
  pub audit_id:   Uuid,
  /// Store-assigned; never changes after creation.
  pub created_at: DateTime<Utc>,
  pub action:     String,
  /// Display string of the actor, trusted as supplied.
  pub person:     String,
}

// ─── Write input ─────────────────────────────────────────────────────────────

/// A validated, not-yet-persisted entry. Both fields are non-blank.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
  action: String,
  person: String,
}

impl NewAuditEntry {
  pub fn new(action: impl Into<String>, person: impl Into<String>) -> Result<Self> {
    let action = action.into();
    let person = person.into();
    if action.trim().is_empty() {
      return Err(Error::invalid("audit action must not be empty"));
    }
    if person.trim().is_empty() {
      return Err(Error::invalid("audit person must not be empty"));
    }
    Ok(Self { action, person })
  }

  pub fn action(&self) -> &str { &self.action }

  pub fn person(&self) -> &str { &self.person }

  pub fn into_parts(self) -> (String, String) { (self.action, self.person) }
}

// ─── Mutation attribution ────────────────────────────────────────────────────

/// A mutating action, as worded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
  CreatedEvent(&'a str),
  UpdatedEvent(&'a str),
  DeletedEvent(&'a str),
  CreatedUser(&'a str),
  UpdatedUser(&'a str),
  DeletedUser(&'a str),
  CreatedVendor(&'a str),
  SeededDemoData,
}

impl fmt::Display for Action<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Action::CreatedEvent(name) => write!(f, "Created event \"{name}\""),
      Action::UpdatedEvent(name) => write!(f, "Updated event \"{name}\""),
      Action::DeletedEvent(name) => write!(f, "Deleted event \"{name}\""),
      Action::CreatedUser(email) => write!(f, "Created user {email}"),
      Action::UpdatedUser(email) => write!(f, "Updated user {email}"),
      Action::DeletedUser(email) => write!(f, "Deleted user {email}"),
      Action::CreatedVendor(name) => write!(f, "Created vendor \"{name}\""),
      Action::SeededDemoData => f.write_str("Seeded demo data"),
    }
  }
}

/// The person a store mutation is recorded against. Stores append the audit
/// entry in the same transaction as the change it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution(String);

impl Attribution {
  pub fn new(person: impl Into<String>) -> Result<Self> {
    let person = person.into();
    if person.trim().is_empty() {
      return Err(Error::invalid("audit person must not be empty"));
    }
    Ok(Self(person))
  }

  pub fn person(&self) -> &str { &self.0 }

  /// The entry recording `action` by this person.
  pub fn entry(&self, action: Action<'_>) -> NewAuditEntry {
    NewAuditEntry { action: action.to_string(), person: self.0.clone() }
  }
}

// ─── Read input / output ─────────────────────────────────────────────────────

/// A validated page request: `page >= 1`, `page_size >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  page:      u32,
  page_size: u32,
}

impl PageRequest {
  pub fn new(page: i64, page_size: i64) -> Result<Self> {
    if page < 1 {
      return Err(Error::invalid(format!("page must be at least 1, got {page}")));
    }
    if page_size < 1 {
      return Err(Error::invalid(format!(
        "page size must be positive, got {page_size}"
      )));
    }
    let page = u32::try_from(page)
      .map_err(|_| Error::invalid(format!("page out of range: {page}")))?;
    let page_size = u32::try_from(page_size)
      .map_err(|_| Error::invalid(format!("page size out of range: {page_size}")))?;
    Ok(Self { page, page_size })
  }

  pub fn page(&self) -> u32 { self.page }

  pub fn page_size(&self) -> u32 { self.page_size }

  /// Offset of the first entry on this page in the descending ordering.
  pub fn offset(&self) -> u64 {
    u64::from(self.page - 1) * u64::from(self.page_size)
  }
}

/// One page of entries plus the unfiltered total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditPage {
  pub entries:     Vec<AuditEntry>,
  pub total_count: u64,
}

impl AuditPage {
  /// `ceil(total_count / page_size)`.
  pub fn total_pages(&self, page_size: u32) -> u64 {
    self.total_count.div_ceil(u64::from(page_size.max(1)))
  }
}

// ─── Day grouping ────────────────────────────────────────────────────────────

/// Entries that share a calendar day in the reference offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayGroup {
  /// Serialised as `yyyy-MM-dd`.
  pub day:     NaiveDate,
  pub entries: Vec<AuditEntry>,
}

/// Group one page of entries by day, preserving order. Consecutive entries
/// with the same day share a group; nothing is merged across pages.
pub fn group_by_day(entries: &[AuditEntry], offset: FixedOffset) -> Vec<DayGroup> {
  let mut groups: Vec<DayGroup> = Vec::new();
  for entry in entries {
    let day = entry.created_at.with_timezone(&offset).date_naive();
    match groups.last_mut() {
      Some(group) if group.day == day => group.entries.push(entry.clone()),
      _ => groups.push(DayGroup { day, entries: vec![entry.clone()] }),
    }
  }
  groups
}

// ─── Recorder ────────────────────────────────────────────────────────────────

/// Validate and append one entry.
pub async fn record<S>(
  store: &S,
  action: impl Into<String>,
  person: impl Into<String>,
) -> Result<AuditEntry, S::Error>
where
  S: AuditStore,
{
  let entry = NewAuditEntry::new(action, person)?;
  store.append_audit(entry).await
}

/// Validate the page arguments and read one page, newest first.
pub async fn list_page<S>(
  store: &S,
  page: i64,
  page_size: i64,
) -> Result<AuditPage, S::Error>
where
  S: AuditStore,
{
  let request = PageRequest::new(page, page_size)?;
  store.audit_page(request).await
}
