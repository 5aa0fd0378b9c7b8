//! Event records and their write-side inputs.
//!
//! Events are owned by a vendor and are soft-deleted: `deleted_at` is set and
//! the row stays in place, excluded from every listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, status::check_range};

/// A persisted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  pub event_id:      Uuid,
  pub vendor_id:     Uuid,
  pub category_id:   Uuid,
  pub name:          String,
  pub description:   String,
  pub location:      String,
  /// URL of the cover image.
  pub image:         String,
  pub event_start:   DateTime<Utc>,
  pub event_end:     DateTime<Utc>,
  /// Carousel placement flag; has no bearing on status.
  pub featured:      bool,
  /// Legacy denormalised status carried by some rows. Never authoritative.
  pub stored_status: Option<String>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
  pub deleted_at:    Option<DateTime<Utc>>,
}

impl Event {
  pub fn is_deleted(&self) -> bool { self.deleted_at.is_some() }

  /// Whether the event overlaps the closed window `[from, to]`.
  pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
    self.event_start <= to && self.event_end >= from
  }
}

// ─── NewEvent ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::EventStore::create_event`]. Identifiers and
/// timestamps other than the schedule are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
  pub vendor_id:     Uuid,
  pub category_id:   Uuid,
  pub name:          String,
  pub description:   String,
  pub location:      String,
  pub image:         String,
  pub event_start:   DateTime<Utc>,
  pub event_end:     DateTime<Utc>,
  #[serde(default)]
  pub featured:      bool,
  #[serde(default)]
  pub stored_status: Option<String>,
}

impl NewEvent {
  /// Check required fields and the schedule.
  pub fn validate(&self) -> Result<()> {
    require("name", &self.name)?;
    require("location", &self.location)?;
    require("description", &self.description)?;
    check_range(self.event_start, self.event_end)
  }
}

fn require(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::invalid(format!("{field} is required")));
  }
  Ok(())
}

// ─── EventPatch ──────────────────────────────────────────────────────────────

/// A partial edit. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPatch {
  pub category_id: Option<Uuid>,
  pub name:        Option<String>,
  pub description: Option<String>,
  pub location:    Option<String>,
  pub image:       Option<String>,
  pub event_start: Option<DateTime<Utc>>,
  pub event_end:   Option<DateTime<Utc>>,
  pub featured:    Option<bool>,
}

impl EventPatch {
  /// Produce the edited event. The merged schedule is re-validated so a patch
  /// touching only one end cannot invert the range.
  pub fn apply(self, mut event: Event, now: DateTime<Utc>) -> Result<Event> {
    if let Some(name) = self.name {
      require("name", &name)?;
      event.name = name;
    }
    if let Some(location) = self.location {
      require("location", &location)?;
      event.location = location;
    }
    if let Some(description) = self.description {
      require("description", &description)?;
      event.description = description;
    }
    if let Some(category_id) = self.category_id {
      event.category_id = category_id;
    }
    if let Some(image) = self.image {
      event.image = image;
    }
    if let Some(start) = self.event_start {
      event.event_start = start;
    }
    if let Some(end) = self.event_end {
      event.event_end = end;
    }
    if let Some(featured) = self.featured {
      event.featured = featured;
    }
    check_range(event.event_start, event.event_end)?;
    event.updated_at = now;
    Ok(event)
  }
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::EventStore::list_events`]. Deleted events
/// are always excluded.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
  pub vendor_id:   Option<Uuid>,
  pub category_id: Option<Uuid>,
  pub featured:    Option<bool>,
  /// Only events overlapping `[from, to]`.
  pub window:      Option<(DateTime<Utc>, DateTime<Utc>)>,
}
