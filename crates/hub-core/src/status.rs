//! Event status resolution.
//!
//! An event's displayed status is never stored authoritatively. It is derived
//! from the event's start/end timestamps and an explicit `now`, and every
//! surface that shows a status goes through [`resolve`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

/// The time-derived status of a live event.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventStatus {
  Upcoming,
  Ongoing,
  Finished,
}

/// Result of resolving an event against a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "visibility", content = "status", rename_all = "snake_case")]
pub enum Classification {
  /// The event is soft-deleted and must not appear in any listing.
  Excluded,
  Listed(EventStatus),
}

impl Classification {
  pub fn status(self) -> Option<EventStatus> {
    match self {
      Self::Excluded => None,
      Self::Listed(s) => Some(s),
    }
  }
}

/// Reject ranges whose end precedes their start.
pub fn check_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
  if end < start {
    return Err(Error::InvalidRange { start, end });
  }
  Ok(())
}

/// Derive the status of a live event at `now`. Both boundaries count as
/// [`EventStatus::Ongoing`].
pub fn derive_status(
  start: DateTime<Utc>,
  end: DateTime<Utc>,
  now: DateTime<Utc>,
) -> Result<EventStatus> {
  check_range(start, end)?;
  Ok(if now < start {
    EventStatus::Upcoming
  } else if now > end {
    EventStatus::Finished
  } else {
    EventStatus::Ongoing
  })
}

/// Classify an event. The range is validated before the deletion marker is
/// consulted, so a corrupt row fails even when it is deleted.
pub fn resolve(
  start: DateTime<Utc>,
  end: DateTime<Utc>,
  deleted_at: Option<DateTime<Utc>>,
  now: DateTime<Utc>,
) -> Result<Classification> {
  let status = derive_status(start, end, now)?;
  if deleted_at.is_some() {
    return Ok(Classification::Excluded);
  }
  Ok(Classification::Listed(status))
}

// ─── Stored status drift ─────────────────────────────────────────────────────

/// A persisted status string that disagrees with the derived one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDrift {
  pub stored:  String,
  pub derived: EventStatus,
}

/// Compare a legacy stored status against the derived one. Unparseable
/// stored values count as drift.
pub fn detect_drift(
  stored: Option<&str>,
  derived: EventStatus,
) -> Option<StatusDrift> {
  let stored = stored?;
  match stored.trim().to_ascii_lowercase().parse::<EventStatus>() {
    Ok(s) if s == derived => None,
    _ => Some(StatusDrift { stored: stored.to_owned(), derived }),
  }
}
