//! Read models for event listings.
//!
//! Every listed event carries a status derived through [`crate::status`];
//! stored status strings are only compared, never displayed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  event::Event,
  status::{Classification, EventStatus, StatusDrift, detect_drift, resolve},
};

/// An event together with its derived status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListedEvent {
  #[serde(flatten)]
  pub event:  Event,
  pub status: EventStatus,
  /// Present when the row's stored status disagrees with `status`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub drift:  Option<StatusDrift>,
}

impl ListedEvent {
  /// Resolve one event. Returns `Ok(None)` for soft-deleted events.
  pub fn resolve(event: Event, now: DateTime<Utc>) -> Result<Option<Self>> {
    let classification =
      resolve(event.event_start, event.event_end, event.deleted_at, now)?;
    let status = match classification {
      Classification::Excluded => return Ok(None),
      Classification::Listed(status) => status,
    };
    let drift = detect_drift(event.stored_status.as_deref(), status);
    Ok(Some(Self { event, status, drift }))
  }
}

/// Resolve a batch of events, dropping deleted ones. A corrupt range fails
/// the whole batch.
pub fn resolve_all(
  events: impl IntoIterator<Item = Event>,
  now: DateTime<Utc>,
) -> Result<Vec<ListedEvent>> {
  let mut listed = Vec::new();
  for event in events {
    if let Some(l) = ListedEvent::resolve(event, now)? {
      listed.push(l);
    }
  }
  Ok(listed)
}

pub fn filter_by_status(
  listed: Vec<ListedEvent>,
  status: Option<EventStatus>,
) -> Vec<ListedEvent> {
  match status {
    Some(s) => listed.into_iter().filter(|l| l.status == s).collect(),
    None => listed,
  }
}

// ─── Board ───────────────────────────────────────────────────────────────────

/// The browse page: a featured carousel plus one section per status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventBoard {
  pub as_of:    DateTime<Utc>,
  /// Featured events of any status, soonest start first.
  pub featured: Vec<ListedEvent>,
  /// Ending soonest first.
  pub ongoing:  Vec<ListedEvent>,
  /// Starting soonest first.
  pub upcoming: Vec<ListedEvent>,
  /// Most recently ended first.
  pub finished: Vec<ListedEvent>,
}

impl EventBoard {
  pub fn assemble(
    events: impl IntoIterator<Item = Event>,
    now: DateTime<Utc>,
  ) -> Result<Self> {
    let mut board = EventBoard { as_of: now, ..Default::default() };
    for listed in resolve_all(events, now)? {
      if listed.event.featured {
        board.featured.push(listed.clone());
      }
      match listed.status {
        EventStatus::Ongoing => board.ongoing.push(listed),
        EventStatus::Upcoming => board.upcoming.push(listed),
        EventStatus::Finished => board.finished.push(listed),
      }
    }
    board.featured.sort_by_key(|l| l.event.event_start);
    board.ongoing.sort_by_key(|l| l.event.event_end);
    board.upcoming.sort_by_key(|l| l.event.event_start);
    board
      .finished
      .sort_by(|a, b| b.event.event_end.cmp(&a.event.event_end));
    Ok(board)
  }
}
