//! [`SqliteStore`], the SQLite implementation of the `hub-core` store traits.
//!
//! Events live here; the audit trail and directory impls are in sibling
//! modules.

use std::{path::Path, sync::Arc};

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use hub_core::{
  audit::{Action, Attribution},
  clock::{Clock, SystemClock},
  event::{Event, EventPatch, EventQuery, NewEvent},
  store::{EventStore, Store},
};

use crate::{
  Error, Result,
  encode::{EVENT_COLUMNS, RawEvent, encode_dt, encode_uuid, stored_precision},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Event Hub store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn:  tokio_rusqlite::Connection,
  pub(crate) clock: Arc<dyn Clock>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, clock: Arc::new(SystemClock) };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, clock: Arc::new(SystemClock) };
    store.init_schema().await?;
    Ok(store)
  }

  /// Replace the clock used for store-assigned timestamps.
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub(crate) fn now(&self) -> DateTime<Utc> { self.clock.now() }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("schema initialised");
    Ok(())
  }

  /// Whether a row with `id` exists. `sql` must select on `?1`.
  pub(crate) async fn exists(&self, sql: &'static str, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(sql, rusqlite::params![id_str], |_| Ok(()))
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(found)
  }

  async fn check_vendor(&self, id: Uuid) -> Result<()> {
    if !self.exists("SELECT 1 FROM vendors WHERE vendor_id = ?1", id).await? {
      return Err(hub_core::Error::VendorNotFound(id).into());
    }
    Ok(())
  }

  async fn check_category(&self, id: Uuid) -> Result<()> {
    if !self
      .exists("SELECT 1 FROM categories WHERE category_id = ?1", id)
      .await?
    {
      return Err(hub_core::Error::CategoryNotFound(id).into());
    }
    Ok(())
  }

  /// Fetch a live event or fail with `EventNotFound`.
  async fn live_event(&self, id: Uuid) -> Result<Event> {
    match self.get_event(id).await? {
      Some(event) if !event.is_deleted() => Ok(event),
      _ => Err(hub_core::Error::EventNotFound(id).into()),
    }
  }
}

// ─── Row writers ─────────────────────────────────────────────────────────────

/// Insert a new `events` row.
pub(crate) fn insert_event(conn: &rusqlite::Connection, event: &Event) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO events (
       event_id, vendor_id, category_id, name, description, location,
       image, event_start, event_end, featured, stored_status,
       created_at, updated_at, deleted_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
    rusqlite::params![
      encode_uuid(event.event_id),
      encode_uuid(event.vendor_id),
      encode_uuid(event.category_id),
      event.name,
      event.description,
      event.location,
      event.image,
      encode_dt(event.event_start),
      encode_dt(event.event_end),
      event.featured,
      event.stored_status,
      encode_dt(event.created_at),
      encode_dt(event.updated_at),
      event.deleted_at.map(encode_dt),
    ],
  )?;
  Ok(())
}

/// Overwrite the mutable columns of an existing `events` row.
fn overwrite_event(conn: &rusqlite::Connection, event: &Event) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE events SET
       category_id = ?2, name = ?3, description = ?4, location = ?5,
       image = ?6, event_start = ?7, event_end = ?8, featured = ?9,
       updated_at = ?10, deleted_at = ?11
     WHERE event_id = ?1",
    rusqlite::params![
      encode_uuid(event.event_id),
      encode_uuid(event.category_id),
      event.name,
      event.description,
      event.location,
      event.image,
      encode_dt(event.event_start),
      encode_dt(event.event_end),
      event.featured,
      encode_dt(event.updated_at),
      event.deleted_at.map(encode_dt),
    ],
  )?;
  Ok(())
}

impl Store for SqliteStore {
  type Error = Error;
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

impl EventStore for SqliteStore {
  async fn create_event(&self, input: NewEvent, by: Attribution) -> Result<Event> {
    input.validate()?;
    self.check_vendor(input.vendor_id).await?;
    self.check_category(input.category_id).await?;

    let now = self.now();
    let event = Event {
      event_id:      Uuid::new_v4(),
      vendor_id:     input.vendor_id,
      category_id:   input.category_id,
      name:          input.name,
      description:   input.description,
      location:      input.location,
      image:         input.image,
      event_start:   stored_precision(input.event_start),
      event_end:     stored_precision(input.event_end),
      featured:      input.featured,
      stored_status: input.stored_status,
      created_at:    now,
      updated_at:    now,
      deleted_at:    None,
    };

    let entry = by.entry(Action::CreatedEvent(&event.name));
    let row = event.clone();
    self.audited(entry, move |conn| insert_event(conn, &row)).await?;
    Ok(event)
  }

  async fn update_event(
    &self,
    id: Uuid,
    patch: EventPatch,
    by: Attribution,
  ) -> Result<Event> {
    let current = self.live_event(id).await?;
    if let Some(category_id) = patch.category_id {
      self.check_category(category_id).await?;
    }
    let mut updated = patch.apply(current, self.now())?;
    updated.event_start = stored_precision(updated.event_start);
    updated.event_end = stored_precision(updated.event_end);

    let entry = by.entry(Action::UpdatedEvent(&updated.name));
    let row = updated.clone();
    self.audited(entry, move |conn| overwrite_event(conn, &row)).await?;
    Ok(updated)
  }

  async fn soft_delete_event(&self, id: Uuid, by: Attribution) -> Result<Event> {
    let mut event = self.live_event(id).await?;
    let now = self.now();
    event.deleted_at = Some(now);
    event.updated_at = now;

    let entry = by.entry(Action::DeletedEvent(&event.name));
    let row = event.clone();
    self.audited(entry, move |conn| overwrite_event(conn, &row)).await?;
    Ok(event)
  }

  async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?1"),
              rusqlite::params![id_str],
              RawEvent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>> {
    let vendor_str   = query.vendor_id.map(encode_uuid);
    let category_str = query.category_id.map(encode_uuid);
    let featured     = query.featured;
    let from_str     = query.window.map(|(from, _)| encode_dt(from));
    let to_str       = query.window.map(|(_, to)| encode_dt(to));

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM events
           WHERE deleted_at IS NULL
             AND (?1 IS NULL OR vendor_id   = ?1)
             AND (?2 IS NULL OR category_id = ?2)
             AND (?3 IS NULL OR featured    = ?3)
             AND (?4 IS NULL OR event_end  >= ?4)
             AND (?5 IS NULL OR event_start <= ?5)
           ORDER BY event_start ASC, event_id ASC"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![vendor_str, category_str, featured, from_str, to_str],
            RawEvent::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }
}
