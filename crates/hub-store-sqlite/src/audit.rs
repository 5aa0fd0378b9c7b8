//! [`AuditStore`] impl: append-only inserts and newest-first pages, plus the
//! transactional helper every audited mutation goes through.

use hub_core::{
  audit::{AuditEntry, AuditPage, NewAuditEntry, PageRequest},
  store::AuditStore,
};
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{RawAuditEntry, decode_dt, encode_dt, encode_uuid},
};

/// Append one audit row inside an open transaction and return the
/// `created_at` it was given: `now`, or the newest existing timestamp if the
/// clock has gone backwards.
pub(crate) fn insert_audit(
  conn: &rusqlite::Connection,
  audit_id: &str,
  now: String,
  action: &str,
  person: &str,
) -> rusqlite::Result<String> {
  let last: Option<String> =
    conn.query_row("SELECT MAX(created_at) FROM audit_log", [], |r| r.get(0))?;
  let at = match last {
    Some(last) if last > now => last,
    _ => now,
  };
  conn.execute(
    "INSERT INTO audit_log (audit_id, created_at, action, person)
     VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![audit_id, at, action, person],
  )?;
  Ok(at)
}

impl SqliteStore {
  /// Run `write` and append `entry` in one transaction.
  pub(crate) async fn audited<F>(&self, entry: NewAuditEntry, write: F) -> Result<()>
  where
    F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<()> + Send + 'static,
  {
    let id_str = encode_uuid(Uuid::new_v4());
    let now_str = encode_dt(self.now());
    let (action, person) = entry.into_parts();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        write(&*tx)?;
        insert_audit(&tx, &id_str, now_str, &action, &person)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl AuditStore for SqliteStore {
  async fn append_audit(&self, entry: NewAuditEntry) -> Result<AuditEntry> {
    let audit_id = Uuid::new_v4();
    let id_str = encode_uuid(audit_id);
    let now_str = encode_dt(self.now());
    let (action, person) = entry.into_parts();
    let (action_col, person_col) = (action.clone(), person.clone());

    let at_str: String = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let at = insert_audit(&tx, &id_str, now_str, &action_col, &person_col)?;
        tx.commit()?;
        Ok(at)
      })
      .await?;

    Ok(AuditEntry {
      audit_id,
      created_at: decode_dt(&at_str)?,
      action,
      person,
    })
  }

  async fn audit_page(&self, request: PageRequest) -> Result<AuditPage> {
    let limit = i64::from(request.page_size());
    let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);

    let (total, raws): (i64, Vec<RawAuditEntry>) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let total: i64 =
          tx.query_row("SELECT COUNT(*) FROM audit_log", [], |r| r.get(0))?;
        let rows = {
          let mut stmt = tx.prepare(
            "SELECT audit_id, created_at, action, person
             FROM audit_log
             ORDER BY created_at DESC, seq DESC
             LIMIT ?1 OFFSET ?2",
          )?;
          stmt
            .query_map(rusqlite::params![limit, offset], |row| {
              Ok(RawAuditEntry {
                audit_id:   row.get(0)?,
                created_at: row.get(1)?,
                action:     row.get(2)?,
                person:     row.get(3)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.commit()?;
        Ok((total, rows))
      })
      .await?;

    let entries = raws
      .into_iter()
      .map(RawAuditEntry::into_entry)
      .collect::<Result<Vec<_>>>()?;

    Ok(AuditPage { entries, total_count: total.max(0) as u64 })
  }
}
