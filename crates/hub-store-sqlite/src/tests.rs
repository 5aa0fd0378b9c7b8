//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::{
  Arc,
  atomic::{AtomicI64, Ordering},
};

use chrono::{DateTime, Duration, TimeZone, Utc};
use hub_core::{
  Error as CoreError,
  audit::{self, Attribution, NewAuditEntry, PageRequest},
  clock::{Clock, FixedClock},
  directory::{NewUser, NewVendor, Permission, Role, UserPatch},
  event::{EventPatch, EventQuery, NewEvent},
  store::{AuditStore, DirectoryStore, EventStore},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn base() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap() }

/// Advances one minute per reading.
struct StepClock {
  ticks: AtomicI64,
}

impl Clock for StepClock {
  fn now(&self) -> DateTime<Utc> {
    base() + Duration::minutes(self.ticks.fetch_add(1, Ordering::SeqCst))
  }
}

fn by() -> Attribution { Attribution::new("test@remix.run").unwrap() }

fn core_err(err: Error) -> CoreError {
  match err {
    Error::Core(e) => e,
    other => panic!("expected core error, got {other}"),
  }
}

/// A vendor and a category to hang events on.
async fn owners(s: &SqliteStore) -> (Uuid, Uuid) {
  let vendor = s
    .create_vendor(NewVendor {
      name:         "Acme Events Co.".into(),
      description:  None,
      address:      None,
      phone_number: None,
    }, by())
    .await
    .unwrap();
  let category = s.create_category("Workshop".into()).await.unwrap();
  (vendor.vendor_id, category.category_id)
}

fn new_event(vendor_id: Uuid, category_id: Uuid, name: &str) -> NewEvent {
  NewEvent {
    vendor_id,
    category_id,
    name: name.into(),
    description: "Intensive course on effective leadership strategies.".into(),
    location: "Central Park".into(),
    image: "https://i.imgur.com/6O4ZLSg.jpeg".into(),
    event_start: base(),
    event_end: Utc.with_ymd_and_hms(2024, 6, 14, 17, 0, 0).unwrap(),
    featured: false,
    stored_status: None,
  }
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_event() {
  let s = store().await;
  let (vendor_id, category_id) = owners(&s).await;

  let event = s
    .create_event(new_event(vendor_id, category_id, "Leadership Training"), by())
    .await
    .unwrap();

  let fetched = s.get_event(event.event_id).await.unwrap().unwrap();
  assert_eq!(fetched, event);
  assert!(!fetched.is_deleted());
}

#[tokio::test]
async fn reversed_range_is_rejected_at_write_time() {
  let s = store().await;
  let (vendor_id, category_id) = owners(&s).await;

  let mut input = new_event(vendor_id, category_id, "Backwards");
  std::mem::swap(&mut input.event_start, &mut input.event_end);

  let err = core_err(s.create_event(input, by()).await.unwrap_err());
  assert!(matches!(err, CoreError::InvalidRange { .. }));
  assert!(s.list_events(&EventQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_vendor_or_category_is_not_found() {
  let s = store().await;
  let (vendor_id, category_id) = owners(&s).await;

  let err = core_err(
    s.create_event(new_event(Uuid::new_v4(), category_id, "x"), by())
      .await
      .unwrap_err(),
  );
  assert!(matches!(err, CoreError::VendorNotFound(_)));

  let err = core_err(
    s.create_event(new_event(vendor_id, Uuid::new_v4(), "x"), by())
      .await
      .unwrap_err(),
  );
  assert!(matches!(err, CoreError::CategoryNotFound(_)));
}

#[tokio::test]
async fn update_applies_patch_and_revalidates_range() {
  let s = store().await;
  let (vendor_id, category_id) = owners(&s).await;
  let event = s
    .create_event(new_event(vendor_id, category_id, "Gala"), by())
    .await
    .unwrap();

  let updated = s
    .update_event(event.event_id, EventPatch {
      name: Some("Annual Gala".into()),
      featured: Some(true),
      ..Default::default()
    }, by())
    .await
    .unwrap();
  assert_eq!(updated.name, "Annual Gala");
  assert!(updated.featured);
  assert_eq!(updated.event_start, event.event_start);

  let err = core_err(
    s.update_event(event.event_id, EventPatch {
      event_end: Some(event.event_start - Duration::hours(1)),
      ..Default::default()
    }, by())
    .await
    .unwrap_err(),
  );
  assert!(matches!(err, CoreError::InvalidRange { .. }));

  // The failed edit left the row untouched.
  let stored = s.get_event(event.event_id).await.unwrap().unwrap();
  assert_eq!(stored.event_end, event.event_end);
  assert_eq!(stored.name, "Annual Gala");
}

#[tokio::test]
async fn soft_delete_hides_from_listings_but_keeps_row() {
  let s = store().await;
  let (vendor_id, category_id) = owners(&s).await;
  let keep = s
    .create_event(new_event(vendor_id, category_id, "Keep"), by())
    .await
    .unwrap();
  let drop = s
    .create_event(new_event(vendor_id, category_id, "Drop"), by())
    .await
    .unwrap();

  let deleted = s.soft_delete_event(drop.event_id, by()).await.unwrap();
  assert!(deleted.deleted_at.is_some());

  let listed = s.list_events(&EventQuery::default()).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].event_id, keep.event_id);

  let row = s.get_event(drop.event_id).await.unwrap().unwrap();
  assert!(row.is_deleted());

  // Deleted events can be neither edited nor deleted again.
  let err = core_err(s.soft_delete_event(drop.event_id, by()).await.unwrap_err());
  assert!(matches!(err, CoreError::EventNotFound(_)));
  let err = core_err(
    s.update_event(drop.event_id, EventPatch::default(), by())
      .await
      .unwrap_err(),
  );
  assert!(matches!(err, CoreError::EventNotFound(_)));
}

#[tokio::test]
async fn list_filters_by_vendor_category_featured_and_window() {
  let s = store().await;
  let (vendor_a, workshop) = owners(&s).await;
  let vendor_b = s
    .create_vendor(NewVendor {
      name:         "Other".into(),
      description:  None,
      address:      None,
      phone_number: None,
    }, by())
    .await
    .unwrap()
    .vendor_id;
  let market = s.create_category("Market".into()).await.unwrap().category_id;

  let mut featured = new_event(vendor_a, workshop, "A featured");
  featured.featured = true;
  s.create_event(featured, by()).await.unwrap();

  let mut later = new_event(vendor_b, market, "B market");
  later.event_start = Utc.with_ymd_and_hms(2024, 12, 15, 10, 0, 0).unwrap();
  later.event_end = Utc.with_ymd_and_hms(2024, 12, 24, 20, 0, 0).unwrap();
  s.create_event(later, by()).await.unwrap();

  let by_vendor = s
    .list_events(&EventQuery { vendor_id: Some(vendor_b), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(by_vendor.len(), 1);
  assert_eq!(by_vendor[0].name, "B market");

  let by_category = s
    .list_events(&EventQuery { category_id: Some(workshop), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(by_category.len(), 1);
  assert_eq!(by_category[0].name, "A featured");

  let only_featured = s
    .list_events(&EventQuery { featured: Some(true), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(only_featured.len(), 1);

  let december = (
    Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap(),
    Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap(),
  );
  let in_december = s
    .list_events(&EventQuery { window: Some(december), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(in_december.len(), 1);
  assert_eq!(in_december[0].name, "B market");

  // Sorted by start.
  let all = s.list_events(&EventQuery::default()).await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[0].name, "A featured");
}

#[tokio::test]
async fn event_mutations_append_their_audit_entry() {
  let s = store().await;
  let (vendor_id, category_id) = owners(&s).await;
  let event = s
    .create_event(new_event(vendor_id, category_id, "Gala"), by())
    .await
    .unwrap();
  s.update_event(
    event.event_id,
    EventPatch { name: Some("Annual Gala".into()), ..Default::default() },
    by(),
  )
  .await
  .unwrap();
  s.soft_delete_event(event.event_id, by()).await.unwrap();

  let page = audit::list_page(&s, 1, 20).await.unwrap();
  let actions: Vec<&str> = page.entries.iter().map(|e| e.action.as_str()).collect();
  assert_eq!(actions, [
    "Deleted event \"Annual Gala\"",
    "Updated event \"Annual Gala\"",
    "Created event \"Gala\"",
    "Created vendor \"Acme Events Co.\"",
  ]);
  assert!(page.entries.iter().all(|e| e.person == "test@remix.run"));
}

#[tokio::test]
async fn sub_microsecond_times_are_returned_as_stored() {
  let s = store().await;
  let (vendor_id, category_id) = owners(&s).await;

  let mut input = new_event(vendor_id, category_id, "Precise");
  input.event_start = base() + Duration::nanoseconds(1_500);
  input.event_end = base() + Duration::hours(2) + Duration::nanoseconds(999);
  let created = s.create_event(input, by()).await.unwrap();
  assert_eq!(created.event_start.timestamp_subsec_nanos(), 1_000);
  assert_eq!(created.event_end.timestamp_subsec_nanos(), 0);
  assert_eq!(s.get_event(created.event_id).await.unwrap().unwrap(), created);

  let updated = s
    .update_event(
      created.event_id,
      EventPatch {
        event_end: Some(base() + Duration::hours(3) + Duration::nanoseconds(2_750)),
        ..Default::default()
      },
      by(),
    )
    .await
    .unwrap();
  assert_eq!(updated.event_end.timestamp_subsec_nanos(), 2_000);
  assert_eq!(s.get_event(created.event_id).await.unwrap().unwrap(), updated);
}

/// Makes every audit insert fail, as a full disk or a locked table would.
async fn break_audit_log(s: &SqliteStore) {
  s.conn
    .call(|conn| {
      conn.execute_batch(
        "CREATE TRIGGER audit_log_unavailable
         BEFORE INSERT ON audit_log
         BEGIN
           SELECT RAISE(ABORT, 'audit log unavailable');
         END;",
      )?;
      Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn failed_audit_write_rolls_back_event_changes() {
  let s = store().await;
  let (vendor_id, category_id) = owners(&s).await;
  let event = s
    .create_event(new_event(vendor_id, category_id, "Gala"), by())
    .await
    .unwrap();
  break_audit_log(&s).await;

  let err = s
    .create_event(new_event(vendor_id, category_id, "Ghost"), by())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Database(_)));
  let listed = s.list_events(&EventQuery::default()).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].name, "Gala");

  s.update_event(
    event.event_id,
    EventPatch { name: Some("Renamed".into()), ..Default::default() },
    by(),
  )
  .await
  .unwrap_err();
  s.soft_delete_event(event.event_id, by()).await.unwrap_err();
  assert_eq!(s.get_event(event.event_id).await.unwrap().unwrap(), event);

  let page = audit::list_page(&s, 1, 20).await.unwrap();
  assert_eq!(page.total_count, 2);
}

#[tokio::test]
async fn failed_audit_write_rolls_back_directory_changes() {
  let s = store().await;
  let user_role = role(&s, "user", false).await;
  let user = s
    .create_user(
      NewUser {
        email:     "test@remix.run".into(),
        role_id:   user_role.role_id,
        vendor_id: None,
      },
      by(),
    )
    .await
    .unwrap();
  break_audit_log(&s).await;

  s.create_user(
    NewUser {
      email:     "ghost@remix.run".into(),
      role_id:   user_role.role_id,
      vendor_id: None,
    },
    by(),
  )
  .await
  .unwrap_err();
  s.update_user(
    user.user_id,
    UserPatch { email: Some("renamed@remix.run".into()), role_id: None },
    by(),
  )
  .await
  .unwrap_err();
  s.soft_delete_user(user.user_id, by()).await.unwrap_err();
  s.create_vendor(
    NewVendor {
      name:         "Ghost Vendor".into(),
      description:  None,
      address:      None,
      phone_number: None,
    },
    by(),
  )
  .await
  .unwrap_err();

  let users = s.list_users().await.unwrap();
  assert_eq!(users.len(), 1);
  assert_eq!(users[0].user, user);
  assert!(s.list_vendors().await.unwrap().is_empty());
  assert_eq!(audit::list_page(&s, 1, 20).await.unwrap().total_count, 1);
}

// ─── Audit trail ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_then_first_page_lists_it_first() {
  let s = store().await;
  audit::record(&s, "Created event \"Gala\"", "test@remix.run")
    .await
    .unwrap();
  let latest = audit::record(&s, "Deleted event \"Gala\"", "test@remix.run")
    .await
    .unwrap();

  let page = audit::list_page(&s, 1, 20).await.unwrap();
  assert_eq!(page.total_count, 2);
  assert_eq!(page.entries[0], latest);
}

#[tokio::test]
async fn twenty_five_entries_split_over_two_pages() {
  let s = store()
    .await
    .with_clock(Arc::new(StepClock { ticks: AtomicI64::new(0) }));

  for i in 0..25 {
    audit::record(&s, format!("action {i}"), "admin@remix.run")
      .await
      .unwrap();
  }

  let first = audit::list_page(&s, 1, 20).await.unwrap();
  assert_eq!(first.total_count, 25);
  assert_eq!(first.entries.len(), 20);
  assert_eq!(first.entries[0].action, "action 24");
  assert_eq!(first.entries[19].action, "action 5");
  assert!(
    first
      .entries
      .windows(2)
      .all(|w| w[0].created_at > w[1].created_at)
  );

  let second = audit::list_page(&s, 2, 20).await.unwrap();
  assert_eq!(second.total_count, 25);
  assert_eq!(second.entries.len(), 5);
  assert_eq!(second.entries[0].action, "action 4");
  assert_eq!(second.entries[4].action, "action 0");
  assert_eq!(first.total_pages(20), 2);
}

#[tokio::test]
async fn page_beyond_the_end_is_empty_with_total() {
  let s = store().await;
  for i in 0..3 {
    audit::record(&s, format!("action {i}"), "a@b.c").await.unwrap();
  }
  let page = audit::list_page(&s, 7, 20).await.unwrap();
  assert!(page.entries.is_empty());
  assert_eq!(page.total_count, 3);
}

#[tokio::test]
async fn invalid_arguments_are_rejected_before_touching_the_store() {
  let s = store().await;
  for (action, person) in [("", "a@b.c"), ("x", ""), ("  ", "a@b.c")] {
    let err = core_err(audit::record(&s, action, person).await.unwrap_err());
    assert!(matches!(err, CoreError::InvalidArgument(_)));
  }
  for (page, size) in [(0, 20), (1, 0), (-1, 5)] {
    let err = core_err(audit::list_page(&s, page, size).await.unwrap_err());
    assert!(matches!(err, CoreError::InvalidArgument(_)));
  }
  assert_eq!(audit::list_page(&s, 1, 20).await.unwrap().total_count, 0);
}

#[tokio::test]
async fn same_instant_entries_read_back_newest_insert_first() {
  let s = store()
    .await
    .with_clock(Arc::new(FixedClock(base())));

  let first = s
    .append_audit(NewAuditEntry::new("first", "a@b.c").unwrap())
    .await
    .unwrap();
  let second = s
    .append_audit(NewAuditEntry::new("second", "a@b.c").unwrap())
    .await
    .unwrap();
  assert_eq!(first.created_at, second.created_at);

  let page = s.audit_page(PageRequest::new(1, 10).unwrap()).await.unwrap();
  assert_eq!(page.entries[0].action, "second");
  assert_eq!(page.entries[1].action, "first");
}

#[tokio::test]
async fn timestamps_never_go_backwards() {
  let late = store()
    .await
    .with_clock(Arc::new(FixedClock(base() + Duration::hours(1))));
  let first = audit::record(&late, "late clock", "a@b.c").await.unwrap();

  // Same connection, clock moved backwards.
  let early = late.clone().with_clock(Arc::new(FixedClock(base())));
  let second = audit::record(&early, "early clock", "a@b.c").await.unwrap();

  assert!(second.created_at >= first.created_at);
  let page = audit::list_page(&early, 1, 2).await.unwrap();
  assert_eq!(page.entries[0].action, "early clock");
}

#[tokio::test]
async fn audit_rows_cannot_be_modified() {
  let s = store().await;
  audit::record(&s, "Created vendor", "a@b.c").await.unwrap();

  let update = s
    .conn
    .call(|conn| {
      conn.execute("UPDATE audit_log SET action = 'tampered'", [])?;
      Ok(())
    })
    .await;
  assert!(update.is_err());

  let delete = s
    .conn
    .call(|conn| {
      conn.execute("DELETE FROM audit_log", [])?;
      Ok(())
    })
    .await;
  assert!(delete.is_err());

  let page = audit::list_page(&s, 1, 20).await.unwrap();
  assert_eq!(page.entries[0].action, "Created vendor");
}

#[tokio::test]
async fn concurrent_records_all_land() {
  let s = store().await;
  let mut handles = Vec::new();
  for i in 0..16 {
    let s = s.clone();
    handles.push(tokio::spawn(async move {
      audit::record(&s, format!("action {i}"), format!("user{i}@x.io")).await
    }));
  }
  for h in handles {
    h.await.unwrap().unwrap();
  }
  let page = audit::list_page(&s, 1, 50).await.unwrap();
  assert_eq!(page.total_count, 16);
  assert_eq!(page.entries.len(), 16);
}

// ─── Directory ───────────────────────────────────────────────────────────────

async fn role(s: &SqliteStore, name: &str, admin: bool) -> Role {
  s.create_role(Role {
    role_id:     Uuid::new_v4(),
    name:        name.into(),
    permissions: if admin {
      Permission::all()
    } else {
      Permission::vendor_defaults()
    },
  })
  .await
  .unwrap()
}

#[tokio::test]
async fn roles_roundtrip_with_permissions() {
  let s = store().await;
  let user = role(&s, "user", false).await;
  role(&s, "admin", true).await;

  let roles = s.list_roles().await.unwrap();
  assert_eq!(roles.len(), 2);
  assert_eq!(roles[0].name, "admin");
  assert_eq!(roles[0].permissions.len(), 6);

  let fetched = s.get_role(user.role_id).await.unwrap().unwrap();
  assert_eq!(fetched, user);
  assert!(!fetched.can(Permission::ManageUsers));
}

#[tokio::test]
async fn user_lifecycle() {
  let s = store().await;
  let user_role = role(&s, "user", false).await;
  let admin_role = role(&s, "admin", true).await;

  let user = s
    .create_user(NewUser {
      email:     "test@remix.run".into(),
      role_id:   user_role.role_id,
      vendor_id: None,
    }, by())
    .await
    .unwrap();

  let dup = s
    .create_user(NewUser {
      email:     "test@remix.run".into(),
      role_id:   user_role.role_id,
      vendor_id: None,
    }, by())
    .await
    .unwrap_err();
  assert!(matches!(core_err(dup), CoreError::EmailTaken(_)));

  let updated = s
    .update_user(user.user_id, UserPatch {
      email:   Some("renamed@remix.run".into()),
      role_id: Some(admin_role.role_id),
    }, by())
    .await
    .unwrap();
  assert_eq!(updated.email, "renamed@remix.run");
  assert_eq!(updated.role_id, admin_role.role_id);

  let listed = s.list_users().await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].role.name, "admin");

  s.soft_delete_user(user.user_id, by()).await.unwrap();
  assert!(s.list_users().await.unwrap().is_empty());
  assert!(
    s.get_user(user.user_id)
      .await
      .unwrap()
      .unwrap()
      .deleted_at
      .is_some()
  );

  let err = core_err(
    s.update_user(user.user_id, UserPatch::default(), by())
      .await
      .unwrap_err(),
  );
  assert!(matches!(err, CoreError::UserNotFound(_)));
}

#[tokio::test]
async fn user_with_unknown_role_is_rejected() {
  let s = store().await;
  let err = s
    .create_user(NewUser {
      email:     "a@b.c".into(),
      role_id:   Uuid::new_v4(),
      vendor_id: None,
    }, by())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::RoleNotFound(_)));
}

#[tokio::test]
async fn racing_duplicate_emails_surface_as_email_taken() {
  let s = store().await;
  let user_role = role(&s, "user", false).await;

  let mut handles = Vec::new();
  for _ in 0..8 {
    let s = s.clone();
    let role_id = user_role.role_id;
    handles.push(tokio::spawn(async move {
      s.create_user(
        NewUser { email: "race@remix.run".into(), role_id, vendor_id: None },
        by(),
      )
      .await
    }));
  }
  let mut created = 0;
  for h in handles {
    match h.await.unwrap() {
      Ok(_) => created += 1,
      Err(err) => assert!(matches!(core_err(err), CoreError::EmailTaken(_))),
    }
  }
  assert_eq!(created, 1);
  assert_eq!(audit::list_page(&s, 1, 20).await.unwrap().total_count, 1);
}

#[tokio::test]
async fn unique_violations_are_recognised() {
  let s = store().await;
  s.create_category("Market".into()).await.unwrap();

  let err: Error = s
    .conn
    .call(|conn| {
      conn.execute(
        "INSERT INTO categories (category_id, name) VALUES ('dup', 'Market')",
        [],
      )?;
      Ok(())
    })
    .await
    .unwrap_err()
    .into();
  assert!(err.is_unique_violation());

  let other: Error = CoreError::EmailTaken("a@b.c".into()).into();
  assert!(!other.is_unique_violation());
}

// ─── Seeding ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn seed_is_idempotent() {
  let s = store().await;
  let report = s.seed_demo().await.unwrap();
  assert!(report.seeded);
  assert_eq!(report.categories, 11);
  assert_eq!(report.events, 12);

  let again = s.seed_demo().await.unwrap();
  assert!(!again.seeded);

  assert_eq!(s.list_roles().await.unwrap().len(), 2);
  assert_eq!(s.list_users().await.unwrap().len(), 2);
  assert_eq!(
    s.list_events(&EventQuery::default()).await.unwrap().len(),
    12
  );
  let page = audit::list_page(&s, 1, 20).await.unwrap();
  assert_eq!(page.total_count, 1);
  assert_eq!(page.entries[0].person, "system");
}

#[tokio::test]
async fn failed_seed_leaves_the_store_empty() {
  let s = store().await;
  // Collides with a demo category halfway through the install.
  s.create_category("Market".into()).await.unwrap();

  s.seed_demo().await.unwrap_err();

  assert!(s.list_roles().await.unwrap().is_empty());
  assert!(s.list_users().await.unwrap().is_empty());
  assert!(s.list_vendors().await.unwrap().is_empty());
  assert!(s.list_events(&EventQuery::default()).await.unwrap().is_empty());
  assert_eq!(s.list_categories().await.unwrap().len(), 1);
  assert_eq!(audit::list_page(&s, 1, 20).await.unwrap().total_count, 0);
}
