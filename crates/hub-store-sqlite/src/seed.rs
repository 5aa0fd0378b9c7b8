//! Demo data: roles, categories, two users, one vendor and its events.
//!
//! Some demo events carry a stored status string that has long since gone
//! stale; listings report those rows as drifted.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use hub_core::{
  audit::{Action, Attribution},
  directory::{Category, Permission, Role, User, Vendor},
  event::{Event, NewEvent},
};

use crate::{
  Result, SqliteStore,
  audit::insert_audit,
  directory::{insert_category, insert_role, insert_user, insert_vendor},
  encode::{encode_dt, encode_uuid},
  store::insert_event,
};

/// What [`SqliteStore::seed_demo`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
  /// `false` when the store already held roles and nothing was written.
  pub seeded:     bool,
  pub roles:      usize,
  pub users:      usize,
  pub categories: usize,
  pub events:     usize,
}

const CATEGORIES: &[&str] = &[
  "Cultural",
  "Workshop",
  "Festival",
  "Training session",
  "Tournament",
  "Concert",
  "Fundraiser",
  "Fair",
  "Market",
  "Celebration",
  "Rally",
];

/// Name, category, description, stored status, start, end, featured.
type SeedEvent = (
  &'static str,
  &'static str,
  &'static str,
  &'static str,
  (i32, u32, u32, u32, u32),
  (i32, u32, u32, u32, u32),
  bool,
);

const EVENTS: &[SeedEvent] = &[
  ("Annual Gala", "Cultural", "A night of celebration and networking.",
   "upcoming", (2024, 10, 15, 18, 0), (2024, 10, 15, 23, 0), true),
  ("Tech Workshop 2024", "Workshop", "Learn the latest in web development technologies.",
   "upcoming", (2024, 9, 5, 9, 0), (2024, 9, 5, 17, 0), false),
  ("Summer Music Festival", "Festival", "Three days of non-stop music from top artists.",
   "upcoming", (2024, 7, 1, 12, 0), (2024, 7, 3, 23, 0), true),
  ("Leadership Training", "Training session", "Intensive course on effective leadership strategies.",
   "ongoing", (2024, 6, 10, 9, 0), (2024, 6, 14, 17, 0), false),
  ("City Marathon", "Tournament", "Annual marathon through the heart of the city.",
   "upcoming", (2024, 11, 20, 7, 0), (2024, 11, 20, 15, 0), false),
  ("Classical Orchestra Night", "Concert", "An evening of classical masterpieces.",
   "upcoming", (2024, 8, 25, 19, 30), (2024, 8, 25, 22, 0), false),
  ("Charity Gala Dinner", "Fundraiser", "Raising funds for local children's hospitals.",
   "upcoming", (2024, 12, 5, 18, 0), (2024, 12, 5, 23, 0), true),
  ("Winter Market", "Market", "Annual market featuring local artisans and food vendors.",
   "upcoming", (2024, 12, 15, 10, 0), (2024, 12, 24, 20, 0), false),
  ("Summer Reading Program", "Workshop", "Encouraging literacy through a city-wide reading challenge.",
   "ongoing", (2024, 6, 1, 0, 0), (2024, 8, 31, 23, 59), false),
  ("Fitness Boot Camp", "Training session", "Get in shape with our intensive fitness program.",
   "ongoing", (2024, 5, 15, 6, 0), (2024, 7, 15, 8, 0), true),
  ("Local Theater Production", "Cultural", "Weekly performances of 'A Midsummer Night's Dream'.",
   "ongoing", (2024, 6, 1, 19, 0), (2024, 8, 31, 22, 0), false),
  ("Farmer's Market", "Market", "Weekly market featuring fresh local produce.",
   "ongoing", (2024, 5, 1, 8, 0), (2024, 10, 31, 14, 0), false),
];

fn at((y, mo, d, h, mi): (i32, u32, u32, u32, u32)) -> Result<DateTime<Utc>> {
  Utc
    .with_ymd_and_hms(y, mo, d, h, mi, 0)
    .single()
    .ok_or_else(|| crate::Error::DateParse(format!("invalid seed date {y}-{mo}-{d}")))
}

/// Every row the demo install writes.
struct DemoData {
  roles:      Vec<Role>,
  vendor:     Vendor,
  users:      Vec<User>,
  categories: Vec<Category>,
  events:     Vec<Event>,
}

impl DemoData {
  fn build(now: DateTime<Utc>) -> Result<Self> {
    let user_role = Role {
      role_id:     Uuid::new_v4(),
      name:        "user".into(),
      permissions: Permission::vendor_defaults(),
    };
    let admin_role = Role {
      role_id:     Uuid::new_v4(),
      name:        "admin".into(),
      permissions: Permission::all(),
    };

    let vendor = Vendor {
      vendor_id:    Uuid::new_v4(),
      name:         "Acme Events Co.".into(),
      description:  Some("We organize the best events in town!".into()),
      address:      Some("123 Main St, Anytown, USA".into()),
      phone_number: Some("555-1234".into()),
      created_at:   now,
    };

    let user = |email: &str, role: &Role, vendor_id: Option<Uuid>| User {
      user_id: Uuid::new_v4(),
      email: email.into(),
      role_id: role.role_id,
      vendor_id,
      created_at: now,
      deleted_at: None,
    };
    let users = vec![
      user("test@remix.run", &user_role, Some(vendor.vendor_id)),
      user("admin@remix.run", &admin_role, None),
    ];

    let categories: Vec<Category> = CATEGORIES
      .iter()
      .map(|name| Category { category_id: Uuid::new_v4(), name: (*name).into() })
      .collect();

    let mut events = Vec::with_capacity(EVENTS.len());
    for &(name, category, description, status, start, end, featured) in EVENTS {
      let Some(category) = categories.iter().find(|c| c.name == category) else {
        continue;
      };
      let input = NewEvent {
        vendor_id:     vendor.vendor_id,
        category_id:   category.category_id,
        name:          name.into(),
        description:   description.into(),
        location:      "Central Park".into(),
        image:         "https://i.imgur.com/rNd6zT7.jpeg".into(),
        event_start:   at(start)?,
        event_end:     at(end)?,
        featured,
        stored_status: Some(status.into()),
      };
      input.validate()?;
      events.push(Event {
        event_id:      Uuid::new_v4(),
        vendor_id:     input.vendor_id,
        category_id:   input.category_id,
        name:          input.name,
        description:   input.description,
        location:      input.location,
        image:         input.image,
        event_start:   input.event_start,
        event_end:     input.event_end,
        featured:      input.featured,
        stored_status: input.stored_status,
        created_at:    now,
        updated_at:    now,
        deleted_at:    None,
      });
    }

    Ok(Self { roles: vec![user_role, admin_role], vendor, users, categories, events })
  }

  fn report(&self) -> SeedReport {
    SeedReport {
      seeded:     true,
      roles:      self.roles.len(),
      users:      self.users.len(),
      categories: self.categories.len(),
      events:     self.events.len(),
    }
  }
}

impl SqliteStore {
  /// Install demo data unless roles already exist.
  ///
  /// Runs as one transaction: either every demo row and the audit entry land,
  /// or nothing does.
  pub async fn seed_demo(&self) -> Result<SeedReport> {
    let now = self.now();
    let data = DemoData::build(now)?;
    let report = data.report();

    let entry = Attribution::new("system")?.entry(Action::SeededDemoData);
    let (action, person) = entry.into_parts();
    let audit_id = encode_uuid(Uuid::new_v4());
    let now_str = encode_dt(now);

    let seeded = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let has_roles: bool =
          tx.query_row("SELECT EXISTS(SELECT 1 FROM roles)", [], |r| r.get(0))?;
        if has_roles {
          return Ok(false);
        }

        for role in &data.roles {
          insert_role(&tx, role)?;
        }
        insert_vendor(&tx, &data.vendor)?;
        for user in &data.users {
          insert_user(&tx, user)?;
        }
        for category in &data.categories {
          insert_category(&tx, category)?;
        }
        for event in &data.events {
          insert_event(&tx, event)?;
        }
        insert_audit(&tx, &audit_id, now_str, &action, &person)?;

        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !seeded {
      tracing::info!("store already seeded; skipping");
      return Ok(SeedReport::default());
    }
    tracing::info!(?report, "seeded demo data");
    Ok(report)
  }
}
