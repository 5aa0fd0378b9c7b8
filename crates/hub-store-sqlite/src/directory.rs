//! [`DirectoryStore`] impl: roles, users, vendors, categories.

use std::collections::{BTreeMap, BTreeSet};

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use hub_core::{
  Error as CoreError,
  audit::{Action, Attribution},
  directory::{
    Category, NewUser, NewVendor, Role, User, UserPatch, UserWithRole, Vendor,
  },
  store::DirectoryStore,
};

use crate::{
  Error, Result, SqliteStore,
  encode::{
    RawUser, RawVendor, USER_COLUMNS, VENDOR_COLUMNS, decode_category,
    decode_permission, decode_uuid, encode_dt, encode_uuid,
  },
};

impl SqliteStore {
  /// All roles keyed by id, with permissions attached.
  async fn roles_by_id(&self) -> Result<BTreeMap<Uuid, Role>> {
    let (roles, grants): (Vec<(String, String)>, Vec<(String, String)>) = self
      .conn
      .call(|conn| {
        let roles = conn
          .prepare("SELECT role_id, name FROM roles ORDER BY name")?
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<(String, String)>>>()?;
        let grants = conn
          .prepare("SELECT role_id, permission FROM role_permissions")?
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<(String, String)>>>()?;
        Ok((roles, grants))
      })
      .await?;

    let mut by_id = BTreeMap::new();
    for (id, name) in roles {
      let role_id = decode_uuid(&id)?;
      by_id.insert(role_id, Role { role_id, name, permissions: BTreeSet::new() });
    }
    for (id, permission) in grants {
      if let Some(role) = by_id.get_mut(&decode_uuid(&id)?) {
        role.permissions.insert(decode_permission(&permission)?);
      }
    }
    Ok(by_id)
  }

  /// Fetch a live user or fail with `UserNotFound`.
  async fn live_user(&self, id: Uuid) -> Result<User> {
    match self.get_user(id).await? {
      Some(user) if user.deleted_at.is_none() => Ok(user),
      _ => Err(CoreError::UserNotFound(id).into()),
    }
  }

  async fn check_role(&self, id: Uuid) -> Result<()> {
    if !self.exists("SELECT 1 FROM roles WHERE role_id = ?1", id).await? {
      return Err(CoreError::RoleNotFound(id).into());
    }
    Ok(())
  }

  async fn check_email_free(&self, email: &str) -> Result<()> {
    let email_owned = email.to_owned();
    let taken = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM users WHERE email = ?1",
              rusqlite::params![email_owned],
              |_| Ok(()),
            )
            .optional()?
            .is_some(),
        )
      })
      .await?;
    if taken {
      return Err(CoreError::EmailTaken(email.to_owned()).into());
    }
    Ok(())
  }
}

// ─── Row writers ─────────────────────────────────────────────────────────────

/// Insert a role and its permission grants.
pub(crate) fn insert_role(conn: &rusqlite::Connection, role: &Role) -> rusqlite::Result<()> {
  let id_str = encode_uuid(role.role_id);
  conn.execute(
    "INSERT INTO roles (role_id, name) VALUES (?1, ?2)",
    rusqlite::params![id_str, role.name],
  )?;
  for permission in &role.permissions {
    conn.execute(
      "INSERT INTO role_permissions (role_id, permission) VALUES (?1, ?2)",
      rusqlite::params![id_str, permission.to_string()],
    )?;
  }
  Ok(())
}

pub(crate) fn insert_user(conn: &rusqlite::Connection, user: &User) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO users (user_id, email, role_id, vendor_id, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      encode_uuid(user.user_id),
      user.email,
      encode_uuid(user.role_id),
      user.vendor_id.map(encode_uuid),
      encode_dt(user.created_at),
    ],
  )?;
  Ok(())
}

pub(crate) fn insert_vendor(conn: &rusqlite::Connection, vendor: &Vendor) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO vendors (vendor_id, name, description, address, phone_number, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      encode_uuid(vendor.vendor_id),
      vendor.name,
      vendor.description,
      vendor.address,
      vendor.phone_number,
      encode_dt(vendor.created_at),
    ],
  )?;
  Ok(())
}

pub(crate) fn insert_category(
  conn: &rusqlite::Connection,
  category: &Category,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO categories (category_id, name) VALUES (?1, ?2)",
    rusqlite::params![encode_uuid(category.category_id), category.name],
  )?;
  Ok(())
}

/// Report a UNIQUE rejection on `users.email` as `EmailTaken`.
fn email_conflict(email: &str) -> impl FnOnce(Error) -> Error + '_ {
  move |e| {
    if e.is_unique_violation() {
      CoreError::EmailTaken(email.to_owned()).into()
    } else {
      e
    }
  }
}

impl DirectoryStore for SqliteStore {
  // ── Roles ─────────────────────────────────────────────────────────────────

  async fn create_role(&self, role: Role) -> Result<Role> {
    let row = role.clone();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_role(&tx, &row)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(role)
  }

  async fn list_roles(&self) -> Result<Vec<Role>> {
    let mut roles: Vec<Role> = self.roles_by_id().await?.into_values().collect();
    roles.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(roles)
  }

  async fn get_role(&self, id: Uuid) -> Result<Option<Role>> {
    Ok(self.roles_by_id().await?.remove(&id))
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser, by: Attribution) -> Result<User> {
    input.validate()?;
    let email = input.email.trim().to_owned();
    self.check_role(input.role_id).await?;
    if let Some(vendor_id) = input.vendor_id
      && self.get_vendor(vendor_id).await?.is_none()
    {
      return Err(CoreError::VendorNotFound(vendor_id).into());
    }
    self.check_email_free(&email).await?;

    let user = User {
      user_id: Uuid::new_v4(),
      email,
      role_id: input.role_id,
      vendor_id: input.vendor_id,
      created_at: self.now(),
      deleted_at: None,
    };

    let entry = by.entry(Action::CreatedUser(&user.email));
    let row = user.clone();
    self
      .audited(entry, move |conn| insert_user(conn, &row))
      .await
      .map_err(email_conflict(&user.email))?;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn list_users(&self) -> Result<Vec<UserWithRole>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users
           WHERE deleted_at IS NULL
           ORDER BY email"
        ))?;
        let rows = stmt
          .query_map([], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let roles = self.roles_by_id().await?;
    raws
      .into_iter()
      .map(|raw| -> Result<UserWithRole> {
        let user = raw.into_user()?;
        let role = roles
          .get(&user.role_id)
          .cloned()
          .ok_or(CoreError::RoleNotFound(user.role_id))?;
        Ok(UserWithRole { user, role })
      })
      .collect()
  }

  async fn update_user(
    &self,
    id: Uuid,
    patch: UserPatch,
    by: Attribution,
  ) -> Result<User> {
    patch.validate()?;
    let mut user = self.live_user(id).await?;

    if let Some(role_id) = patch.role_id {
      self.check_role(role_id).await?;
      user.role_id = role_id;
    }
    if let Some(email) = patch.email {
      let email = email.trim().to_owned();
      if email != user.email {
        self.check_email_free(&email).await?;
        user.email = email;
      }
    }

    let id_str    = encode_uuid(user.user_id);
    let email_col = user.email.clone();
    let role_str  = encode_uuid(user.role_id);

    self
      .audited(by.entry(Action::UpdatedUser(&user.email)), move |conn| {
        conn.execute(
          "UPDATE users SET email = ?2, role_id = ?3 WHERE user_id = ?1",
          rusqlite::params![id_str, email_col, role_str],
        )?;
        Ok(())
      })
      .await
      .map_err(email_conflict(&user.email))?;

    Ok(user)
  }

  async fn soft_delete_user(&self, id: Uuid, by: Attribution) -> Result<User> {
    let mut user = self.live_user(id).await?;
    let now = self.now();
    user.deleted_at = Some(now);

    let id_str = encode_uuid(id);
    let at_str = encode_dt(now);

    self
      .audited(by.entry(Action::DeletedUser(&user.email)), move |conn| {
        conn.execute(
          "UPDATE users SET deleted_at = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  // ── Vendors ───────────────────────────────────────────────────────────────

  async fn create_vendor(&self, input: NewVendor, by: Attribution) -> Result<Vendor> {
    input.validate()?;
    let vendor = Vendor {
      vendor_id:    Uuid::new_v4(),
      name:         input.name,
      description:  input.description,
      address:      input.address,
      phone_number: input.phone_number,
      created_at:   self.now(),
    };

    let entry = by.entry(Action::CreatedVendor(&vendor.name));
    let row = vendor.clone();
    self.audited(entry, move |conn| insert_vendor(conn, &row)).await?;

    Ok(vendor)
  }

  async fn get_vendor(&self, id: Uuid) -> Result<Option<Vendor>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawVendor> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {VENDOR_COLUMNS} FROM vendors WHERE vendor_id = ?1"),
              rusqlite::params![id_str],
              RawVendor::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVendor::into_vendor).transpose()
  }

  async fn list_vendors(&self) -> Result<Vec<Vendor>> {
    let raws: Vec<RawVendor> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {VENDOR_COLUMNS} FROM vendors ORDER BY name"
        ))?;
        let rows = stmt
          .query_map([], RawVendor::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVendor::into_vendor).collect()
  }

  // ── Categories ────────────────────────────────────────────────────────────

  async fn create_category(&self, name: String) -> Result<Category> {
    if name.trim().is_empty() {
      return Err(CoreError::InvalidArgument("category name is required".into()).into());
    }
    let category = Category { category_id: Uuid::new_v4(), name };

    let row = category.clone();
    self
      .conn
      .call(move |conn| {
        insert_category(conn, &row)?;
        Ok(())
      })
      .await?;

    Ok(category)
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let rows: Vec<(String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT category_id, name FROM categories ORDER BY name")?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<(String, String)>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(id, name)| decode_category(&id, name))
      .collect()
  }
}

