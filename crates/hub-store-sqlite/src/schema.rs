//! SQL schema for the Event Hub SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS roles (
    role_id     TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS role_permissions (
    role_id     TEXT NOT NULL REFERENCES roles(role_id),
    permission  TEXT NOT NULL,          -- kebab-case Permission name
    PRIMARY KEY (role_id, permission)
);

CREATE TABLE IF NOT EXISTS vendors (
    vendor_id    TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    description  TEXT,
    address      TEXT,
    phone_number TEXT,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    category_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    email       TEXT NOT NULL UNIQUE,
    role_id     TEXT NOT NULL REFERENCES roles(role_id),
    vendor_id   TEXT REFERENCES vendors(vendor_id),
    created_at  TEXT NOT NULL,
    deleted_at  TEXT
);

-- Events are soft-deleted; no DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS events (
    event_id      TEXT PRIMARY KEY,
    vendor_id     TEXT NOT NULL REFERENCES vendors(vendor_id),
    category_id   TEXT NOT NULL REFERENCES categories(category_id),
    name          TEXT NOT NULL,
    description   TEXT NOT NULL,
    location      TEXT NOT NULL,
    image         TEXT NOT NULL,
    event_start   TEXT NOT NULL,    -- RFC 3339 UTC, fixed-width microseconds
    event_end     TEXT NOT NULL,
    featured      INTEGER NOT NULL DEFAULT 0,
    stored_status TEXT,             -- legacy; never authoritative
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    deleted_at    TEXT,
    CHECK (event_end >= event_start)
);

-- The audit trail is strictly append-only. `seq` breaks ties between
-- entries sharing a timestamp.
CREATE TABLE IF NOT EXISTS audit_log (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    audit_id    TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL,
    action      TEXT NOT NULL,
    person      TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS audit_log_no_update
BEFORE UPDATE ON audit_log
BEGIN
    SELECT RAISE(ABORT, 'audit log is append-only');
END;

CREATE TRIGGER IF NOT EXISTS audit_log_no_delete
BEFORE DELETE ON audit_log
BEGIN
    SELECT RAISE(ABORT, 'audit log is append-only');
END;

CREATE INDEX IF NOT EXISTS events_vendor_idx   ON events(vendor_id);
CREATE INDEX IF NOT EXISTS events_category_idx ON events(category_id);
CREATE INDEX IF NOT EXISTS events_start_idx    ON events(event_start);
CREATE INDEX IF NOT EXISTS audit_created_idx   ON audit_log(created_at, seq);

PRAGMA user_version = 1;
";
