//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Entity rows are never deleted; is_active = 0 is the soft-delete marker.
CREATE TABLE IF NOT EXISTS employees (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name   TEXT    NOT NULL,
    last_name    TEXT    NOT NULL,
    email        TEXT    NOT NULL,
    department   TEXT    NOT NULL,
    position     TEXT    NOT NULL,
    is_active    INTEGER NOT NULL DEFAULT 1,
    created_date TEXT    NOT NULL          -- ISO 8601 UTC; server-assigned
);

CREATE TABLE IF NOT EXISTS roles (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT    NOT NULL,
    description  TEXT    NOT NULL,
    is_active    INTEGER NOT NULL DEFAULT 1,
    created_date TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS rights (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT    NOT NULL,
    description  TEXT    NOT NULL,
    category     TEXT    NOT NULL,
    right_type   TEXT    NOT NULL,
    is_active    INTEGER NOT NULL DEFAULT 1,
    created_date TEXT    NOT NULL
);

-- Link rows: one per pair for the lifetime of the store. Revocation flips
-- is_active; no DELETE is ever issued against these tables.
CREATE TABLE IF NOT EXISTS employee_roles (
    employee_id   INTEGER NOT NULL REFERENCES employees(id),
    role_id       INTEGER NOT NULL REFERENCES roles(id),
    assigned_date TEXT    NOT NULL,
    is_active     INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (employee_id, role_id)
);

CREATE TABLE IF NOT EXISTS role_rights (
    role_id       INTEGER NOT NULL REFERENCES roles(id),
    right_id      INTEGER NOT NULL REFERENCES rights(id),
    assigned_date TEXT    NOT NULL,
    is_active     INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (role_id, right_id)
);

CREATE INDEX IF NOT EXISTS employee_roles_role_idx ON employee_roles(role_id);
CREATE INDEX IF NOT EXISTS role_rights_right_idx   ON role_rights(right_id);
CREATE INDEX IF NOT EXISTS rights_category_idx     ON rights(category, name);

PRAGMA user_version = 1;
";
