//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Rows are first read into
//! `Raw*` structs inside the connection closure and decoded afterwards, so
//! decode failures surface as [`Error::DateParse`] rather than as SQLite
//! errors.

use chrono::{DateTime, Utc};
use roster_core::{
  assignment::{EmployeeRole, RoleRight},
  effective::{Grant, HeldRole},
  employee::Employee,
  right::Right,
  role::Role,
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// `%needle%` with LIKE wildcards in `needle` escaped by `\`. Use together
/// with `ESCAPE '\'`.
pub fn like_pattern(needle: &str) -> String {
  let mut out = String::with_capacity(needle.len() + 2);
  out.push('%');
  for c in needle.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

/// A JSON array of `ids`, bound as one parameter and expanded in SQL with
/// `IN (SELECT value FROM json_each(?))`, so list length is not bounded by
/// SQLite's variable limit.
pub fn id_array(ids: &[i64]) -> String {
  let items: Vec<String> = ids.iter().map(i64::to_string).collect();
  format!("[{}]", items.join(","))
}

// ─── Employees ───────────────────────────────────────────────────────────────

pub const EMPLOYEE_COLUMNS: &str =
  "e.id, e.first_name, e.last_name, e.email, e.department, e.position, e.is_active, e.created_date";

/// Raw values read directly from an `employees` row.
pub struct RawEmployee {
  pub id:           i64,
  pub first_name:   String,
  pub last_name:    String,
  pub email:        String,
  pub department:   String,
  pub position:     String,
  pub is_active:    bool,
  pub created_date: String,
}

impl RawEmployee {
  /// Read [`EMPLOYEE_COLUMNS`] starting at column `at`.
  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(at)?,
      first_name:   row.get(at + 1)?,
      last_name:    row.get(at + 2)?,
      email:        row.get(at + 3)?,
      department:   row.get(at + 4)?,
      position:     row.get(at + 5)?,
      is_active:    row.get(at + 6)?,
      created_date: row.get(at + 7)?,
    })
  }

  pub fn into_employee(self) -> Result<Employee> {
    Ok(Employee {
      id:           self.id,
      first_name:   self.first_name,
      last_name:    self.last_name,
      email:        self.email,
      department:   self.department,
      position:     self.position,
      is_active:    self.is_active,
      created_date: decode_dt(&self.created_date)?,
    })
  }
}

// ─── Roles ───────────────────────────────────────────────────────────────────

pub const ROLE_COLUMNS: &str = "r.id, r.name, r.description, r.is_active, r.created_date";

/// Raw values read directly from a `roles` row.
pub struct RawRole {
  pub id:           i64,
  pub name:         String,
  pub description:  String,
  pub is_active:    bool,
  pub created_date: String,
}

impl RawRole {
  /// Read [`ROLE_COLUMNS`] starting at column `at`.
  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(at)?,
      name:         row.get(at + 1)?,
      description:  row.get(at + 2)?,
      is_active:    row.get(at + 3)?,
      created_date: row.get(at + 4)?,
    })
  }

  pub fn into_role(self) -> Result<Role> {
    Ok(Role {
      id:           self.id,
      name:         self.name,
      description:  self.description,
      is_active:    self.is_active,
      created_date: decode_dt(&self.created_date)?,
    })
  }
}

// ─── Rights ──────────────────────────────────────────────────────────────────

pub const RIGHT_COLUMNS: &str =
  "g.id, g.name, g.description, g.category, g.right_type, g.is_active, g.created_date";

/// Raw values read directly from a `rights` row.
pub struct RawRight {
  pub id:           i64,
  pub name:         String,
  pub description:  String,
  pub category:     String,
  pub right_type:   String,
  pub is_active:    bool,
  pub created_date: String,
}

impl RawRight {
  /// Read [`RIGHT_COLUMNS`] starting at column `at`.
  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(at)?,
      name:         row.get(at + 1)?,
      description:  row.get(at + 2)?,
      category:     row.get(at + 3)?,
      right_type:   row.get(at + 4)?,
      is_active:    row.get(at + 5)?,
      created_date: row.get(at + 6)?,
    })
  }

  pub fn into_right(self) -> Result<Right> {
    Ok(Right {
      id:           self.id,
      name:         self.name,
      description:  self.description,
      category:     self.category,
      right_type:   self.right_type,
      is_active:    self.is_active,
      created_date: decode_dt(&self.created_date)?,
    })
  }
}

// ─── Link rows ───────────────────────────────────────────────────────────────

/// Raw values of either link table: `(parent_id, target_id, assigned_date,
/// is_active)`.
pub struct RawLink {
  pub parent_id:     i64,
  pub target_id:     i64,
  pub assigned_date: String,
  pub is_active:     bool,
}

impl RawLink {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      parent_id:     row.get(0)?,
      target_id:     row.get(1)?,
      assigned_date: row.get(2)?,
      is_active:     row.get(3)?,
    })
  }

  pub fn into_employee_role(self) -> Result<EmployeeRole> {
    Ok(EmployeeRole {
      employee_id:   self.parent_id,
      role_id:       self.target_id,
      assigned_date: decode_dt(&self.assigned_date)?,
      is_active:     self.is_active,
    })
  }

  pub fn into_role_right(self) -> Result<RoleRight> {
    Ok(RoleRight {
      role_id:       self.parent_id,
      right_id:      self.target_id,
      assigned_date: decode_dt(&self.assigned_date)?,
      is_active:     self.is_active,
    })
  }
}

// ─── Aggregation rows ────────────────────────────────────────────────────────

/// A held role: [`ROLE_COLUMNS`] followed by the link's `assigned_date`.
pub struct RawHeldRole {
  pub role:          RawRole,
  pub assigned_date: String,
}

impl RawHeldRole {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { role: RawRole::from_row(row, 0)?, assigned_date: row.get(5)? })
  }

  pub fn into_held(self) -> Result<HeldRole> {
    Ok(HeldRole {
      role_id:       self.role.id,
      name:          self.role.name,
      description:   self.role.description,
      assigned_date: decode_dt(&self.assigned_date)?,
    })
  }
}

/// A grant: `role_id`, then [`RIGHT_COLUMNS`], then the link's
/// `assigned_date`.
pub struct RawGrant {
  pub role_id:       i64,
  pub right:         RawRight,
  pub assigned_date: String,
}

impl RawGrant {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      role_id:       row.get(0)?,
      right:         RawRight::from_row(row, 1)?,
      assigned_date: row.get(8)?,
    })
  }

  pub fn into_grant(self) -> Result<Grant> {
    Ok(Grant {
      role_id:       self.role_id,
      right:         self.right.into_right()?,
      assigned_date: decode_dt(&self.assigned_date)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("Right_0"), "%Right\\_0%");
    assert_eq!(like_pattern("100%"), "%100\\%%");
    assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
  }

  #[test]
  fn id_array_is_json() {
    assert_eq!(id_array(&[]), "[]");
    assert_eq!(id_array(&[3, -1, 20]), "[3,-1,20]");
  }
}
