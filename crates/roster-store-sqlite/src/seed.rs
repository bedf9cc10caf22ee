//! Demo data: 200 rights, five roles, five employees and the links between
//! them.
//!
//! The grant selection is a fixed permutation per role, so every seeded store
//! holds exactly the same rows apart from timestamps.

use chrono::{Duration, Utc};
use rusqlite::params;
use tracing::info;

use crate::{Result, SqliteStore, encode::encode_dt};

const RIGHT_COUNT: i64 = 200;

const CATEGORIES: [&str; 6] = [
  "User Management",
  "System Administration",
  "Reports",
  "Workstation Management",
  "Security",
  "Data Access",
];

const TYPES: [&str; 5] = ["Read", "Write", "Delete", "Execute", "Admin"];

/// `(name, description, age in days, number of rights granted)`
const ROLES: [(&str, &str, i64, usize); 5] = [
  ("Administrator", "Full system access", 30, 200),
  ("Manager", "Management level access", 25, 150),
  ("Employee", "Basic employee access", 20, 50),
  ("HR Manager", "Human Resources management", 15, 100),
  ("IT Support", "IT support and maintenance", 10, 75),
];

/// `(first, last, department, position, age in days, role id)`
const EMPLOYEES: [(&str, &str, &str, &str, i64, i64); 5] = [
  ("John", "Doe", "IT", "System Administrator", 30, 1),
  ("Jane", "Smith", "HR", "HR Manager", 25, 4),
  ("Bob", "Johnson", "Finance", "Financial Analyst", 20, 3),
  ("Alice", "Brown", "IT", "Developer", 15, 5),
  ("Charlie", "Wilson", "Operations", "Operations Manager", 10, 2),
];

/// Rows written by [`SqliteStore::seed_demo_data`]. All zero when the store
/// already held employees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
  pub rights:      usize,
  pub roles:       usize,
  pub employees:   usize,
  pub role_rights: usize,
}

/// The rights granted to seeded role `role_id`: ids ordered by a per-role
/// stride permutation, first `count` taken. 37 is coprime with 200, so the
/// permutation visits every id once.
fn granted_rights(role_id: i64, count: usize) -> Vec<i64> {
  let mut ids: Vec<i64> = (1..=RIGHT_COUNT).collect();
  ids.sort_by_key(|id| (id * 37 + role_id * 11) % RIGHT_COUNT);
  ids.truncate(count);
  ids.sort_unstable();
  ids
}

impl SqliteStore {
  /// Populate an empty store with the demo data set. Does nothing if any
  /// employee row exists.
  pub async fn seed_demo_data(&self) -> Result<SeedSummary> {
    let now = Utc::now();
    let ago = move |days: i64| encode_dt(now - Duration::days(days));

    let summary = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM employees", [], |r| r.get(0))?;
        if existing > 0 {
          return Ok(SeedSummary::default());
        }

        let mut summary = SeedSummary::default();

        for id in 1..=RIGHT_COUNT {
          let i = id as usize;
          tx.execute(
            "INSERT INTO rights (id, name, description, category, right_type, is_active, created_date)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
            params![
              id,
              format!("Right_{id:03}"),
              format!("Description for Right {id}"),
              CATEGORIES[i % CATEGORIES.len()],
              TYPES[i % TYPES.len()],
              ago(id),
            ],
          )?;
          summary.rights += 1;
        }

        for (role_id, (name, description, age, count)) in (1_i64..).zip(ROLES) {
          tx.execute(
            "INSERT INTO roles (id, name, description, is_active, created_date)
             VALUES (?1, ?2, ?3, 1, ?4)",
            params![role_id, name, description, ago(age)],
          )?;
          summary.roles += 1;

          for right_id in granted_rights(role_id, count) {
            tx.execute(
              "INSERT INTO role_rights (role_id, right_id, assigned_date, is_active)
               VALUES (?1, ?2, ?3, 1)",
              params![role_id, right_id, ago((right_id + role_id * 7) % 29 + 1)],
            )?;
            summary.role_rights += 1;
          }
        }

        for (employee_id, (first, last, department, position, age, role_id)) in
          (1_i64..).zip(EMPLOYEES)
        {
          tx.execute(
            "INSERT INTO employees (id, first_name, last_name, email, department, position, is_active, created_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
            params![
              employee_id,
              first,
              last,
              format!("{}.{}@company.com", first.to_lowercase(), last.to_lowercase()),
              department,
              position,
              ago(age),
            ],
          )?;
          tx.execute(
            "INSERT INTO employee_roles (employee_id, role_id, assigned_date, is_active)
             VALUES (?1, ?2, ?3, 1)",
            params![employee_id, role_id, ago(age)],
          )?;
          summary.employees += 1;
        }

        tx.commit()?;
        Ok(summary)
      })
      .await?;

    if summary.employees > 0 {
      info!(
        rights = summary.rights,
        roles = summary.roles,
        employees = summary.employees,
        role_rights = summary.role_rights,
        "seeded demo data",
      );
    } else {
      info!("store already populated; skipping seed");
    }
    Ok(summary)
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;

  #[test]
  fn grant_selection_is_distinct_and_sized() {
    for (role_id, (_, _, _, count)) in (1_i64..).zip(ROLES) {
      let ids = granted_rights(role_id, count);
      assert_eq!(ids.len(), count);
      assert_eq!(ids.iter().collect::<BTreeSet<_>>().len(), count);
      assert!(ids.iter().all(|id| (1..=RIGHT_COUNT).contains(id)));
    }
  }

  #[test]
  fn administrator_gets_everything() {
    assert_eq!(granted_rights(1, 200), (1..=RIGHT_COUNT).collect::<Vec<_>>());
  }
}
