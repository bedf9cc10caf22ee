//! [`SqliteStore`] — the SQLite implementation of [`RosterStore`].

use std::{collections::BTreeMap, path::Path};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter, types::Value};

use roster_core::{
  Error as CoreError,
  assignment::{EmployeeRole, ReconcileOutcome, RoleRight},
  effective::{EffectiveRights, GrantedRight, aggregate, group_by_role},
  employee::{
    Employee, EmployeeDetails, EmployeeInput, EmployeeListItem, EmployeeQuery, EmployeeWithRoles,
  },
  right::{Right, RightInput, RightQuery},
  role::{Role, RoleDetails, RoleInput, RoleListItem, RoleSummary},
  store::RosterStore,
  validate::Validate,
};

use crate::{
  Error, Result,
  encode::{
    EMPLOYEE_COLUMNS, RIGHT_COLUMNS, ROLE_COLUMNS, RawEmployee, RawGrant, RawHeldRole, RawLink,
    RawRight, RawRole, encode_dt, id_array, like_pattern,
  },
  reconcile::{EMPLOYEE_ROLES, LinkTable, ROLE_RIGHTS, reconcile},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Roster store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run arbitrary SQL; tests use it to install failure triggers.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn links(&self, link: &'static LinkTable, parent_id: i64) -> Result<Vec<RawLink>> {
    let sql = format!(
      "SELECT {parent}, {target}, assigned_date, is_active FROM {table}
       WHERE {parent} = ?1 ORDER BY {target}",
      parent = link.parent_column,
      target = link.target_column,
      table = link.table,
    );
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params![parent_id], RawLink::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(raws)
  }
}

fn validated<T: Validate>(input: T) -> Result<T> {
  input.validated().map_err(|e| Error::Core(e.into()))
}

// ─── Query helpers ───────────────────────────────────────────────────────────
//
// Plain functions over a borrowed connection so several of them can share one
// `conn.call` closure (and one transaction).

fn select_employee(conn: &Connection, id: i64, active_only: bool) -> rusqlite::Result<Option<RawEmployee>> {
  let filter = if active_only { "AND e.is_active = 1" } else { "" };
  conn
    .query_row(
      &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees e WHERE e.id = ?1 {filter}"),
      params![id],
      |row| RawEmployee::from_row(row, 0),
    )
    .optional()
}

fn select_role(conn: &Connection, id: i64) -> rusqlite::Result<Option<RawRole>> {
  conn
    .query_row(
      &format!("SELECT {ROLE_COLUMNS} FROM roles r WHERE r.id = ?1"),
      params![id],
      |row| RawRole::from_row(row, 0),
    )
    .optional()
}

fn select_right(conn: &Connection, id: i64) -> rusqlite::Result<Option<RawRight>> {
  conn
    .query_row(
      &format!("SELECT {RIGHT_COLUMNS} FROM rights g WHERE g.id = ?1"),
      params![id],
      |row| RawRight::from_row(row, 0),
    )
    .optional()
}

/// Roles held by `employee_id` through active links. With `strict`, the role
/// itself must be active too.
fn held_roles(conn: &Connection, employee_id: i64, strict: bool) -> rusqlite::Result<Vec<RawHeldRole>> {
  let filter = if strict { "AND r.is_active = 1" } else { "" };
  let mut stmt = conn.prepare(&format!(
    "SELECT {ROLE_COLUMNS}, er.assigned_date
     FROM employee_roles er
     JOIN roles r ON r.id = er.role_id
     WHERE er.employee_id = ?1 AND er.is_active = 1 {filter}
     ORDER BY r.id"
  ))?;
  let rows = stmt.query_map(params![employee_id], RawHeldRole::from_row)?.collect();
  rows
}

/// Rights granted by `role_ids` through active links. With `strict`, the
/// right itself must be active too.
fn grants(conn: &Connection, role_ids: &[i64], strict: bool) -> rusqlite::Result<Vec<RawGrant>> {
  if role_ids.is_empty() {
    return Ok(Vec::new());
  }
  let filter = if strict { "AND g.is_active = 1" } else { "" };
  let mut stmt = conn.prepare(&format!(
    "SELECT rr.role_id, {RIGHT_COLUMNS}, rr.assigned_date
     FROM role_rights rr
     JOIN rights g ON g.id = rr.right_id
     WHERE rr.is_active = 1 {filter} AND rr.role_id IN (SELECT value FROM json_each(?1))
     ORDER BY rr.role_id, g.id"
  ))?;
  let rows = stmt.query_map(params![id_array(role_ids)], RawGrant::from_row)?.collect();
  rows
}

/// `(employee_id, role)` for every active employee→role link of `employee_ids`.
fn roles_of(conn: &Connection, employee_ids: &[i64]) -> rusqlite::Result<Vec<(i64, RawRole)>> {
  if employee_ids.is_empty() {
    return Ok(Vec::new());
  }
  let mut stmt = conn.prepare(&format!(
    "SELECT er.employee_id, {ROLE_COLUMNS}
     FROM employee_roles er
     JOIN roles r ON r.id = er.role_id
     WHERE er.is_active = 1 AND er.employee_id IN (SELECT value FROM json_each(?1))
     ORDER BY er.employee_id, r.id"
  ))?;
  let rows = stmt
    .query_map(params![id_array(employee_ids)], |row| {
      Ok((row.get(0)?, RawRole::from_row(row, 1)?))
    })?
    .collect();
  rows
}

// ─── RosterStore impl ────────────────────────────────────────────────────────

impl RosterStore for SqliteStore {
  type Error = Error;

  // ── Employees ─────────────────────────────────────────────────────────────

  async fn list_employees(&self) -> Result<Vec<EmployeeListItem>> {
    let raws: Vec<(RawEmployee, u32)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EMPLOYEE_COLUMNS},
             (SELECT COUNT(*) FROM employee_roles er
              WHERE er.employee_id = e.id AND er.is_active = 1)
           FROM employees e
           WHERE e.is_active = 1
           ORDER BY e.id"
        ))?;
        let rows = stmt
          .query_map([], |row| Ok((RawEmployee::from_row(row, 0)?, row.get(8)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(raw, roles_count)| {
        let employee = raw.into_employee()?;
        Ok(EmployeeListItem { full_name: employee.full_name(), employee, roles_count })
      })
      .collect()
  }

  async fn get_employee(&self, id: i64) -> Result<Option<Employee>> {
    let raw = self
      .conn
      .call(move |conn| Ok(select_employee(conn, id, false)?))
      .await?;
    raw.map(RawEmployee::into_employee).transpose()
  }

  async fn employee_details(&self, id: i64) -> Result<Option<EmployeeDetails>> {
    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(employee) = select_employee(&tx, id, false)? else {
          return Ok(None);
        };
        let held = held_roles(&tx, id, false)?;
        let role_ids: Vec<i64> = held.iter().map(|h| h.role.id).collect();
        let grants = grants(&tx, &role_ids, false)?;
        Ok(Some((employee, held, grants)))
      })
      .await?;

    let Some((employee, held, grants)) = raw else {
      return Ok(None);
    };
    let employee = employee.into_employee()?;
    let held = held.into_iter().map(RawHeldRole::into_held).collect::<Result<Vec<_>>>()?;
    let grants = grants.into_iter().map(RawGrant::into_grant).collect::<Result<Vec<_>>>()?;

    Ok(Some(EmployeeDetails {
      full_name: employee.full_name(),
      roles: group_by_role(&held, &grants),
      employee,
    }))
  }

  async fn create_employee(&self, input: EmployeeInput) -> Result<Employee> {
    let input = validated(input)?;
    let created_date = Utc::now();
    let at_str = encode_dt(created_date);

    let (id, input) = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO employees (first_name, last_name, email, department, position, is_active, created_date)
           VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
          params![
            input.first_name,
            input.last_name,
            input.email,
            input.department,
            input.position,
            at_str,
          ],
        )?;
        Ok((conn.last_insert_rowid(), input))
      })
      .await?;

    Ok(Employee {
      id,
      first_name: input.first_name,
      last_name: input.last_name,
      email: input.email,
      department: input.department,
      position: input.position,
      is_active: true,
      created_date,
    })
  }

  async fn update_employee(&self, id: i64, input: EmployeeInput) -> Result<Employee> {
    let input = validated(input)?;

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE employees
           SET first_name = ?2, last_name = ?3, email = ?4, department = ?5, position = ?6
           WHERE id = ?1",
          params![
            id,
            input.first_name,
            input.last_name,
            input.email,
            input.department,
            input.position,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(Some(select_employee(conn, id, false)?))
      })
      .await?;

    match raw {
      None => Err(CoreError::EmployeeNotFound(id).into()),
      Some(None) => Err(Error::Vanished(id)),
      Some(Some(raw)) => raw.into_employee(),
    }
  }

  async fn delete_employee(&self, id: i64) -> Result<()> {
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute("UPDATE employees SET is_active = 0 WHERE id = ?1", params![id])?))
      .await?;
    if changed == 0 {
      return Err(CoreError::EmployeeNotFound(id).into());
    }
    Ok(())
  }

  async fn search_employees<'a>(&'a self, query: &'a EmployeeQuery) -> Result<Vec<EmployeeWithRoles>> {
    let mut conds: Vec<String> = vec!["e.is_active = 1".to_owned()];
    let mut values: Vec<Value> = Vec::new();

    if let Some(name) = query.name.as_deref().filter(|s| !s.is_empty()) {
      conds.push(
        r"(e.first_name LIKE ? ESCAPE '\'
           OR e.last_name LIKE ? ESCAPE '\'
           OR (e.first_name || ' ' || e.last_name) LIKE ? ESCAPE '\')"
          .to_owned(),
      );
      let pattern = like_pattern(name);
      values.extend(std::iter::repeat_n(Value::Text(pattern), 3));
    }
    if let Some(role) = query.role.as_deref().filter(|s| !s.is_empty()) {
      conds.push(
        r"EXISTS (SELECT 1 FROM employee_roles er
                  JOIN roles r ON r.id = er.role_id
                  WHERE er.employee_id = e.id AND er.is_active = 1
                    AND r.name LIKE ? ESCAPE '\')"
          .to_owned(),
      );
      values.push(Value::Text(like_pattern(role)));
    }
    if let Some(right) = query.right.as_deref().filter(|s| !s.is_empty()) {
      conds.push(
        r"EXISTS (SELECT 1 FROM employee_roles er
                  JOIN role_rights rr ON rr.role_id = er.role_id AND rr.is_active = 1
                  JOIN rights g ON g.id = rr.right_id
                  WHERE er.employee_id = e.id AND er.is_active = 1
                    AND g.name LIKE ? ESCAPE '\')"
          .to_owned(),
      );
      values.push(Value::Text(like_pattern(right)));
    }
    if !query.role_ids.is_empty() {
      conds.push(
        "EXISTS (SELECT 1 FROM employee_roles er
                 WHERE er.employee_id = e.id AND er.is_active = 1
                   AND er.role_id IN (SELECT value FROM json_each(?)))"
          .to_owned(),
      );
      values.push(Value::Text(id_array(&query.role_ids)));
    }

    let sql = format!(
      "SELECT {EMPLOYEE_COLUMNS} FROM employees e WHERE {} ORDER BY e.id",
      conds.join(" AND "),
    );

    let (employees, roles) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let employees = {
          let mut stmt = tx.prepare(&sql)?;
          stmt
            .query_map(params_from_iter(values.iter()), |row| RawEmployee::from_row(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        let ids: Vec<i64> = employees.iter().map(|e| e.id).collect();
        let roles = roles_of(&tx, &ids)?;
        Ok((employees, roles))
      })
      .await?;

    let mut by_employee: BTreeMap<i64, Vec<RoleSummary>> = BTreeMap::new();
    for (employee_id, raw) in roles {
      let role = raw.into_role()?;
      by_employee.entry(employee_id).or_default().push(RoleSummary::from(&role));
    }

    employees
      .into_iter()
      .map(|raw| {
        let employee = raw.into_employee()?;
        Ok(EmployeeWithRoles {
          full_name: employee.full_name(),
          roles: by_employee.remove(&employee.id).unwrap_or_default(),
          employee,
        })
      })
      .collect()
  }

  async fn employee_roles(&self, employee_id: i64) -> Result<Vec<EmployeeRole>> {
    self
      .links(&EMPLOYEE_ROLES, employee_id)
      .await?
      .into_iter()
      .map(RawLink::into_employee_role)
      .collect()
  }

  async fn assign_roles(&self, employee_id: i64, role_ids: Vec<i64>) -> Result<ReconcileOutcome> {
    let now = encode_dt(Utc::now());
    let outcome = self
      .conn
      .call(move |conn| Ok(reconcile(conn, &EMPLOYEE_ROLES, employee_id, &role_ids, &now)?))
      .await?;
    Ok(outcome?)
  }

  // ── Roles ─────────────────────────────────────────────────────────────────

  async fn list_roles(&self) -> Result<Vec<RoleListItem>> {
    let raws: Vec<(RawRole, u32)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ROLE_COLUMNS},
             (SELECT COUNT(*) FROM role_rights rr
              WHERE rr.role_id = r.id AND rr.is_active = 1)
           FROM roles r
           WHERE r.is_active = 1
           ORDER BY r.id"
        ))?;
        let rows = stmt
          .query_map([], |row| Ok((RawRole::from_row(row, 0)?, row.get(5)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(raw, rights_count)| Ok(RoleListItem { role: raw.into_role()?, rights_count }))
      .collect()
  }

  async fn get_role(&self, id: i64) -> Result<Option<Role>> {
    let raw = self.conn.call(move |conn| Ok(select_role(conn, id)?)).await?;
    raw.map(RawRole::into_role).transpose()
  }

  async fn role_details(&self, id: i64) -> Result<Option<RoleDetails>> {
    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(role) = select_role(&tx, id)? else {
          return Ok(None);
        };
        let grants = grants(&tx, &[id], false)?;
        Ok(Some((role, grants)))
      })
      .await?;

    let Some((role, grants)) = raw else {
      return Ok(None);
    };
    let rights = grants
      .into_iter()
      .map(|g| Ok(GrantedRight::from(&g.into_grant()?)))
      .collect::<Result<Vec<_>>>()?;

    Ok(Some(RoleDetails { role: role.into_role()?, rights }))
  }

  async fn create_role(&self, input: RoleInput) -> Result<Role> {
    let input = validated(input)?;
    let created_date = Utc::now();
    let at_str = encode_dt(created_date);

    let (id, input) = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO roles (name, description, is_active, created_date) VALUES (?1, ?2, 1, ?3)",
          params![input.name, input.description, at_str],
        )?;
        Ok((conn.last_insert_rowid(), input))
      })
      .await?;

    Ok(Role {
      id,
      name: input.name,
      description: input.description,
      is_active: true,
      created_date,
    })
  }

  async fn update_role(&self, id: i64, input: RoleInput) -> Result<Role> {
    let input = validated(input)?;

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE roles SET name = ?2, description = ?3 WHERE id = ?1",
          params![id, input.name, input.description],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(Some(select_role(conn, id)?))
      })
      .await?;

    match raw {
      None => Err(CoreError::RoleNotFound(id).into()),
      Some(None) => Err(Error::Vanished(id)),
      Some(Some(raw)) => raw.into_role(),
    }
  }

  async fn delete_role(&self, id: i64) -> Result<()> {
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute("UPDATE roles SET is_active = 0 WHERE id = ?1", params![id])?))
      .await?;
    if changed == 0 {
      return Err(CoreError::RoleNotFound(id).into());
    }
    Ok(())
  }

  async fn role_rights(&self, role_id: i64) -> Result<Vec<RoleRight>> {
    self
      .links(&ROLE_RIGHTS, role_id)
      .await?
      .into_iter()
      .map(RawLink::into_role_right)
      .collect()
  }

  async fn assign_rights(&self, role_id: i64, right_ids: Vec<i64>) -> Result<ReconcileOutcome> {
    let now = encode_dt(Utc::now());
    let outcome = self
      .conn
      .call(move |conn| Ok(reconcile(conn, &ROLE_RIGHTS, role_id, &right_ids, &now)?))
      .await?;
    Ok(outcome?)
  }

  // ── Rights ────────────────────────────────────────────────────────────────

  async fn search_rights<'a>(&'a self, query: &'a RightQuery) -> Result<Vec<Right>> {
    let mut conds: Vec<&'static str> = vec!["g.is_active = 1"];
    let mut values: Vec<Value> = Vec::new();

    let filters = [
      (&query.name, r"g.name LIKE ? ESCAPE '\'"),
      (&query.category, r"g.category LIKE ? ESCAPE '\'"),
      (&query.right_type, r"g.right_type LIKE ? ESCAPE '\'"),
    ];
    for (filter, cond) in filters {
      if let Some(needle) = filter.as_deref().filter(|s| !s.is_empty()) {
        conds.push(cond);
        values.push(Value::Text(like_pattern(needle)));
      }
    }

    let sql = format!(
      "SELECT {RIGHT_COLUMNS} FROM rights g WHERE {} ORDER BY g.category, g.name",
      conds.join(" AND "),
    );

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(values.iter()), |row| RawRight::from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRight::into_right).collect()
  }

  async fn get_right(&self, id: i64) -> Result<Option<Right>> {
    let raw = self.conn.call(move |conn| Ok(select_right(conn, id)?)).await?;
    raw.map(RawRight::into_right).transpose()
  }

  async fn create_right(&self, input: RightInput) -> Result<Right> {
    let input = validated(input)?;
    let created_date = Utc::now();
    let at_str = encode_dt(created_date);

    let (id, input) = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO rights (name, description, category, right_type, is_active, created_date)
           VALUES (?1, ?2, ?3, ?4, 1, ?5)",
          params![input.name, input.description, input.category, input.right_type, at_str],
        )?;
        Ok((conn.last_insert_rowid(), input))
      })
      .await?;

    Ok(Right {
      id,
      name: input.name,
      description: input.description,
      category: input.category,
      right_type: input.right_type,
      is_active: true,
      created_date,
    })
  }

  async fn update_right(&self, id: i64, input: RightInput) -> Result<Right> {
    let input = validated(input)?;

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE rights SET name = ?2, description = ?3, category = ?4, right_type = ?5 WHERE id = ?1",
          params![id, input.name, input.description, input.category, input.right_type],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(Some(select_right(conn, id)?))
      })
      .await?;

    match raw {
      None => Err(CoreError::RightNotFound(id).into()),
      Some(None) => Err(Error::Vanished(id)),
      Some(Some(raw)) => raw.into_right(),
    }
  }

  async fn delete_right(&self, id: i64) -> Result<()> {
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute("UPDATE rights SET is_active = 0 WHERE id = ?1", params![id])?))
      .await?;
    if changed == 0 {
      return Err(CoreError::RightNotFound(id).into());
    }
    Ok(())
  }

  // ── Aggregates ────────────────────────────────────────────────────────────

  async fn effective_rights(&self, employee_id: i64) -> Result<Option<EffectiveRights>> {
    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(employee) = select_employee(&tx, employee_id, true)? else {
          return Ok(None);
        };
        let held = held_roles(&tx, employee_id, true)?;
        let role_ids: Vec<i64> = held.iter().map(|h| h.role.id).collect();
        let grants = grants(&tx, &role_ids, true)?;
        Ok(Some((employee, held, grants)))
      })
      .await?;

    let Some((employee, held, grants)) = raw else {
      return Ok(None);
    };
    let employee = employee.into_employee()?;
    let held = held.into_iter().map(RawHeldRole::into_held).collect::<Result<Vec<_>>>()?;
    let grants = grants.into_iter().map(RawGrant::into_grant).collect::<Result<Vec<_>>>()?;

    Ok(Some(aggregate(&employee, &held, &grants)))
  }

  async fn first_employee_holding(&self, role_ids: Vec<i64>) -> Result<Option<i64>> {
    if role_ids.is_empty() {
      return Ok(None);
    }
    let id = self
      .conn
      .call(move |conn| {
        let sql = "SELECT MIN(e.id)
           FROM employees e
           JOIN employee_roles er ON er.employee_id = e.id AND er.is_active = 1
           JOIN roles r ON r.id = er.role_id AND r.is_active = 1
           WHERE e.is_active = 1 AND er.role_id IN (SELECT value FROM json_each(?1))";
        let id: Option<i64> = conn.query_row(sql, params![id_array(&role_ids)], |r| r.get(0))?;
        Ok(id)
      })
      .await?;
    Ok(id)
  }
}
