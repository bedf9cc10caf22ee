//! Applies [`roster_core::assignment::plan`] to one of the two link tables.
//!
//! Every reconciliation runs in a single `BEGIN IMMEDIATE` transaction. Any
//! early return drops the transaction, which rolls it back, so callers never
//! observe a partially applied plan.

use std::collections::BTreeSet;

use roster_core::{
  Error as CoreError, TargetKind,
  assignment::{LinkState, ReconcileOutcome, plan},
};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior, params};
use tracing::debug;

use crate::encode::id_array;

/// Names and error constructors of one link table.
pub struct LinkTable {
  pub table:          &'static str,
  pub parent_table:   &'static str,
  pub parent_column:  &'static str,
  pub target_table:   &'static str,
  pub target_column:  &'static str,
  pub parent_missing: fn(i64) -> CoreError,
  pub target_kind:    TargetKind,
}

pub static EMPLOYEE_ROLES: LinkTable = LinkTable {
  table:          "employee_roles",
  parent_table:   "employees",
  parent_column:  "employee_id",
  target_table:   "roles",
  target_column:  "role_id",
  parent_missing: CoreError::EmployeeNotFound,
  target_kind:    TargetKind::Role,
};

pub static ROLE_RIGHTS: LinkTable = LinkTable {
  table:          "role_rights",
  parent_table:   "roles",
  parent_column:  "role_id",
  target_table:   "rights",
  target_column:  "right_id",
  parent_missing: CoreError::RoleNotFound,
  target_kind:    TargetKind::Right,
};

/// Make the active targets of `parent_id` in `link` exactly `desired`.
///
/// The outer `Result` carries database failures; the inner one carries
/// domain rejections (missing parent, unknown targets), for which nothing is
/// written.
pub fn reconcile(
  conn:      &mut Connection,
  link:      &LinkTable,
  parent_id: i64,
  desired:   &[i64],
  now:       &str,
) -> rusqlite::Result<Result<ReconcileOutcome, CoreError>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let parent_active: Option<bool> = tx
    .query_row(
      &format!("SELECT is_active FROM {} WHERE id = ?1", link.parent_table),
      params![parent_id],
      |r| r.get(0),
    )
    .optional()?;
  if parent_active != Some(true) {
    return Ok(Err((link.parent_missing)(parent_id)));
  }

  let desired: Vec<i64> = desired.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();

  if !desired.is_empty() {
    let known: BTreeSet<i64> = {
      let mut stmt = tx.prepare(&format!(
        "SELECT id FROM {} WHERE is_active = 1 AND id IN (SELECT value FROM json_each(?1))",
        link.target_table,
      ))?;
      stmt
        .query_map(params![id_array(&desired)], |r| r.get(0))?
        .collect::<rusqlite::Result<_>>()?
    };
    let unknown: Vec<i64> = desired.iter().copied().filter(|id| !known.contains(id)).collect();
    if !unknown.is_empty() {
      return Ok(Err(CoreError::UnknownTargets { kind: link.target_kind, ids: unknown }));
    }
  }

  let existing: Vec<LinkState> = {
    let mut stmt = tx.prepare(&format!(
      "SELECT {}, is_active FROM {} WHERE {} = ?1",
      link.target_column, link.table, link.parent_column,
    ))?;
    stmt
      .query_map(params![parent_id], |r| {
        Ok(LinkState { target_id: r.get(0)?, is_active: r.get(1)? })
      })?
      .collect::<rusqlite::Result<_>>()?
  };

  let plan = plan(&existing, &desired);

  let revoke_sql = format!(
    "UPDATE {} SET is_active = 0 WHERE {} = ?1 AND {} = ?2",
    link.table, link.parent_column, link.target_column,
  );
  for id in &plan.revoke {
    tx.execute(&revoke_sql, params![parent_id, id])?;
  }

  let regrant_sql = format!(
    "UPDATE {} SET is_active = 1, assigned_date = ?3 WHERE {} = ?1 AND {} = ?2",
    link.table, link.parent_column, link.target_column,
  );
  for id in &plan.regrant {
    tx.execute(&regrant_sql, params![parent_id, id, now])?;
  }

  let insert_sql = format!(
    "INSERT INTO {} ({}, {}, assigned_date, is_active) VALUES (?1, ?2, ?3, 1)",
    link.table, link.parent_column, link.target_column,
  );
  for id in &plan.insert {
    tx.execute(&insert_sql, params![parent_id, id, now])?;
  }

  tx.commit()?;

  let outcome = plan.outcome();
  debug!(
    table = link.table,
    parent_id,
    revoked = outcome.revoked,
    regranted = outcome.regranted,
    inserted = outcome.inserted,
    unchanged = outcome.unchanged,
    "reconciled links",
  );
  Ok(Ok(outcome))
}
