//! Link rows and the reconciliation planner.
//!
//! A link row (employee→role or role→right) is created once per pair and
//! never deleted. Revocation flips `is_active` off; re-assignment flips it
//! back on with a fresh `assigned_date`, so the row keeps its identity.
//!
//! [`plan`] computes the minimal set of row changes that transitions the
//! current link rows of one parent to a desired target set. Backends apply
//! the plan inside a single transaction.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Link rows ───────────────────────────────────────────────────────────────

/// "This employee currently/previously held this role."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRole {
  pub employee_id:   i64,
  pub role_id:       i64,
  pub assigned_date: DateTime<Utc>,
  pub is_active:     bool,
}

/// "This role currently/previously grants this right."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRight {
  pub role_id:       i64,
  pub right_id:      i64,
  pub assigned_date: DateTime<Utc>,
  pub is_active:     bool,
}

/// The part of a link row the planner looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkState {
  pub target_id: i64,
  pub is_active: bool,
}

impl From<&EmployeeRole> for LinkState {
  fn from(l: &EmployeeRole) -> Self { Self { target_id: l.role_id, is_active: l.is_active } }
}

impl From<&RoleRight> for LinkState {
  fn from(l: &RoleRight) -> Self { Self { target_id: l.right_id, is_active: l.is_active } }
}

// ─── Plan ────────────────────────────────────────────────────────────────────

/// Row changes needed to reconcile one parent. Every list is sorted
/// ascending and the four lists are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
  /// Active rows whose target is no longer desired: set inactive.
  pub revoke:    Vec<i64>,
  /// Inactive rows whose target is desired again: set active, refresh
  /// `assigned_date`.
  pub regrant:   Vec<i64>,
  /// Desired targets with no row yet: insert active.
  pub insert:    Vec<i64>,
  /// Active rows that stay active; left untouched so their `assigned_date`
  /// survives.
  pub unchanged: Vec<i64>,
}

impl ReconcilePlan {
  /// `true` when applying the plan would not write anything.
  pub fn is_noop(&self) -> bool {
    self.revoke.is_empty() && self.regrant.is_empty() && self.insert.is_empty()
  }

  pub fn outcome(&self) -> ReconcileOutcome {
    ReconcileOutcome {
      revoked:   self.revoke.len(),
      regranted: self.regrant.len(),
      inserted:  self.insert.len(),
      unchanged: self.unchanged.len(),
    }
  }
}

/// Counts reported back to the caller after a successful reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
  pub revoked:   usize,
  pub regranted: usize,
  pub inserted:  usize,
  pub unchanged: usize,
}

/// Compute the row changes that make the active targets of `existing` equal
/// to the de-duplicated `desired` set.
///
/// `existing` must hold every link row of one parent, active or not. Duplicate
/// ids in `desired` are collapsed.
pub fn plan(existing: &[LinkState], desired: &[i64]) -> ReconcilePlan {
  let desired: BTreeSet<i64> = desired.iter().copied().collect();
  let current: BTreeMap<i64, bool> =
    existing.iter().map(|l| (l.target_id, l.is_active)).collect();

  let mut plan = ReconcilePlan::default();

  for (&target, &active) in &current {
    match (active, desired.contains(&target)) {
      (true, false) => plan.revoke.push(target),
      (true, true) => plan.unchanged.push(target),
      (false, true) => plan.regrant.push(target),
      (false, false) => {}
    }
  }

  plan.insert = desired
    .into_iter()
    .filter(|id| !current.contains_key(id))
    .collect();

  plan
}

/// Apply `plan` to an in-memory set of link states; returns the resulting
/// active targets. Used to check a plan without a backend.
pub fn active_after(existing: &[LinkState], plan: &ReconcilePlan) -> BTreeSet<i64> {
  let mut active: BTreeSet<i64> = existing
    .iter()
    .filter(|l| l.is_active)
    .map(|l| l.target_id)
    .collect();
  for id in &plan.revoke {
    active.remove(id);
  }
  active.extend(plan.regrant.iter().chain(&plan.insert).copied());
  active
}

#[cfg(test)]
mod tests {
  use super::*;

  fn link(target_id: i64, is_active: bool) -> LinkState { LinkState { target_id, is_active } }

  #[test]
  fn revokes_keeps_and_inserts() {
    // Role currently grants {20, 40}; desired {10, 20, 30}.
    let existing = [link(20, true), link(40, true)];
    let p = plan(&existing, &[10, 20, 30]);

    assert_eq!(p.revoke, [40]);
    assert_eq!(p.unchanged, [20]);
    assert_eq!(p.insert, [10, 30]);
    assert!(p.regrant.is_empty());
    assert_eq!(active_after(&existing, &p), BTreeSet::from([10, 20, 30]));
  }

  #[test]
  fn inactive_rows_are_regranted_not_reinserted() {
    let existing = [link(5, false), link(6, true)];
    let p = plan(&existing, &[5]);

    assert_eq!(p.regrant, [5]);
    assert_eq!(p.revoke, [6]);
    assert!(p.insert.is_empty());
  }

  #[test]
  fn duplicates_in_desired_collapse() {
    let p = plan(&[], &[3, 3, 1, 3]);
    assert_eq!(p.insert, [1, 3]);
  }

  #[test]
  fn empty_desired_revokes_everything_active() {
    let existing = [link(1, true), link(2, false), link(3, true)];
    let p = plan(&existing, &[]);
    assert_eq!(p.revoke, [1, 3]);
    assert!(active_after(&existing, &p).is_empty());
  }

  #[test]
  fn second_run_is_a_noop() {
    let existing = [link(1, true), link(2, false), link(4, true)];
    let desired = [2, 3, 4, 3];

    let first = plan(&existing, &desired);
    let after: Vec<LinkState> = {
      let active = active_after(&existing, &first);
      let mut rows: BTreeMap<i64, bool> =
        existing.iter().map(|l| (l.target_id, l.is_active)).collect();
      for id in first.insert.iter().copied() {
        rows.insert(id, true);
      }
      rows
        .into_keys()
        .map(|id| link(id, active.contains(&id)))
        .collect()
    };

    let second = plan(&after, &desired);
    assert!(second.is_noop());
    assert_eq!(second.outcome().unchanged, 3);
  }

  #[test]
  fn active_set_always_matches_desired() {
    let existing = [link(1, true), link(2, false), link(3, true), link(9, false)];
    let cases: [&[i64]; 5] = [&[], &[1], &[2, 9], &[1, 2, 3, 4, 9], &[7, 7, 8]];
    for desired in cases {
      let p = plan(&existing, desired);
      let expected: BTreeSet<i64> = desired.iter().copied().collect();
      assert_eq!(active_after(&existing, &p), expected, "desired {desired:?}");
    }
  }
}
