//! Effective rights — what an employee may do through the roles it holds.
//!
//! Backends fetch two flat row sets (held roles and the grants of exactly
//! those roles, every hop already filtered on its active flag) and hand them
//! to [`aggregate`], which groups them per role and builds the de-duplicated
//! union.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  employee::{Employee, EmployeeSummary},
  policy::{CurrentEmployeePolicy, CurrentUser, resolve_current_employee},
  right::Right,
  store::RosterStore,
};

// ─── Input rows ──────────────────────────────────────────────────────────────

/// A role held by the employee, with the date of the holding link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldRole {
  pub role_id:       i64,
  pub name:          String,
  pub description:   String,
  pub assigned_date: DateTime<Utc>,
}

/// One role→right link joined to its right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
  pub role_id:       i64,
  pub right:         Right,
  pub assigned_date: DateTime<Utc>,
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A right as granted by one specific role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantedRight {
  pub id:            i64,
  pub name:          String,
  pub description:   String,
  pub category:      String,
  #[serde(rename = "type")]
  pub right_type:    String,
  pub assigned_date: DateTime<Utc>,
}

impl From<&Grant> for GrantedRight {
  fn from(g: &Grant) -> Self {
    Self {
      id:            g.right.id,
      name:          g.right.name.clone(),
      description:   g.right.description.clone(),
      category:      g.right.category.clone(),
      right_type:    g.right.right_type.clone(),
      assigned_date: g.assigned_date,
    }
  }
}

/// A held role and every right it grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleWithRights {
  pub id:            i64,
  pub name:          String,
  pub description:   String,
  pub assigned_date: DateTime<Utc>,
  pub rights:        Vec<GrantedRight>,
}

/// A right in the flattened union, with every role that contributes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveRight {
  pub id:            i64,
  pub name:          String,
  pub description:   String,
  pub category:      String,
  #[serde(rename = "type")]
  pub right_type:    String,
  /// Earliest grant among the contributing roles.
  pub assigned_date: DateTime<Utc>,
  /// Names of the contributing roles, in role-id order.
  pub granted_by:    Vec<String>,
}

/// The computed "my rights" view — never stored, always derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveRights {
  pub employee:   EmployeeSummary,
  pub roles:      Vec<RoleWithRights>,
  pub all_rights: Vec<EffectiveRight>,
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

/// Group `grants` under the roles in `held`, ordered by role id then right id.
///
/// Grants for roles not in `held` are ignored; a held role with no grants gets
/// an empty list.
pub fn group_by_role(held: &[HeldRole], grants: &[Grant]) -> Vec<RoleWithRights> {
  let mut by_role: BTreeMap<i64, Vec<&Grant>> = BTreeMap::new();
  for g in grants {
    by_role.entry(g.role_id).or_default().push(g);
  }

  let mut roles: Vec<&HeldRole> = held.iter().collect();
  roles.sort_by_key(|r| r.role_id);
  roles.dedup_by_key(|r| r.role_id);

  roles
    .into_iter()
    .map(|r| {
      let mut rights: Vec<GrantedRight> = by_role
        .get(&r.role_id)
        .map(|gs| gs.iter().map(|g| GrantedRight::from(*g)).collect())
        .unwrap_or_default();
      rights.sort_by_key(|g| g.id);
      rights.dedup_by_key(|g| g.id);
      RoleWithRights {
        id: r.role_id,
        name: r.name.clone(),
        description: r.description.clone(),
        assigned_date: r.assigned_date,
        rights,
      }
    })
    .collect()
}

/// Build the effective-rights view for `employee`.
///
/// The per-role view repeats a right once per granting role; `all_rights`
/// holds each right id exactly once.
pub fn aggregate(employee: &Employee, held: &[HeldRole], grants: &[Grant]) -> EffectiveRights {
  let roles = group_by_role(held, grants);

  let mut union: BTreeMap<i64, EffectiveRight> = BTreeMap::new();
  for role in &roles {
    for right in &role.rights {
      union
        .entry(right.id)
        .and_modify(|e| {
          e.assigned_date = e.assigned_date.min(right.assigned_date);
          e.granted_by.push(role.name.clone());
        })
        .or_insert_with(|| EffectiveRight {
          id:            right.id,
          name:          right.name.clone(),
          description:   right.description.clone(),
          category:      right.category.clone(),
          right_type:    right.right_type.clone(),
          assigned_date: right.assigned_date,
          granted_by:    vec![role.name.clone()],
        });
    }
  }

  EffectiveRights {
    employee: EmployeeSummary::from(employee),
    roles,
    all_rights: union.into_values().collect(),
  }
}

impl EffectiveRights {
  /// Ids of the flattened union, ascending.
  pub fn right_ids(&self) -> BTreeSet<i64> { self.all_rights.iter().map(|r| r.id).collect() }
}

/// The "my rights" view: resolve the current employee through `policy`, then
/// aggregate. `Ok(None)` when nobody can be resolved.
pub async fn my_rights<S, P>(
  store:  &S,
  user:   &CurrentUser,
  policy: &P,
) -> Result<Option<EffectiveRights>, S::Error>
where
  S: RosterStore,
  P: CurrentEmployeePolicy + ?Sized,
{
  match resolve_current_employee(store, user, policy).await? {
    Some(id) => store.effective_rights(id).await,
    None => Ok(None),
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at(day: u32) -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap() }

  fn employee() -> Employee {
    Employee {
      id:           1,
      first_name:   "John".into(),
      last_name:    "Doe".into(),
      email:        "john.doe@company.com".into(),
      department:   "IT".into(),
      position:     "System Administrator".into(),
      is_active:    true,
      created_date: at(1),
    }
  }

  fn held(role_id: i64, name: &str) -> HeldRole {
    HeldRole {
      role_id,
      name: name.into(),
      description: format!("{name} access"),
      assigned_date: at(2),
    }
  }

  fn grant(role_id: i64, right_id: i64, day: u32) -> Grant {
    Grant {
      role_id,
      right: Right {
        id:           right_id,
        name:         format!("Right_{right_id:03}"),
        description:  format!("Description for Right {right_id}"),
        category:     "Reports".into(),
        right_type:   "Read".into(),
        is_active:    true,
        created_date: at(1),
      },
      assigned_date: at(day),
    }
  }

  #[test]
  fn per_role_view_repeats_union_does_not() {
    let held = [held(1, "R1"), held(2, "R2")];
    let grants = [
      grant(1, 1, 3),
      grant(1, 2, 3),
      grant(1, 3, 5),
      grant(2, 3, 4),
      grant(2, 4, 4),
    ];

    let view = aggregate(&employee(), &held, &grants);

    let per_role: Vec<(i64, Vec<i64>)> = view
      .roles
      .iter()
      .map(|r| (r.id, r.rights.iter().map(|g| g.id).collect()))
      .collect();
    let expected: Vec<(i64, Vec<i64>)> = vec![(1, vec![1, 2, 3]), (2, vec![3, 4])];
    assert_eq!(per_role, expected);

    let flat: Vec<i64> = view.all_rights.iter().map(|r| r.id).collect();
    assert_eq!(flat, [1, 2, 3, 4]);

    let shared = &view.all_rights[2];
    assert_eq!(shared.granted_by, ["R1", "R2"]);
    assert_eq!(shared.assigned_date, at(4));
  }

  #[test]
  fn grants_for_unheld_roles_are_ignored() {
    let view = aggregate(&employee(), &[held(1, "R1")], &[grant(1, 1, 3), grant(9, 2, 3)]);
    assert_eq!(view.right_ids(), BTreeSet::from([1]));
  }

  #[test]
  fn role_without_grants_is_listed_empty() {
    let view = aggregate(&employee(), &[held(4, "HR Manager")], &[]);
    assert_eq!(view.roles.len(), 1);
    assert!(view.roles[0].rights.is_empty());
    assert!(view.all_rights.is_empty());
    assert_eq!(view.employee.full_name, "John Doe");
  }
}
