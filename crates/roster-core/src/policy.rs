//! Who is "me"? Current-user context and the current-employee policy.
//!
//! Authentication is outside this crate. Callers build a [`CurrentUser`] per
//! request and pass it explicitly, together with a [`CurrentEmployeePolicy`]
//! that maps the user onto an employee record.

use serde::{Deserialize, Serialize};

use crate::{role::Role, store::RosterStore};

/// The caller on whose behalf a request runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
  pub role_name: String,
  pub is_admin:  bool,
}

impl CurrentUser {
  /// `"Admin"` (any case) is an administrator; anything else is a regular
  /// user.
  pub fn from_role_name(role_name: impl Into<String>) -> Self {
    let role_name = role_name.into();
    let is_admin = role_name.eq_ignore_ascii_case("admin");
    Self { role_name, is_admin }
  }
}

/// Maps a [`CurrentUser`] onto an employee.
///
/// Resolution first tries [`preferred_employee`](Self::preferred_employee).
/// If that employee is missing or inactive, it falls back to the lowest-id
/// active employee holding at least one active role accepted by
/// [`accepts_role`](Self::accepts_role).
pub trait CurrentEmployeePolicy: Send + Sync {
  fn preferred_employee(&self, user: &CurrentUser) -> Option<i64>;

  /// The role-class predicate used by the fallback.
  fn accepts_role(&self, user: &CurrentUser, role: &Role) -> bool;
}

/// Stand-in policy for running without authentication: administrators map
/// to one configured employee, everybody else to another, with the
/// administrator role name deciding the fallback class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoUserPolicy {
  pub admin_employee_id: Option<i64>,
  pub user_employee_id:  Option<i64>,
  pub admin_role_name:   String,
}

impl Default for DemoUserPolicy {
  fn default() -> Self {
    Self {
      admin_employee_id: Some(1),
      user_employee_id:  Some(3),
      admin_role_name:   "Administrator".to_owned(),
    }
  }
}

impl CurrentEmployeePolicy for DemoUserPolicy {
  fn preferred_employee(&self, user: &CurrentUser) -> Option<i64> {
    if user.is_admin { self.admin_employee_id } else { self.user_employee_id }
  }

  fn accepts_role(&self, user: &CurrentUser, role: &Role) -> bool {
    (role.name == self.admin_role_name) == user.is_admin
  }
}

/// Resolve the employee id `user` stands for under `policy`.
///
/// `Ok(None)` when neither the preferred employee nor any fallback candidate
/// exists.
pub async fn resolve_current_employee<S, P>(
  store:  &S,
  user:   &CurrentUser,
  policy: &P,
) -> Result<Option<i64>, S::Error>
where
  S: RosterStore,
  P: CurrentEmployeePolicy + ?Sized,
{
  if let Some(id) = policy.preferred_employee(user)
    && let Some(employee) = store.get_employee(id).await?
    && employee.is_active
  {
    return Ok(Some(id));
  }

  let role_ids: Vec<i64> = store
    .list_roles()
    .await?
    .into_iter()
    .filter(|item| policy.accepts_role(user, &item.role))
    .map(|item| item.role.id)
    .collect();

  if role_ids.is_empty() {
    return Ok(None);
  }

  store.first_employee_holding(role_ids).await
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn role(id: i64, name: &str) -> Role {
    Role {
      id,
      name: name.into(),
      description: String::new(),
      is_active: true,
      created_date: Utc::now(),
    }
  }

  #[test]
  fn admin_is_case_insensitive() {
    assert!(CurrentUser::from_role_name("ADMIN").is_admin);
    assert!(CurrentUser::from_role_name("admin").is_admin);
    assert!(!CurrentUser::from_role_name("User").is_admin);
  }

  #[test]
  fn demo_policy_prefers_configured_ids() {
    let policy = DemoUserPolicy::default();
    assert_eq!(policy.preferred_employee(&CurrentUser::from_role_name("Admin")), Some(1));
    assert_eq!(policy.preferred_employee(&CurrentUser::from_role_name("User")), Some(3));
  }

  #[test]
  fn demo_policy_splits_roles_by_admin_class() {
    let policy = DemoUserPolicy::default();
    let admin = CurrentUser::from_role_name("Admin");
    let user = CurrentUser::from_role_name("User");
    let administrator = role(1, "Administrator");
    let manager = role(2, "Manager");

    assert!(policy.accepts_role(&admin, &administrator));
    assert!(!policy.accepts_role(&admin, &manager));
    assert!(!policy.accepts_role(&user, &administrator));
    assert!(policy.accepts_role(&user, &manager));
  }
}
