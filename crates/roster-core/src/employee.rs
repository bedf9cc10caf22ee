//! Employees and the read models built around them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  effective::RoleWithRights,
  role::RoleSummary,
  validate::{Rules, Validate, ValidationErrors, trimmed},
};

/// A person who can hold roles. Never physically removed; `is_active = false`
/// is the soft-delete marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
  pub id:           i64,
  pub first_name:   String,
  pub last_name:    String,
  pub email:        String,
  pub department:   String,
  pub position:     String,
  pub is_active:    bool,
  /// Server-assigned; never changes after creation.
  pub created_date: DateTime<Utc>,
}

impl Employee {
  pub fn full_name(&self) -> String { format!("{} {}", self.first_name, self.last_name) }
}

/// Body of create and update requests. `is_active` and `created_date` are
/// owned by the store and cannot be set by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeInput {
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub department: String,
  pub position:   String,
}

impl Validate for EmployeeInput {
  fn normalized(self) -> Self {
    Self {
      first_name: trimmed(self.first_name),
      last_name:  trimmed(self.last_name),
      email:      trimmed(self.email),
      department: trimmed(self.department),
      position:   trimmed(self.position),
    }
  }

  fn validate(&self) -> Result<(), ValidationErrors> {
    Rules::new()
      .required("first_name", &self.first_name, 100)
      .required("last_name", &self.last_name, 100)
      .required("email", &self.email, 200)
      .email("email", &self.email)
      .required("department", &self.department, 100)
      .required("position", &self.position, 100)
      .finish()
  }
}

/// Identity block shown at the top of the effective-rights view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeSummary {
  pub id:           i64,
  pub full_name:    String,
  pub email:        String,
  pub department:   String,
  pub position:     String,
  pub is_active:    bool,
  pub created_date: DateTime<Utc>,
}

impl From<&Employee> for EmployeeSummary {
  fn from(e: &Employee) -> Self {
    Self {
      id:           e.id,
      full_name:    e.full_name(),
      email:        e.email.clone(),
      department:   e.department.clone(),
      position:     e.position.clone(),
      is_active:    e.is_active,
      created_date: e.created_date,
    }
  }
}

/// A row of the employee list: the employee plus its active role count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeListItem {
  #[serde(flatten)]
  pub employee:    Employee,
  pub full_name:   String,
  pub roles_count: u32,
}

/// An employee with the roles it holds through active links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeWithRoles {
  #[serde(flatten)]
  pub employee:  Employee,
  pub full_name: String,
  pub roles:     Vec<RoleSummary>,
}

/// The employee detail screen: active role links, each with the rights its
/// active role-right links grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeDetails {
  #[serde(flatten)]
  pub employee:  Employee,
  pub full_name: String,
  pub roles:     Vec<RoleWithRights>,
}

/// Filters for employee search. Every text filter is a case-insensitive
/// substring match; all present filters must hold.
#[derive(Debug, Clone, Default)]
pub struct EmployeeQuery {
  /// Matches first name, last name or full name.
  pub name:     Option<String>,
  /// Matches the name of a role held through an active link.
  pub role:     Option<String>,
  /// Matches the name of a right granted through active links.
  pub right:    Option<String>,
  /// Keeps employees holding any of these roles through an active link.
  pub role_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn input() -> EmployeeInput {
    EmployeeInput {
      first_name: "  Jane ".into(),
      last_name:  "Smith".into(),
      email:      "jane.smith@company.com".into(),
      department: "HR".into(),
      position:   "HR Manager".into(),
    }
  }

  #[test]
  fn validated_trims_fields() {
    let v = input().validated().unwrap();
    assert_eq!(v.first_name, "Jane");
  }

  #[test]
  fn every_failing_field_is_reported() {
    let mut bad = input();
    bad.first_name = String::new();
    bad.email = "not-an-address".into();
    bad.position = "p".repeat(101);

    let err = bad.validated().unwrap_err();
    assert_eq!(
      err.fields().collect::<Vec<_>>(),
      ["first_name", "email", "position"]
    );
  }

  #[test]
  fn list_item_serialises_flat() {
    let item = EmployeeListItem {
      employee:    Employee {
        id:           7,
        first_name:   "Bob".into(),
        last_name:    "Johnson".into(),
        email:        "bob@company.com".into(),
        department:   "Finance".into(),
        position:     "Analyst".into(),
        is_active:    true,
        created_date: Utc::now(),
      },
      full_name:   "Bob Johnson".into(),
      roles_count: 2,
    };
    let json = serde_json::to_value(&item).unwrap();
    assert_eq!(json["id"], 7);
    assert_eq!(json["full_name"], "Bob Johnson");
    assert_eq!(json["roles_count"], 2);
  }
}
