//! Roles — named bundles of rights that employees hold.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  effective::GrantedRight,
  validate::{Rules, Validate, ValidationErrors, trimmed},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
  pub id:           i64,
  pub name:         String,
  pub description:  String,
  pub is_active:    bool,
  pub created_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInput {
  pub name:        String,
  pub description: String,
}

impl Validate for RoleInput {
  fn normalized(self) -> Self {
    Self { name: trimmed(self.name), description: trimmed(self.description) }
  }

  fn validate(&self) -> Result<(), ValidationErrors> {
    Rules::new()
      .required("name", &self.name, 150)
      .required("description", &self.description, 500)
      .finish()
  }
}

/// The short form of a role used inside employee listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSummary {
  pub id:          i64,
  pub name:        String,
  pub description: String,
  pub is_active:   bool,
}

impl From<&Role> for RoleSummary {
  fn from(r: &Role) -> Self {
    Self {
      id:          r.id,
      name:        r.name.clone(),
      description: r.description.clone(),
      is_active:   r.is_active,
    }
  }
}

/// A row of the role list: the role plus its active right count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleListItem {
  #[serde(flatten)]
  pub role:         Role,
  pub rights_count: u32,
}

/// A role with the rights granted through its active links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDetails {
  #[serde(flatten)]
  pub role:   Role,
  pub rights: Vec<GrantedRight>,
}
