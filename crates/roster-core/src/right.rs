//! Rights — the individual permissions roles grant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validate::{Rules, Validate, ValidationErrors, trimmed};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Right {
  pub id:           i64,
  pub name:         String,
  pub description:  String,
  pub category:     String,
  #[serde(rename = "type")]
  pub right_type:   String,
  pub is_active:    bool,
  pub created_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RightInput {
  pub name:        String,
  pub description: String,
  pub category:    String,
  #[serde(rename = "type")]
  pub right_type:  String,
}

impl Validate for RightInput {
  fn normalized(self) -> Self {
    Self {
      name:        trimmed(self.name),
      description: trimmed(self.description),
      category:    trimmed(self.category),
      right_type:  trimmed(self.right_type),
    }
  }

  fn validate(&self) -> Result<(), ValidationErrors> {
    Rules::new()
      .required("name", &self.name, 150)
      .required("description", &self.description, 500)
      .required("category", &self.category, 100)
      .required("type", &self.right_type, 50)
      .finish()
  }
}

/// Filters for [`crate::store::RosterStore::search_rights`]. Each present
/// filter is a case-insensitive substring match.
#[derive(Debug, Clone, Default)]
pub struct RightQuery {
  pub name:       Option<String>,
  pub category:   Option<String>,
  pub right_type: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn type_field_uses_wire_name() {
    let input: RightInput = serde_json::from_value(serde_json::json!({
      "name": "Right_001",
      "description": "Read reports",
      "category": "Reports",
      "type": "Read",
    }))
    .unwrap();
    assert_eq!(input.right_type, "Read");
  }

  #[test]
  fn type_is_limited_to_fifty_characters() {
    let input = RightInput {
      name:        "Right_001".into(),
      description: "Read reports".into(),
      category:    "Reports".into(),
      right_type:  "t".repeat(51),
    };
    let err = input.validated().unwrap_err();
    assert_eq!(err.fields().collect::<Vec<_>>(), ["type"]);
  }
}
