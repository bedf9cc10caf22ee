//! Server configuration: an optional TOML file layered under `ROSTER_*`
//! environment variables (`ROSTER_PORT`, `ROSTER_DEMO_USER__ROLE`, …).

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, Environment, File};
use roster_core::policy::{CurrentUser, DemoUserPolicy};
use serde::Deserialize;

/// Runtime server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Seed demo data when the store holds no employees.
  pub seed:       bool,
  pub demo_user:  DemoUserConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_owned(),
      port:       5080,
      store_path: PathBuf::from("roster.db"),
      seed:       false,
      demo_user:  DemoUserConfig::default(),
    }
  }
}

/// The unauthenticated user every request runs as.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemoUserConfig {
  /// `Admin` (any case) for an administrator, anything else for a regular
  /// user.
  pub role:              String,
  pub admin_employee_id: Option<i64>,
  pub user_employee_id:  Option<i64>,
}

impl Default for DemoUserConfig {
  fn default() -> Self {
    let policy = DemoUserPolicy::default();
    Self {
      role:              "User".to_owned(),
      admin_employee_id: policy.admin_employee_id,
      user_employee_id:  policy.user_employee_id,
    }
  }
}

impl DemoUserConfig {
  pub fn current_user(&self) -> CurrentUser { CurrentUser::from_role_name(self.role.as_str()) }

  pub fn policy(&self) -> DemoUserPolicy {
    DemoUserPolicy {
      admin_employee_id: self.admin_employee_id,
      user_employee_id: self.user_employee_id,
      ..DemoUserPolicy::default()
    }
  }
}

/// Load `path` (if it exists) and the `ROSTER_` environment.
pub fn load(path: &Path) -> anyhow::Result<ServerConfig> {
  Config::builder()
    .add_source(File::from(path).required(false))
    .add_source(
      Environment::with_prefix("ROSTER")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}

#[cfg(test)]
mod tests {
  use config::FileFormat;

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 5080);
    assert_eq!(cfg.store_path, PathBuf::from("roster.db"));
    assert!(!cfg.seed);
    assert!(!cfg.demo_user.current_user().is_admin);
    assert_eq!(cfg.demo_user.policy(), DemoUserPolicy::default());
  }

  #[test]
  fn nested_demo_user_overrides() {
    let cfg = parse(
      r#"
        port = 9000
        seed = true

        [demo_user]
        role = "ADMIN"
        admin_employee_id = 4
      "#,
    );
    assert_eq!(cfg.port, 9000);
    assert!(cfg.seed);
    assert!(cfg.demo_user.current_user().is_admin);
    assert_eq!(cfg.demo_user.policy().admin_employee_id, Some(4));
    assert_eq!(cfg.demo_user.policy().user_employee_id, Some(3));
  }
}
