//! Error types for `roster-core`.

use std::fmt;

use thiserror::Error;

use crate::validate::ValidationErrors;

/// Which side of a link table an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
  Role,
  Right,
}

impl fmt::Display for TargetKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Role => f.write_str("role"),
      Self::Right => f.write_str("right"),
    }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(#[from] ValidationErrors),

  #[error("employee not found: {0}")]
  EmployeeNotFound(i64),

  #[error("role not found: {0}")]
  RoleNotFound(i64),

  #[error("right not found: {0}")]
  RightNotFound(i64),

  /// A reconciliation named target ids that do not exist or are inactive.
  #[error("unknown or inactive {kind} ids: {ids:?}")]
  UnknownTargets { kind: TargetKind, ids: Vec<i64> },
}

impl Error {
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::EmployeeNotFound(_) | Self::RoleNotFound(_) | Self::RightNotFound(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by backend error types so callers can recover the domain cause
/// of a failure without knowing the concrete backend.
///
/// Returns `None` for infrastructure failures (I/O, constraint violations,
/// corrupt rows) that have no domain meaning.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&Error>;
}
