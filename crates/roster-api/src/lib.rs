//! JSON REST API for Roster.
//!
//! Exposes an axum [`Router`] backed by any [`roster_core::store::RosterStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", roster_api::api_router(state))
//! ```

pub mod actor;
pub mod employees;
pub mod error;
pub mod extract;
pub mod me;
pub mod rights;
pub mod roles;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, put},
};
use roster_core::{
  policy::{CurrentEmployeePolicy, CurrentUser},
  store::RosterStore,
};

pub use error::{ApiError, panic_response};

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:  Arc<S>,
  /// The user every request runs as.
  pub user:   CurrentUser,
  /// Maps [`ApiState::user`] onto an employee for `/me/rights`.
  pub policy: Arc<dyn CurrentEmployeePolicy>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      user:   self.user.clone(),
      policy: Arc::clone(&self.policy),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: RosterStore + 'static,
{
  Router::new()
    // Employees
    .route("/employees", get(employees::list::<S>).post(employees::create::<S>))
    .route("/employees/search", get(employees::search::<S>))
    .route(
      "/employees/{id}",
      get(employees::get_one::<S>)
        .put(employees::update::<S>)
        .delete(employees::delete_one::<S>),
    )
    .route("/employees/{id}/roles", put(employees::assign_roles::<S>))
    .route("/employees/{id}/rights", get(employees::effective_rights::<S>))
    // Roles
    .route("/roles", get(roles::list::<S>).post(roles::create::<S>))
    .route(
      "/roles/{id}",
      get(roles::get_one::<S>).put(roles::update::<S>).delete(roles::delete_one::<S>),
    )
    .route("/roles/{id}/rights", put(roles::assign_rights::<S>))
    // Rights
    .route("/rights", get(rights::list::<S>).post(rights::create::<S>))
    .route(
      "/rights/{id}",
      get(rights::get_one::<S>).put(rights::update::<S>).delete(rights::delete_one::<S>),
    )
    // Current user
    .route("/me/rights", get(me::rights::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
