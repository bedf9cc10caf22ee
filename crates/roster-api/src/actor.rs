//! Extractors for the user a request runs on behalf of.
//!
//! Authentication is not part of this crate: the [`CurrentUser`] comes from
//! [`ApiState::user`], which the server builds from configuration. Handlers
//! take it by value from the request instead of reading shared globals.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use roster_core::{policy::CurrentUser, store::RosterStore};

use crate::{ApiState, error::ApiError};

/// The current user, whoever it is.
pub struct Actor(pub CurrentUser);

/// The current user, who must be an administrator; rejects with `403`
/// otherwise.
pub struct Admin(pub CurrentUser);

impl<S> FromRequestParts<ApiState<S>> for Actor
where
  S: RosterStore + 'static,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    _parts: &mut Parts,
    state:  &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(Actor(state.user.clone()))
  }
}

impl<S> FromRequestParts<ApiState<S>> for Admin
where
  S: RosterStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let Ok(Actor(user)) = Actor::from_request_parts(parts, state).await;
    if !user.is_admin {
      return Err(ApiError::Forbidden);
    }
    Ok(Admin(user))
  }
}
