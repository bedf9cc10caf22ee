//! `GET /me/rights` — the effective rights of whoever the current user maps
//! to under the configured [`roster_core::policy::CurrentEmployeePolicy`].
//! `null` when nobody can be resolved.

use axum::{Json, extract::State};
use roster_core::{
  effective::{EffectiveRights, my_rights},
  store::RosterStore,
};

use crate::{ApiState, actor::Actor, error::ApiError};

pub async fn rights<S>(
  Actor(user): Actor,
  State(state): State<ApiState<S>>,
) -> Result<Json<Option<EffectiveRights>>, ApiError>
where
  S: RosterStore + 'static,
{
  let view = my_rights(state.store.as_ref(), &user, state.policy.as_ref())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(view))
}
