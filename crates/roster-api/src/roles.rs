//! Handlers for `/roles` endpoints. Every route requires an administrator.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/roles` | Active roles with `rights_count` |
//! | `POST`   | `/roles` | Body: [`RoleInput`] |
//! | `GET`    | `/roles/:id` | The role and its granted rights |
//! | `PUT`    | `/roles/:id` | Body: [`RoleInput`] |
//! | `DELETE` | `/roles/:id` | Soft delete |
//! | `PUT`    | `/roles/:id/rights` | Body: `{"right_ids":[..]}` |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  role::{RoleDetails, RoleInput, RoleListItem},
  store::RosterStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  ApiState,
  actor::Admin,
  error::ApiError,
  extract::{ApiJson, ApiPath},
};

/// `GET /roles`
pub async fn list<S>(
  _admin: Admin,
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<RoleListItem>>, ApiError>
where
  S: RosterStore + 'static,
{
  let roles = state.store.list_roles().await.map_err(ApiError::from_store)?;
  Ok(Json(roles))
}

/// `GET /roles/:id`
pub async fn get_one<S>(
  _admin: Admin,
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<Json<RoleDetails>, ApiError>
where
  S: RosterStore + 'static,
{
  let details = state
    .store
    .role_details(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("role not found: {id}")))?;
  Ok(Json(details))
}

/// `POST /roles`
pub async fn create<S>(
  _admin: Admin,
  State(state): State<ApiState<S>>,
  ApiJson(body): ApiJson<RoleInput>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RosterStore + 'static,
{
  let role = state.store.create_role(body).await.map_err(ApiError::from_store)?;
  tracing::info!(role_id = role.id, "role created");
  Ok((
    StatusCode::CREATED,
    Json(json!({ "success": true, "message": "Role created successfully", "role_id": role.id })),
  ))
}

/// `PUT /roles/:id`
pub async fn update<S>(
  _admin: Admin,
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
  ApiJson(body): ApiJson<RoleInput>,
) -> Result<Json<Value>, ApiError>
where
  S: RosterStore + 'static,
{
  let role = state.store.update_role(id, body).await.map_err(ApiError::from_store)?;
  Ok(Json(json!({ "success": true, "message": "Role updated successfully", "role": role })))
}

/// `DELETE /roles/:id`
pub async fn delete_one<S>(
  _admin: Admin,
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError>
where
  S: RosterStore + 'static,
{
  state.store.delete_role(id).await.map_err(ApiError::from_store)?;
  Ok(Json(json!({ "success": true, "message": "Role deleted successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct AssignRightsBody {
  pub right_ids: Vec<i64>,
}

/// `PUT /roles/:id/rights`
pub async fn assign_rights<S>(
  _admin: Admin,
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
  ApiJson(body): ApiJson<AssignRightsBody>,
) -> Result<Json<Value>, ApiError>
where
  S: RosterStore + 'static,
{
  let outcome = state
    .store
    .assign_rights(id, body.right_ids)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({
    "success": true,
    "message": "Rights assigned successfully",
    "revoked": outcome.revoked,
    "regranted": outcome.regranted,
    "inserted": outcome.inserted,
    "unchanged": outcome.unchanged,
  })))
}
