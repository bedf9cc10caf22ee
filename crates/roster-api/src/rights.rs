//! Handlers for `/rights` endpoints. Not admin-gated.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/rights` | `?name&category&type`; active rights |
//! | `POST`   | `/rights` | Body: [`RightInput`] |
//! | `GET`    | `/rights/:id` | 404 if absent |
//! | `PUT`    | `/rights/:id` | Body: [`RightInput`] |
//! | `DELETE` | `/rights/:id` | Soft delete |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  right::{Right, RightInput, RightQuery},
  store::RosterStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  ApiState,
  error::ApiError,
  extract::{ApiJson, ApiPath, ApiQuery},
};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub name:       Option<String>,
  pub category:   Option<String>,
  #[serde(rename = "type")]
  pub right_type: Option<String>,
}

/// `GET /rights[?name=..&category=..&type=..]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<Right>>, ApiError>
where
  S: RosterStore + 'static,
{
  let query = RightQuery {
    name:       params.name,
    category:   params.category,
    right_type: params.right_type,
  };
  let rights = state.store.search_rights(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(rights))
}

/// `GET /rights/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<Json<Right>, ApiError>
where
  S: RosterStore + 'static,
{
  let right = state
    .store
    .get_right(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("right not found: {id}")))?;
  Ok(Json(right))
}

/// `POST /rights`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  ApiJson(body): ApiJson<RightInput>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RosterStore + 'static,
{
  let right = state.store.create_right(body).await.map_err(ApiError::from_store)?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "success": true, "message": "Right created successfully", "right_id": right.id })),
  ))
}

/// `PUT /rights/:id`
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
  ApiJson(body): ApiJson<RightInput>,
) -> Result<Json<Value>, ApiError>
where
  S: RosterStore + 'static,
{
  let right = state.store.update_right(id, body).await.map_err(ApiError::from_store)?;
  Ok(Json(json!({ "success": true, "message": "Right updated successfully", "right": right })))
}

/// `DELETE /rights/:id`
pub async fn delete_one<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError>
where
  S: RosterStore + 'static,
{
  state.store.delete_right(id).await.map_err(ApiError::from_store)?;
  Ok(Json(json!({ "success": true, "message": "Right deleted successfully" })))
}
