//! Handlers for `/employees` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/employees` | Active employees with `roles_count` |
//! | `GET`    | `/employees/search` | `?name&role&right&role_ids=1,2` |
//! | `POST`   | `/employees` | Admin. Body: [`EmployeeInput`] |
//! | `GET`    | `/employees/:id` | Roles and their rights; 404 if absent |
//! | `PUT`    | `/employees/:id` | Admin. Body: [`EmployeeInput`] |
//! | `DELETE` | `/employees/:id` | Admin. Soft delete |
//! | `PUT`    | `/employees/:id/roles` | Admin. Body: `{"role_ids":[..]}` |
//! | `GET`    | `/employees/:id/rights` | Effective rights; `null` if absent |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  effective::EffectiveRights,
  employee::{EmployeeDetails, EmployeeInput, EmployeeListItem, EmployeeQuery, EmployeeWithRoles},
  store::RosterStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  ApiState,
  actor::Admin,
  error::ApiError,
  extract::{ApiJson, ApiPath, ApiQuery},
};

// ─── Reads ────────────────────────────────────────────────────────────────────

/// `GET /employees`
pub async fn list<S>(State(state): State<ApiState<S>>) -> Result<Json<Vec<EmployeeListItem>>, ApiError>
where
  S: RosterStore + 'static,
{
  let employees = state.store.list_employees().await.map_err(ApiError::from_store)?;
  Ok(Json(employees))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
  pub name:     Option<String>,
  pub role:     Option<String>,
  pub right:    Option<String>,
  /// Comma-separated role ids, e.g. `1,2`.
  pub role_ids: Option<String>,
}

impl SearchParams {
  fn into_query(self) -> Result<EmployeeQuery, ApiError> {
    let role_ids = match self.role_ids.as_deref() {
      Some(raw) => parse_ids(raw)?,
      None => Vec::new(),
    };
    Ok(EmployeeQuery { name: self.name, role: self.role, right: self.right, role_ids })
  }
}

fn parse_ids(raw: &str) -> Result<Vec<i64>, ApiError> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(|s| {
      s.parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("invalid role id: {s:?}")))
    })
    .collect()
}

/// `GET /employees/search`
pub async fn search<S>(
  State(state): State<ApiState<S>>,
  ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<Vec<EmployeeWithRoles>>, ApiError>
where
  S: RosterStore + 'static,
{
  let query = params.into_query()?;
  let employees = state.store.search_employees(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(employees))
}

/// `GET /employees/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<Json<EmployeeDetails>, ApiError>
where
  S: RosterStore + 'static,
{
  let details = state
    .store
    .employee_details(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("employee not found: {id}")))?;
  Ok(Json(details))
}

/// `GET /employees/:id/rights`
pub async fn effective_rights<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<Json<Option<EffectiveRights>>, ApiError>
where
  S: RosterStore + 'static,
{
  let view = state.store.effective_rights(id).await.map_err(ApiError::from_store)?;
  Ok(Json(view))
}

// ─── Writes ───────────────────────────────────────────────────────────────────

/// `POST /employees`
pub async fn create<S>(
  _admin: Admin,
  State(state): State<ApiState<S>>,
  ApiJson(body): ApiJson<EmployeeInput>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RosterStore + 'static,
{
  let employee = state.store.create_employee(body).await.map_err(ApiError::from_store)?;
  tracing::info!(employee_id = employee.id, "employee created");
  Ok((
    StatusCode::CREATED,
    Json(json!({
      "success": true,
      "message": "Employee created successfully",
      "employee_id": employee.id,
    })),
  ))
}

/// `PUT /employees/:id`
pub async fn update<S>(
  _admin: Admin,
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
  ApiJson(body): ApiJson<EmployeeInput>,
) -> Result<Json<Value>, ApiError>
where
  S: RosterStore + 'static,
{
  let employee = state.store.update_employee(id, body).await.map_err(ApiError::from_store)?;
  Ok(Json(json!({
    "success": true,
    "message": "Employee updated successfully",
    "employee": employee,
  })))
}

/// `DELETE /employees/:id`
pub async fn delete_one<S>(
  _admin: Admin,
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError>
where
  S: RosterStore + 'static,
{
  state.store.delete_employee(id).await.map_err(ApiError::from_store)?;
  Ok(Json(json!({ "success": true, "message": "Employee deleted successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct AssignRolesBody {
  pub role_ids: Vec<i64>,
}

/// `PUT /employees/:id/roles`
pub async fn assign_roles<S>(
  _admin: Admin,
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
  ApiJson(body): ApiJson<AssignRolesBody>,
) -> Result<Json<Value>, ApiError>
where
  S: RosterStore + 'static,
{
  let outcome = state
    .store
    .assign_roles(id, body.role_ids)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({
    "success": true,
    "message": "Roles assigned successfully",
    "revoked": outcome.revoked,
    "regranted": outcome.regranted,
    "inserted": outcome.inserted,
    "unchanged": outcome.unchanged,
  })))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_ids_are_comma_separated() {
    assert_eq!(parse_ids("1,2, 5").unwrap(), [1, 2, 5]);
    assert!(parse_ids("").unwrap().is_empty());
    assert!(matches!(parse_ids("1,x"), Err(ApiError::BadRequest(_))));
  }
}
