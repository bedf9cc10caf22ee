//! Router tests: drive [`api_router`] with `oneshot` against a seeded
//! in-memory store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
  response::IntoResponse as _,
  routing::get,
};
use roster_core::{
  Error as CoreError, TargetKind,
  policy::{CurrentUser, DemoUserPolicy},
};
use roster_store_sqlite::{Error as StoreErr, SqliteStore};
use serde_json::{Value, json};
use tower::ServiceExt as _;
use tower_http::catch_panic::CatchPanicLayer;

use crate::{ApiError, ApiState, api_router, panic_response};

async fn make_state(role: &str) -> ApiState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  store.seed_demo_data().await.unwrap();
  ApiState {
    store:  Arc::new(store),
    user:   CurrentUser::from_role_name(role),
    policy: Arc::new(DemoUserPolicy::default()),
  }
}

async fn call(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(v) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(v.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = router.oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, json)
}

async fn send(
  state:  &ApiState<SqliteStore>,
  method: &str,
  uri:    &str,
  body:   Option<Value>,
) -> (StatusCode, Value) {
  call(api_router(state.clone()), method, uri, body).await
}

fn new_employee() -> Value {
  json!({
    "first_name": "Dana",
    "last_name": "Scully",
    "email": "dana.scully@company.com",
    "department": "Security",
    "position": "Analyst",
  })
}

// ── Employees ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_employees_includes_role_counts() {
  let state = make_state("User").await;
  let (status, body) = send(&state, "GET", "/employees", None).await;

  assert_eq!(status, StatusCode::OK);
  let list = body.as_array().unwrap();
  assert_eq!(list.len(), 5);
  assert_eq!(list[0]["full_name"], "John Doe");
  assert_eq!(list[0]["roles_count"], 1);
}

#[tokio::test]
async fn writes_require_an_administrator() {
  let state = make_state("User").await;

  let (status, body) = send(&state, "POST", "/employees", Some(new_employee())).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["success"], false);

  let (status, _) = send(&state, "GET", "/roles", None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  // Rights are open to everyone.
  let (status, _) = send(&state, "GET", "/rights?category=Reports", None).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_creates_and_reads_employee() {
  let state = make_state("admin").await;

  let (status, body) = send(&state, "POST", "/employees", Some(new_employee())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["success"], true);
  assert_eq!(body["employee_id"], 6);

  let (status, body) = send(&state, "GET", "/employees/6", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["email"], "dana.scully@company.com");
  assert!(body["roles"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn validation_errors_are_400_with_fields() {
  let state = make_state("Admin").await;
  let mut input = new_employee();
  input["email"] = json!("not-an-address");
  input["last_name"] = json!("");

  let (status, body) = send(&state, "POST", "/employees", Some(input)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["success"], false);
  let fields: Vec<&str> =
    body["errors"].as_array().unwrap().iter().map(|e| e["field"].as_str().unwrap()).collect();
  assert_eq!(fields, ["last_name", "email"]);
}

#[tokio::test]
async fn missing_entities_are_404() {
  let state = make_state("Admin").await;

  let (status, body) = send(&state, "GET", "/employees/99", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["success"], false);

  let (status, _) = send(&state, "DELETE", "/roles/99", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = send(&state, "GET", "/rights/999", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn effective_rights_of_absent_employee_is_null() {
  let state = make_state("User").await;
  let (status, body) = send(&state, "GET", "/employees/99/rights", None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body.is_null());

  let (_, body) = send(&state, "GET", "/employees/4/rights", None).await;
  assert_eq!(body["employee"]["full_name"], "Alice Brown");
  assert_eq!(body["all_rights"].as_array().unwrap().len(), 75);
}

#[tokio::test]
async fn search_accepts_comma_separated_role_ids() {
  let state = make_state("User").await;

  let (status, body) = send(&state, "GET", "/employees/search?role_ids=1,3", None).await;
  assert_eq!(status, StatusCode::OK);
  let ids: Vec<i64> = body.as_array().unwrap().iter().map(|e| e["id"].as_i64().unwrap()).collect();
  assert_eq!(ids, [1, 3]);

  let (status, _) = send(&state, "GET", "/employees/search?role_ids=1,abc", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_bodies_use_the_error_shape() {
  let state = make_state("Admin").await;

  let (status, body) =
    send(&state, "POST", "/employees", Some(json!({ "first_name": "Dana" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["success"], false);
  assert!(body["message"].as_str().unwrap().contains("last_name"));

  let (status, body) =
    send(&state, "PUT", "/roles/3/rights", Some(json!({ "right_ids": "all" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["success"], false);

  let (status, body) = send(&state, "GET", "/employees/abc", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["success"], false);
}

// ── Reconciliation ──────────────────────────────────────────────────────────

#[tokio::test]
async fn assign_rights_reports_counts() {
  let state = make_state("Admin").await;

  let (status, _) =
    send(&state, "PUT", "/roles/3/rights", Some(json!({ "right_ids": [20, 40] }))).await;
  assert_eq!(status, StatusCode::OK);

  let (status, body) =
    send(&state, "PUT", "/roles/3/rights", Some(json!({ "right_ids": [10, 20, 30] }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], true);
  assert_eq!(body["revoked"], 1);
  assert_eq!(body["unchanged"], 1);
  assert_eq!(body["inserted"].as_u64().unwrap() + body["regranted"].as_u64().unwrap(), 2);

  let (_, body) = send(&state, "GET", "/roles/3", None).await;
  let ids: Vec<i64> = body["rights"].as_array().unwrap().iter().map(|r| r["id"].as_i64().unwrap()).collect();
  assert_eq!(ids, [10, 20, 30]);
}

#[tokio::test]
async fn unknown_targets_are_rejected() {
  let state = make_state("Admin").await;

  let (status, body) =
    send(&state, "PUT", "/employees/2/roles", Some(json!({ "role_ids": [1, 42] }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["message"].as_str().unwrap().contains("42"));

  let (_, body) = send(&state, "GET", "/employees/2", None).await;
  assert_eq!(body["roles"].as_array().unwrap().len(), 1);
}

// ── Current user ────────────────────────────────────────────────────────────

#[tokio::test]
async fn my_rights_follow_the_demo_policy() {
  let user = make_state("User").await;
  let (status, body) = send(&user, "GET", "/me/rights", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["employee"]["id"], 3);
  assert_eq!(body["roles"][0]["name"], "Employee");

  let admin = make_state("Admin").await;
  let (_, body) = send(&admin, "GET", "/me/rights", None).await;
  assert_eq!(body["employee"]["id"], 1);
  assert_eq!(body["all_rights"].as_array().unwrap().len(), 200);
}

// ── Failures ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn panics_become_500_with_request_id() {
  async fn boom() -> &'static str { panic!("boom") }

  let router = Router::new()
    .route("/boom", get(boom))
    .layer(CatchPanicLayer::custom(panic_response));

  let (status, body) = call(router, "GET", "/boom", None).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["success"], false);
  assert_eq!(body["message"], "An unexpected error occurred.");
  assert_eq!(body["request_id"].as_str().unwrap().len(), 32);
}

#[tokio::test]
async fn store_failures_without_domain_cause_are_500() {
  let resp = ApiError::from_store(StoreErr::Vanished(1)).into_response();
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let body: Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(body["success"], false);
  assert_eq!(body["message"], "An unexpected error occurred.");
  assert_eq!(body["request_id"].as_str().unwrap().len(), 32);
  assert!(!body.to_string().contains("vanished"));
}

#[test]
fn domain_causes_keep_their_status() {
  let unknown = StoreErr::Core(CoreError::UnknownTargets { kind: TargetKind::Role, ids: vec![42] });
  let err = ApiError::from_store(unknown);
  assert!(matches!(err, ApiError::BadRequest(_)));
  assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

  let missing = ApiError::from_store(StoreErr::Core(CoreError::RoleNotFound(7)));
  assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);
}
