//! The `RosterStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `roster-store-sqlite`).
//! Higher layers (`roster-api`, `roster-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use crate::{
  assignment::{EmployeeRole, ReconcileOutcome, RoleRight},
  effective::EffectiveRights,
  employee::{Employee, EmployeeDetails, EmployeeInput, EmployeeListItem, EmployeeQuery, EmployeeWithRoles},
  error::StoreError,
  right::{Right, RightInput, RightQuery},
  role::{Role, RoleDetails, RoleInput, RoleListItem},
};

/// Abstraction over a Roster storage backend.
///
/// Entities are never physically removed: `delete_*` flips `is_active` off.
/// Writes validate their input and report missing entities through
/// [`crate::Error`] (reachable via [`StoreError::as_core`]); reads report
/// absence as `None`.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RosterStore: Send + Sync {
  type Error: StoreError;

  // ── Employees ─────────────────────────────────────────────────────────

  /// Active employees ordered by id, with their active role counts.
  fn list_employees(
    &self,
  ) -> impl Future<Output = Result<Vec<EmployeeListItem>, Self::Error>> + Send + '_;

  /// Retrieve an employee by id, active or not. `None` if not found.
  fn get_employee(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + '_;

  /// The employee with its active role links and, per role, the rights of
  /// its active role-right links.
  fn employee_details(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<EmployeeDetails>, Self::Error>> + Send + '_;

  /// Validate and persist a new, active employee.
  fn create_employee(
    &self,
    input: EmployeeInput,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  /// Validate and overwrite the mutable fields of an existing employee.
  fn update_employee(
    &self,
    id: i64,
    input: EmployeeInput,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  /// Soft-delete. Deleting an already inactive employee succeeds.
  fn delete_employee(&self, id: i64) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Active employees matching every filter in `query`, ordered by id.
  fn search_employees<'a>(
    &'a self,
    query: &'a EmployeeQuery,
  ) -> impl Future<Output = Result<Vec<EmployeeWithRoles>, Self::Error>> + Send + 'a;

  /// Every employee→role link row of an employee, active or not.
  fn employee_roles(
    &self,
    employee_id: i64,
  ) -> impl Future<Output = Result<Vec<EmployeeRole>, Self::Error>> + Send + '_;

  /// Reconcile the employee's active roles to exactly `role_ids` in one
  /// transaction. See [`crate::assignment::plan`].
  fn assign_roles(
    &self,
    employee_id: i64,
    role_ids: Vec<i64>,
  ) -> impl Future<Output = Result<ReconcileOutcome, Self::Error>> + Send + '_;

  // ── Roles ─────────────────────────────────────────────────────────────

  /// Active roles ordered by id, with their active right counts.
  fn list_roles(&self) -> impl Future<Output = Result<Vec<RoleListItem>, Self::Error>> + Send + '_;

  fn get_role(&self, id: i64) -> impl Future<Output = Result<Option<Role>, Self::Error>> + Send + '_;

  /// The role with the rights of its active role-right links.
  fn role_details(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<RoleDetails>, Self::Error>> + Send + '_;

  fn create_role(&self, input: RoleInput) -> impl Future<Output = Result<Role, Self::Error>> + Send + '_;

  fn update_role(
    &self,
    id: i64,
    input: RoleInput,
  ) -> impl Future<Output = Result<Role, Self::Error>> + Send + '_;

  fn delete_role(&self, id: i64) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Every role→right link row of a role, active or not.
  fn role_rights(
    &self,
    role_id: i64,
  ) -> impl Future<Output = Result<Vec<RoleRight>, Self::Error>> + Send + '_;

  /// Reconcile the role's active rights to exactly `right_ids` in one
  /// transaction. See [`crate::assignment::plan`].
  fn assign_rights(
    &self,
    role_id: i64,
    right_ids: Vec<i64>,
  ) -> impl Future<Output = Result<ReconcileOutcome, Self::Error>> + Send + '_;

  // ── Rights ────────────────────────────────────────────────────────────

  /// Active rights matching `query`, ordered by category then name.
  fn search_rights<'a>(
    &'a self,
    query: &'a RightQuery,
  ) -> impl Future<Output = Result<Vec<Right>, Self::Error>> + Send + 'a;

  fn get_right(&self, id: i64) -> impl Future<Output = Result<Option<Right>, Self::Error>> + Send + '_;

  fn create_right(&self, input: RightInput) -> impl Future<Output = Result<Right, Self::Error>> + Send + '_;

  fn update_right(
    &self,
    id: i64,
    input: RightInput,
  ) -> impl Future<Output = Result<Right, Self::Error>> + Send + '_;

  fn delete_right(&self, id: i64) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Aggregates ────────────────────────────────────────────────────────

  /// Materialise the effective-rights view of an active employee. Every hop
  /// (employee, employee-role, role, role-right, right) is filtered on its own
  /// active flag. `None` if the employee is missing or inactive.
  fn effective_rights(
    &self,
    employee_id: i64,
  ) -> impl Future<Output = Result<Option<EffectiveRights>, Self::Error>> + Send + '_;

  /// The lowest-id active employee holding any of `role_ids` through an
  /// active link to an active role.
  fn first_employee_holding(
    &self,
    role_ids: Vec<i64>,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;
}
