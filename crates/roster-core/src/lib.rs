//! Core types and trait definitions for the Roster administration service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.
//!
//! The two pieces of real logic live here as pure functions so every backend
//! shares them:
//!
//! - [`assignment::plan`] — reconcile existing link rows against a desired
//!   target-id set.
//! - [`effective::aggregate`] — the de-duplicated union of rights an employee
//!   holds through active roles.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod assignment;
pub mod effective;
pub mod employee;
pub mod error;
pub mod policy;
pub mod right;
pub mod role;
pub mod store;
pub mod validate;

pub use error::{Error, Result, StoreError, TargetKind};
