//! Field validation for create/update inputs.
//!
//! Every input type implements [`Validate`]. Inputs are trimmed first (see
//! [`Validate::validated`]) so length limits apply to the stored value, and
//! all failing fields are reported together.

use std::fmt;

use serde::Serialize;

/// A single failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:   &'static str,
  pub message: String,
}

/// Every field that failed validation, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
  pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
    self.0.iter().map(|e| e.field)
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, e) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str("; ")?;
      }
      write!(f, "{}: {}", e.field, e.message)?;
    }
    Ok(())
  }
}

impl std::error::Error for ValidationErrors {}

/// Accumulates field failures.
#[derive(Default)]
pub struct Rules {
  errors: Vec<FieldError>,
}

impl Rules {
  pub fn new() -> Self { Self::default() }

  /// Non-blank and at most `max` characters.
  pub fn required(&mut self, field: &'static str, value: &str, max: usize) -> &mut Self {
    if value.trim().is_empty() {
      self.fail(field, "must not be empty".to_owned());
    } else if value.chars().count() > max {
      self.fail(field, format!("must be at most {max} characters"));
    }
    self
  }

  /// Shaped like `local@domain`, no whitespace. Skipped when `field` has
  /// already failed, so each field reports at most one message.
  pub fn email(&mut self, field: &'static str, value: &str) -> &mut Self {
    if !value.is_empty() && !self.has_failed(field) && !looks_like_email(value) {
      self.fail(field, "must be a valid email address".to_owned());
    }
    self
  }

  pub fn finish(&mut self) -> Result<(), ValidationErrors> {
    if self.errors.is_empty() {
      Ok(())
    } else {
      Err(ValidationErrors(std::mem::take(&mut self.errors)))
    }
  }

  fn has_failed(&self, field: &str) -> bool { self.errors.iter().any(|e| e.field == field) }

  fn fail(&mut self, field: &'static str, message: String) {
    self.errors.push(FieldError { field, message });
  }
}

fn looks_like_email(value: &str) -> bool {
  if value.chars().any(char::is_whitespace) {
    return false;
  }
  match value.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty() && !domain.is_empty() && !domain.contains('@')
    }
    None => false,
  }
}

/// An input that can be normalised and checked before it reaches a store.
pub trait Validate: Sized {
  /// Trim surrounding whitespace from every text field.
  fn normalized(self) -> Self;

  /// Check every field rule against the (already normalised) value.
  fn validate(&self) -> Result<(), ValidationErrors>;

  /// Normalise, then validate.
  fn validated(self) -> Result<Self, ValidationErrors> {
    let value = self.normalized();
    value.validate()?;
    Ok(value)
  }
}

pub(crate) fn trimmed(s: String) -> String {
  let t = s.trim();
  if t.len() == s.len() { s } else { t.to_owned() }
}
