// errors.rs
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
  #[error("Error de validación: {0}")]
  ValidationError(String),
}

pub(crate) fn require_id(kind: &str, field: &str, value: &str) -> Result<(), DomainError> {
  if value.trim().is_empty() {
    return Err(DomainError::ValidationError(format!("{} sin {}", kind, field)));
  }
  Ok(())
}
