// user.rs
use crate::errors::require_id;
use crate::DomainError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Fila de la tabla `"User"` del servicio de usuarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceUser {
  id: String,
  username: String,
  email: Option<String>,
  created_at: NaiveDateTime,
  updated_at: NaiveDateTime,
}

impl SourceUser {
  pub fn new(id: &str,
             username: &str,
             email: Option<String>,
             created_at: NaiveDateTime,
             updated_at: NaiveDateTime)
             -> Result<Self, DomainError> {
    require_id("User", "id", id)?;
    Ok(Self { id: id.to_string(), username: username.to_string(), email, created_at, updated_at })
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn updated_at(&self) -> NaiveDateTime {
    self.updated_at
  }

  pub fn created_at(&self) -> NaiveDateTime {
    self.created_at
  }
}

/// Fila de `dim_users`. `last_updated` copia el `updatedAt` de la fuente.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimUser {
  pub user_id: String,
  pub username: String,
  pub email: Option<String>,
  pub created_at: NaiveDateTime,
  pub last_updated: NaiveDateTime,
}

impl DimUser {
  pub fn from_source(u: &SourceUser) -> Self {
    Self { user_id: u.id.clone(),
           username: u.username.clone(),
           email: u.email.clone(),
           created_at: u.created_at,
           last_updated: u.updated_at }
  }
}
