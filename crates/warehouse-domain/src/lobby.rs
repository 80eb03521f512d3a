// lobby.rs
use crate::errors::require_id;
use crate::DomainError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Fila de `"Lobby"` en el servicio de juego. `status` se lee pero no pasa
/// al warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLobby {
  id: String,
  name: String,
  max_players: i32,
  status: String,
  created_at: NaiveDateTime,
  updated_at: NaiveDateTime,
}

impl SourceLobby {
  pub fn new(id: &str,
             name: &str,
             max_players: i32,
             status: &str,
             created_at: NaiveDateTime,
             updated_at: NaiveDateTime)
             -> Result<Self, DomainError> {
    require_id("Lobby", "id", id)?;
    Ok(Self { id: id.to_string(),
              name: name.to_string(),
              max_players,
              status: status.to_string(),
              created_at,
              updated_at })
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn status(&self) -> &str {
    &self.status
  }

  pub fn updated_at(&self) -> NaiveDateTime {
    self.updated_at
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimLobby {
  pub lobby_id: String,
  pub lobby_name: String,
  pub max_players: i32,
  pub created_at: NaiveDateTime,
  pub last_updated: NaiveDateTime,
}

impl DimLobby {
  pub fn from_source(l: &SourceLobby) -> Self {
    Self { lobby_id: l.id.clone(),
           lobby_name: l.name.clone(),
           max_players: l.max_players,
           created_at: l.created_at,
           last_updated: l.updated_at }
  }
}
