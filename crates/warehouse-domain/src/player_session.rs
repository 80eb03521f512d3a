// player_session.rs
use crate::errors::require_id;
use crate::{DomainError, GAME_SERVICE};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Participación de un usuario en un lobby (`"LobbyPlayer"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLobbyPlayer {
  id: String,
  lobby_id: String,
  user_id: String,
  role: Option<String>,
  joined_at: NaiveDateTime,
  is_alive: Option<bool>,
  updated_at: NaiveDateTime,
}

impl SourceLobbyPlayer {
  pub fn new(id: &str,
             lobby_id: &str,
             user_id: &str,
             role: Option<String>,
             joined_at: NaiveDateTime,
             is_alive: Option<bool>,
             updated_at: NaiveDateTime)
             -> Result<Self, DomainError> {
    require_id("LobbyPlayer", "id", id)?;
    require_id("LobbyPlayer", "lobbyId", lobby_id)?;
    require_id("LobbyPlayer", "userId", user_id)?;
    Ok(Self { id: id.to_string(),
              lobby_id: lobby_id.to_string(),
              user_id: user_id.to_string(),
              role,
              joined_at,
              is_alive,
              updated_at })
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn updated_at(&self) -> NaiveDateTime {
    self.updated_at
  }
}

/// Fila de `fact_player_sessions`, con clave natural
/// `(source_system, source_session_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactPlayerSession {
  pub source_system: String,
  pub source_session_id: String,
  pub user_id: String,
  pub lobby_id: String,
  pub role_assigned: Option<String>,
  pub joined_at: NaiveDateTime,
  pub survived_until_end: bool,
}

impl FactPlayerSession {
  /// Sin rol queda `None`; sin `isAlive` se asume que no sobrevivió.
  pub fn from_source(p: &SourceLobbyPlayer) -> Self {
    Self { source_system: GAME_SERVICE.to_string(),
           source_session_id: p.id.clone(),
           user_id: p.user_id.clone(),
           lobby_id: p.lobby_id.clone(),
           role_assigned: p.role.clone(),
           joined_at: p.joined_at,
           survived_until_end: p.is_alive.unwrap_or(false) }
  }
}
