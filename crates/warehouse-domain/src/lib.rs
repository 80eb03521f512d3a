mod errors;
mod lobby;
mod player_session;
mod transaction;
mod user;

pub use errors::DomainError;
pub use lobby::{DimLobby, SourceLobby};
pub use player_session::{FactPlayerSession, SourceLobbyPlayer};
pub use transaction::{FactTransaction, SourceCurrencyTransaction};
pub use user::{DimUser, SourceUser};

/// Nombre del sistema fuente tal como se guarda en las tablas de hechos.
pub const USER_SERVICE: &str = "user_service";
pub const GAME_SERVICE: &str = "game_service";
