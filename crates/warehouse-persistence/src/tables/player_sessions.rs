// "LobbyPlayer" -> fact_player_sessions. Incremental on updatedAt, full load
// ordered by joinedAt. A session's role and survival change during a game,
// so conflicts on the natural key refresh those two columns.
use super::rejected_row;
use crate::connection::{map_extract_err, map_load_err, SourceDb};
use crate::ledger::Warehouse;
use crate::schema::{fact_player_sessions, src_lobby_players};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::upsert::excluded;
use etl_core::{Result, TablePipeline, Watermark};
use warehouse_domain::{FactPlayerSession, SourceLobbyPlayer};

#[derive(Debug, Queryable)]
struct LobbyPlayerRow {
  id: String,
  lobby_id: String,
  user_id: String,
  role: Option<String>,
  joined_at: NaiveDateTime,
  is_alive: Option<bool>,
  updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = fact_player_sessions)]
struct NewFactPlayerSession<'a> {
  source_system: &'a str,
  source_session_id: &'a str,
  user_id: &'a str,
  lobby_id: &'a str,
  role_assigned: Option<&'a str>,
  joined_at: NaiveDateTime,
  survived_until_end: bool,
}

impl<'a> From<&'a FactPlayerSession> for NewFactPlayerSession<'a> {
  fn from(s: &'a FactPlayerSession) -> Self {
    Self { source_system: &s.source_system,
           source_session_id: &s.source_session_id,
           user_id: &s.user_id,
           lobby_id: &s.lobby_id,
           role_assigned: s.role_assigned.as_deref(),
           joined_at: s.joined_at,
           survived_until_end: s.survived_until_end }
  }
}

pub struct PlayerSessionsPipeline;

impl TablePipeline<SourceDb, Warehouse> for PlayerSessionsPipeline {
  type SourceRow = SourceLobbyPlayer;
  type WarehouseRow = FactPlayerSession;

  fn table_name(&self) -> &'static str {
    "fact_player_sessions"
  }

  fn extract(&self, source: &mut SourceDb, since: Option<Watermark>) -> Result<Vec<SourceLobbyPlayer>> {
    use src_lobby_players::dsl as p;
    let columns = (p::id, p::lobby_id, p::user_id, p::role, p::joined_at, p::is_alive, p::updated_at);
    let rows = match since {
      Some(w) => p::src_lobby_players.select(columns)
                                     .filter(p::updated_at.gt(w))
                                     .order((p::updated_at.asc(), p::id.asc()))
                                     .load::<LobbyPlayerRow>(source.conn()),
      None => p::src_lobby_players.select(columns)
                                  .order((p::joined_at.asc(), p::id.asc()))
                                  .load::<LobbyPlayerRow>(source.conn()),
    };
    map_extract_err(rows)?.into_iter()
                          .map(|r| {
                            SourceLobbyPlayer::new(&r.id,
                                                   &r.lobby_id,
                                                   &r.user_id,
                                                   r.role,
                                                   r.joined_at,
                                                   r.is_alive,
                                                   r.updated_at).map_err(rejected_row)
                          })
                          .collect()
  }

  fn change_marker(&self, row: &SourceLobbyPlayer) -> Watermark {
    row.updated_at()
  }

  fn transform(&self, row: &SourceLobbyPlayer) -> FactPlayerSession {
    FactPlayerSession::from_source(row)
  }

  fn load(&self, warehouse: &mut Warehouse, rows: &[FactPlayerSession]) -> Result<usize> {
    use fact_player_sessions::dsl as f;
    if rows.is_empty() {
      return Ok(0);
    }
    map_load_err(warehouse.conn().transaction::<_, DieselError, _>(|conn| {
                                   for row in rows {
                                     diesel::insert_into(f::fact_player_sessions)
                                       .values(NewFactPlayerSession::from(row))
                                       .on_conflict((f::source_system, f::source_session_id))
                                       .do_update()
                                       .set((f::role_assigned.eq(excluded(f::role_assigned)),
                                             f::survived_until_end.eq(excluded(f::survived_until_end))))
                                       .execute(conn)?;
                                   }
                                   Ok(rows.len())
                                 }))
  }
}
