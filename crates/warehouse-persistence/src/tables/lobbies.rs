// "Lobby" -> dim_lobbies: incremental on updatedAt, upsert on lobby_id.
use super::rejected_row;
use crate::connection::{map_extract_err, map_load_err, SourceDb};
use crate::ledger::Warehouse;
use crate::schema::{dim_lobbies, src_lobbies};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::upsert::excluded;
use etl_core::{Result, TablePipeline, Watermark};
use warehouse_domain::{DimLobby, SourceLobby};

#[derive(Debug, Queryable)]
struct LobbyRow {
  id: String,
  name: String,
  max_players: i32,
  status: String,
  created_at: NaiveDateTime,
  updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = dim_lobbies)]
struct NewDimLobby<'a> {
  lobby_id: &'a str,
  lobby_name: &'a str,
  max_players: i32,
  created_at: NaiveDateTime,
  last_updated: NaiveDateTime,
}

impl<'a> From<&'a DimLobby> for NewDimLobby<'a> {
  fn from(l: &'a DimLobby) -> Self {
    Self { lobby_id: &l.lobby_id,
           lobby_name: &l.lobby_name,
           max_players: l.max_players,
           created_at: l.created_at,
           last_updated: l.last_updated }
  }
}

pub struct LobbiesPipeline;

impl TablePipeline<SourceDb, Warehouse> for LobbiesPipeline {
  type SourceRow = SourceLobby;
  type WarehouseRow = DimLobby;

  fn table_name(&self) -> &'static str {
    "dim_lobbies"
  }

  fn extract(&self, source: &mut SourceDb, since: Option<Watermark>) -> Result<Vec<SourceLobby>> {
    use src_lobbies::dsl as l;
    let columns = (l::id, l::name, l::max_players, l::status, l::created_at, l::updated_at);
    let rows = match since {
      Some(w) => l::src_lobbies.select(columns)
                               .filter(l::updated_at.gt(w))
                               .order((l::updated_at.asc(), l::id.asc()))
                               .load::<LobbyRow>(source.conn()),
      None => l::src_lobbies.select(columns).order((l::created_at.asc(), l::id.asc())).load::<LobbyRow>(source.conn()),
    };
    map_extract_err(rows)?.into_iter()
                          .map(|r| {
                            SourceLobby::new(&r.id, &r.name, r.max_players, &r.status, r.created_at, r.updated_at)
                              .map_err(rejected_row)
                          })
                          .collect()
  }

  fn change_marker(&self, row: &SourceLobby) -> Watermark {
    row.updated_at()
  }

  fn transform(&self, row: &SourceLobby) -> DimLobby {
    DimLobby::from_source(row)
  }

  fn load(&self, warehouse: &mut Warehouse, rows: &[DimLobby]) -> Result<usize> {
    use dim_lobbies::dsl as d;
    if rows.is_empty() {
      return Ok(0);
    }
    map_load_err(warehouse.conn().transaction::<_, DieselError, _>(|conn| {
                                   for row in rows {
                                     diesel::insert_into(d::dim_lobbies).values(NewDimLobby::from(row))
                                                                        .on_conflict(d::lobby_id)
                                                                        .do_update()
                                                                        .set((d::lobby_name.eq(excluded(d::lobby_name)),
                                                                              d::max_players.eq(excluded(d::max_players)),
                                                                              d::last_updated.eq(excluded(d::last_updated))))
                                                                        .execute(conn)?;
                                   }
                                   Ok(rows.len())
                                 }))
  }
}
