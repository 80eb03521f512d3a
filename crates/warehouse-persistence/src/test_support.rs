// SQLite fixtures shared by the in-crate tests.
use crate::connection::{establish, DbConn, SourceDb};
use crate::ledger::Warehouse;
use crate::schema::{src_currency_transactions, src_lobbies, src_lobby_players, src_users};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const WAREHOUSE_DDL: &str = include_str!("../sql/warehouse_sqlite.sql");
pub const SOURCES_DDL: &str = include_str!("../sql/sources_sqlite.sql");

pub fn at(hour: u32) -> NaiveDateTime {
  NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(hour, 0, 0).unwrap()
}

fn fixed_now() -> NaiveDateTime {
  at(23)
}

fn memory_conn(ddl: &str) -> DbConn {
  let mut conn = establish(":memory:").unwrap();
  conn.batch_execute(ddl).unwrap();
  conn
}

/// Warehouse on a private in-memory database, with the clock fixed at 23:00.
pub fn memory_warehouse() -> Warehouse {
  Warehouse::from_connection(memory_conn(WAREHOUSE_DDL)).with_clock(fixed_now)
}

pub fn memory_source() -> SourceDb {
  SourceDb::from_connection(memory_conn(SOURCES_DDL))
}

/// Path for a throwaway SQLite file, for tests that reconnect.
pub fn temp_db_path(tag: &str) -> PathBuf {
  static COUNTER: AtomicUsize = AtomicUsize::new(0);
  let n = COUNTER.fetch_add(1, Ordering::SeqCst);
  std::env::temp_dir().join(format!("warehouse_etl_{}_{}_{}.db", tag, std::process::id(), n))
}

/// Creates a SQLite file at `path` with `ddl` applied.
pub fn create_db(path: &PathBuf, ddl: &str) {
  let _ = std::fs::remove_file(path);
  let mut conn = establish(&path.to_string_lossy()).unwrap();
  conn.batch_execute(ddl).unwrap();
}

pub fn insert_user(src: &mut SourceDb, id: &str, name: &str, created: NaiveDateTime, updated: NaiveDateTime) {
  use src_users::dsl as u;
  diesel::insert_into(u::src_users).values((u::id.eq(id),
                                            u::username.eq(name),
                                            u::email.eq(format!("{}@mafia.test", name)),
                                            u::created_at.eq(created),
                                            u::updated_at.eq(updated)))
                                   .execute(src.conn())
                                   .unwrap();
}

pub fn insert_transaction(src: &mut SourceDb, id: &str, user: &str, amount: i32, created: NaiveDateTime) {
  use src_currency_transactions::dsl as t;
  diesel::insert_into(t::src_currency_transactions).values((t::id.eq(id),
                                                            t::user_id.eq(user),
                                                            t::kind.eq(if amount < 0 { "SPEND" } else { "EARN" }),
                                                            t::amount.eq(amount),
                                                            t::created_at.eq(created)))
                                                   .execute(src.conn())
                                                   .unwrap();
}

pub fn insert_lobby(src: &mut SourceDb, id: &str, name: &str, max: i32, created: NaiveDateTime,
                    updated: NaiveDateTime) {
  use src_lobbies::dsl as l;
  diesel::insert_into(l::src_lobbies).values((l::id.eq(id),
                                              l::name.eq(name),
                                              l::max_players.eq(max),
                                              l::status.eq("WAITING"),
                                              l::created_at.eq(created),
                                              l::updated_at.eq(updated)))
                                     .execute(src.conn())
                                     .unwrap();
}

pub fn insert_lobby_player(src: &mut SourceDb, id: &str, user: &str, role: Option<&str>, alive: Option<bool>,
                           joined: NaiveDateTime, updated: NaiveDateTime) {
  use src_lobby_players::dsl as p;
  diesel::insert_into(p::src_lobby_players).values((p::id.eq(id),
                                                    p::lobby_id.eq("l1"),
                                                    p::user_id.eq(user),
                                                    p::role.eq(role),
                                                    p::joined_at.eq(joined),
                                                    p::is_alive.eq(alive),
                                                    p::updated_at.eq(updated)))
                                           .execute(src.conn())
                                           .unwrap();
}
