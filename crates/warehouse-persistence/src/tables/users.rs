// "User" -> dim_users: incremental on updatedAt, upsert on user_id.
use super::rejected_row;
use crate::connection::{map_extract_err, map_load_err, SourceDb};
use crate::ledger::Warehouse;
use crate::schema::{dim_users, src_users};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::upsert::excluded;
use etl_core::{Result, TablePipeline, Watermark};
use warehouse_domain::{DimUser, SourceUser};

#[derive(Debug, Queryable)]
struct UserRow {
  id: String,
  username: String,
  email: Option<String>,
  created_at: NaiveDateTime,
  updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = dim_users)]
struct NewDimUser<'a> {
  user_id: &'a str,
  username: &'a str,
  email: Option<&'a str>,
  created_at: NaiveDateTime,
  last_updated: NaiveDateTime,
}

impl<'a> From<&'a DimUser> for NewDimUser<'a> {
  fn from(u: &'a DimUser) -> Self {
    Self { user_id: &u.user_id,
           username: &u.username,
           email: u.email.as_deref(),
           created_at: u.created_at,
           last_updated: u.last_updated }
  }
}

pub struct UsersPipeline;

impl TablePipeline<SourceDb, Warehouse> for UsersPipeline {
  type SourceRow = SourceUser;
  type WarehouseRow = DimUser;

  fn table_name(&self) -> &'static str {
    "dim_users"
  }

  fn extract(&self, source: &mut SourceDb, since: Option<Watermark>) -> Result<Vec<SourceUser>> {
    use src_users::dsl as u;
    let columns = (u::id, u::username, u::email, u::created_at, u::updated_at);
    let rows = match since {
      Some(w) => u::src_users.select(columns)
                             .filter(u::updated_at.gt(w))
                             .order((u::updated_at.asc(), u::id.asc()))
                             .load::<UserRow>(source.conn()),
      None => u::src_users.select(columns).order((u::created_at.asc(), u::id.asc())).load::<UserRow>(source.conn()),
    };
    map_extract_err(rows)?.into_iter()
                          .map(|r| {
                            SourceUser::new(&r.id, &r.username, r.email, r.created_at, r.updated_at).map_err(rejected_row)
                          })
                          .collect()
  }

  fn change_marker(&self, row: &SourceUser) -> Watermark {
    row.updated_at()
  }

  fn transform(&self, row: &SourceUser) -> DimUser {
    DimUser::from_source(row)
  }

  fn load(&self, warehouse: &mut Warehouse, rows: &[DimUser]) -> Result<usize> {
    use dim_users::dsl as d;
    if rows.is_empty() {
      return Ok(0);
    }
    map_load_err(warehouse.conn().transaction::<_, DieselError, _>(|conn| {
                                   for row in rows {
                                     diesel::insert_into(d::dim_users).values(NewDimUser::from(row))
                                                                      .on_conflict(d::user_id)
                                                                      .do_update()
                                                                      .set((d::username.eq(excluded(d::username)),
                                                                            d::email.eq(excluded(d::email)),
                                                                            d::last_updated.eq(excluded(d::last_updated))))
                                                                      .execute(conn)?;
                                   }
                                   Ok(rows.len())
                                 }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::{at, insert_user, memory_source, memory_warehouse};
  use etl_core::EtlError;

  #[test]
  fn incremental_reads_strictly_after_watermark_in_change_order() {
    let mut src = memory_source();
    insert_user(&mut src, "u1", "alice", at(1), at(6));
    insert_user(&mut src, "u2", "bob", at(2), at(4));
    insert_user(&mut src, "u3", "carol", at(3), at(5));

    let rows = UsersPipeline.extract(&mut src, Some(at(4))).unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["u3", "u1"]);
  }

  #[test]
  fn full_load_reads_everything_in_creation_order() {
    let mut src = memory_source();
    insert_user(&mut src, "u1", "alice", at(3), at(3));
    insert_user(&mut src, "u2", "bob", at(1), at(9));
    insert_user(&mut src, "u3", "carol", at(2), at(2));

    let rows = UsersPipeline.extract(&mut src, None).unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["u2", "u3", "u1"]);
  }

  #[test]
  fn upsert_overwrites_mutable_columns_and_keeps_one_row() {
    let mut wh = memory_warehouse();
    let first = SourceUser::new("u1", "alice", None, at(1), at(1)).unwrap();
    assert_eq!(UsersPipeline.load(&mut wh, &[DimUser::from_source(&first)]).unwrap(), 1);

    let renamed = SourceUser::new("u1", "alice_v2", Some("a@x.io".into()), at(8), at(5)).unwrap();
    let again = SourceUser::new("u1", "alice_v3", Some("a@y.io".into()), at(8), at(6)).unwrap();
    let batch = vec![DimUser::from_source(&renamed), DimUser::from_source(&again)];
    assert_eq!(UsersPipeline.load(&mut wh, &batch).unwrap(), 2);

    use dim_users::dsl as d;
    let stored = d::dim_users.select((d::username, d::email, d::created_at, d::last_updated))
                             .load::<(String, Option<String>, NaiveDateTime, NaiveDateTime)>(wh.conn())
                             .unwrap();
    assert_eq!(stored, vec![("alice_v3".to_string(), Some("a@y.io".to_string()), at(1), at(6))]);
  }

  #[test]
  fn empty_batch_loads_nothing() {
    let mut wh = memory_warehouse();
    assert_eq!(UsersPipeline.load(&mut wh, &[]).unwrap(), 0);
  }

  #[test]
  fn failed_row_rolls_back_the_whole_batch() {
    let mut wh = memory_warehouse();
    diesel::sql_query("CREATE TRIGGER reject_bad_user BEFORE INSERT ON dim_users WHEN NEW.user_id = 'bad' \
                       BEGIN SELECT RAISE(ABORT, 'bad row'); END;").execute(wh.conn())
                                                                   .unwrap();

    let good = SourceUser::new("u1", "alice", None, at(1), at(1)).unwrap();
    let bad = SourceUser::new("bad", "mallory", None, at(2), at(2)).unwrap();
    let batch = vec![DimUser::from_source(&good), DimUser::from_source(&bad)];
    assert!(matches!(UsersPipeline.load(&mut wh, &batch), Err(EtlError::Load(_))));

    use dim_users::dsl as d;
    let stored: i64 = d::dim_users.count().get_result(wh.conn()).unwrap();
    assert_eq!(stored, 0);
  }
}
