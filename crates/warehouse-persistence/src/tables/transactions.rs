// "CurrencyTransaction" -> fact_transactions. Transactions never change, so
// createdAt is both the change field and the full-load order. Re-extracted
// rows are ignored on their natural key.
use super::rejected_row;
use crate::connection::{map_extract_err, map_load_err, SourceDb};
use crate::ledger::Warehouse;
use crate::schema::{fact_transactions, src_currency_transactions};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use etl_core::{Result, TablePipeline, Watermark};
use warehouse_domain::{FactTransaction, SourceCurrencyTransaction};

#[derive(Debug, Queryable)]
struct TransactionRow {
  id: String,
  user_id: String,
  kind: String,
  amount: i32,
  description: Option<String>,
  created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = fact_transactions)]
struct NewFactTransaction<'a> {
  source_system: &'a str,
  source_transaction_id: &'a str,
  user_id: &'a str,
  transaction_type: &'a str,
  amount: i32,
  description: Option<&'a str>,
  occurred_at: NaiveDateTime,
}

impl<'a> From<&'a FactTransaction> for NewFactTransaction<'a> {
  fn from(t: &'a FactTransaction) -> Self {
    Self { source_system: &t.source_system,
           source_transaction_id: &t.source_transaction_id,
           user_id: &t.user_id,
           transaction_type: &t.transaction_type,
           amount: t.amount,
           description: t.description.as_deref(),
           occurred_at: t.occurred_at }
  }
}

pub struct TransactionsPipeline;

impl TablePipeline<SourceDb, Warehouse> for TransactionsPipeline {
  type SourceRow = SourceCurrencyTransaction;
  type WarehouseRow = FactTransaction;

  fn table_name(&self) -> &'static str {
    "fact_transactions"
  }

  fn extract(&self, source: &mut SourceDb, since: Option<Watermark>) -> Result<Vec<SourceCurrencyTransaction>> {
    use src_currency_transactions::dsl as t;
    let columns = (t::id, t::user_id, t::kind, t::amount, t::description, t::created_at);
    let rows = match since {
      Some(w) => t::src_currency_transactions.select(columns)
                                             .filter(t::created_at.gt(w))
                                             .order((t::created_at.asc(), t::id.asc()))
                                             .load::<TransactionRow>(source.conn()),
      None => t::src_currency_transactions.select(columns)
                                          .order((t::created_at.asc(), t::id.asc()))
                                          .load::<TransactionRow>(source.conn()),
    };
    map_extract_err(rows)?.into_iter()
                          .map(|r| {
                            SourceCurrencyTransaction::new(&r.id, &r.user_id, &r.kind, r.amount, r.description,
                                                           r.created_at).map_err(rejected_row)
                          })
                          .collect()
  }

  fn change_marker(&self, row: &SourceCurrencyTransaction) -> Watermark {
    row.created_at()
  }

  fn transform(&self, row: &SourceCurrencyTransaction) -> FactTransaction {
    FactTransaction::from_source(row)
  }

  fn load(&self, warehouse: &mut Warehouse, rows: &[FactTransaction]) -> Result<usize> {
    use fact_transactions::dsl as f;
    if rows.is_empty() {
      return Ok(0);
    }
    map_load_err(warehouse.conn().transaction::<_, DieselError, _>(|conn| {
                                   for row in rows {
                                     diesel::insert_into(f::fact_transactions).values(NewFactTransaction::from(row))
                                                                              .on_conflict((f::source_system,
                                                                                            f::source_transaction_id))
                                                                              .do_nothing()
                                                                              .execute(conn)?;
                                   }
                                   Ok(rows.len())
                                 }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::{at, insert_transaction, memory_source, memory_warehouse};

  #[test]
  fn incremental_extract_uses_creation_time() {
    let mut src = memory_source();
    insert_transaction(&mut src, "t1", "u1", 100, at(1));
    insert_transaction(&mut src, "t2", "u1", -40, at(3));
    insert_transaction(&mut src, "t3", "u2", 15, at(2));

    let rows = TransactionsPipeline.extract(&mut src, Some(at(1))).unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["t3", "t2"]);
    assert_eq!(TransactionsPipeline.extract(&mut src, Some(at(3))).unwrap().len(), 0);
  }

  #[test]
  fn reloading_the_same_transactions_does_not_duplicate_facts() {
    let mut src = memory_source();
    insert_transaction(&mut src, "t1", "u1", 100, at(1));
    insert_transaction(&mut src, "t2", "u2", 20, at(2));
    let mut wh = memory_warehouse();

    for _ in 0..2 {
      let facts: Vec<FactTransaction> = TransactionsPipeline.extract(&mut src, None)
                                                            .unwrap()
                                                            .iter()
                                                            .map(|r| TransactionsPipeline.transform(r))
                                                            .collect();
      assert_eq!(TransactionsPipeline.load(&mut wh, &facts).unwrap(), 2);
    }

    use fact_transactions::dsl as f;
    let stored = f::fact_transactions.select((f::source_transaction_id, f::source_system, f::amount))
                                     .order(f::source_transaction_id.asc())
                                     .load::<(String, String, i32)>(wh.conn())
                                     .unwrap();
    assert_eq!(stored,
               vec![("t1".to_string(), "user_service".to_string(), 100),
                    ("t2".to_string(), "user_service".to_string(), 20)]);
  }
}
