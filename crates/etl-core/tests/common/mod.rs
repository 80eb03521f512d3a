// Fakes compartidos por las pruebas de integración: una "base fuente" en
// memoria y un warehouse que delega el registro en `InMemoryRunLedger`.
#![allow(dead_code)]
use chrono::{NaiveDate, NaiveDateTime};
use etl_core::{EtlError, InMemoryRunLedger, Result, RunId, RunLedger, RunOutcome, RunRecord, SourceSystem,
               TablePipeline, Watermark};
use std::collections::BTreeMap;

pub fn ts(hour: u32) -> NaiveDateTime {
  NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(hour, 0, 0).unwrap()
}

pub fn fixed_now() -> NaiveDateTime {
  ts(23)
}

/// Fila fuente: id, nombre, creado, actualizado.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
  pub id: String,
  pub name: String,
  pub created_at: NaiveDateTime,
  pub updated_at: NaiveDateTime,
}

pub fn player(id: &str, name: &str, created: u32, updated: u32) -> Player {
  Player { id: id.into(), name: name.into(), created_at: ts(created), updated_at: ts(updated) }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DimPlayer {
  pub player_id: String,
  pub name: String,
  pub last_updated: NaiveDateTime,
}

#[derive(Default)]
pub struct FakeSource {
  pub players: Vec<Player>,
  pub fail_extract: bool,
  pub queries: Vec<Option<Watermark>>,
}

pub struct FakeWarehouse {
  pub ledger: InMemoryRunLedger,
  pub dim_players: BTreeMap<String, DimPlayer>,
  pub fail_load: bool,
  pub fail_start: bool,
  pub fail_end: bool,
  pub load_calls: usize,
}

impl FakeWarehouse {
  pub fn new() -> Self {
    Self { ledger: InMemoryRunLedger::with_clock(fixed_now),
           dim_players: BTreeMap::new(),
           fail_load: false,
           fail_start: false,
           fail_end: false,
           load_calls: 0 }
  }

  pub fn last_record(&self) -> RunRecord {
    self.ledger.records().last().cloned().expect("at least one run")
  }
}

impl RunLedger for FakeWarehouse {
  fn get_watermark(&mut self, source: SourceSystem, table: &str) -> Result<Option<Watermark>> {
    self.ledger.get_watermark(source, table)
  }

  fn start_run(&mut self, source: SourceSystem, table: &str) -> Result<RunId> {
    if self.fail_start {
      return Err(EtlError::Ledger("warehouse is read-only".into()));
    }
    self.ledger.start_run(source, table)
  }

  fn end_run(&mut self, run_id: RunId, outcome: &RunOutcome) -> Result<()> {
    if self.fail_end {
      return Err(EtlError::Ledger("lost connection".into()));
    }
    self.ledger.end_run(run_id, outcome)
  }

  fn reconcile_stale_runs(&mut self, started_before: Watermark) -> Result<usize> {
    self.ledger.reconcile_stale_runs(started_before)
  }

  fn recent_runs(&mut self, source: SourceSystem, table: &str, limit: usize) -> Result<Vec<RunRecord>> {
    self.ledger.recent_runs(source, table, limit)
  }
}

/// Dimensión "dim_players": incremental por `updated_at`, completa por
/// `created_at`, upsert por id.
pub struct PlayersPipeline {
  pub table: &'static str,
}

impl PlayersPipeline {
  pub fn new() -> Self {
    Self { table: "dim_players" }
  }
}

impl TablePipeline<FakeSource, FakeWarehouse> for PlayersPipeline {
  type SourceRow = Player;
  type WarehouseRow = DimPlayer;

  fn table_name(&self) -> &'static str {
    self.table
  }

  fn extract(&self, source: &mut FakeSource, since: Option<Watermark>) -> Result<Vec<Player>> {
    source.queries.push(since);
    if source.fail_extract {
      return Err(EtlError::Extract("relation \"Player\" does not exist".into()));
    }
    let mut rows: Vec<Player> = match since {
      Some(w) => source.players.iter().filter(|p| p.updated_at > w).cloned().collect(),
      None => source.players.clone(),
    };
    match since {
      Some(_) => rows.sort_by_key(|p| p.updated_at),
      None => rows.sort_by_key(|p| p.created_at),
    }
    Ok(rows)
  }

  fn change_marker(&self, row: &Player) -> Watermark {
    row.updated_at
  }

  fn transform(&self, row: &Player) -> DimPlayer {
    DimPlayer { player_id: row.id.clone(), name: row.name.clone(), last_updated: row.updated_at }
  }

  fn load(&self, warehouse: &mut FakeWarehouse, rows: &[DimPlayer]) -> Result<usize> {
    warehouse.load_calls += 1;
    if warehouse.fail_load {
      return Err(EtlError::Load("duplicate key value violates unique constraint".into()));
    }
    for r in rows {
      warehouse.dim_players.insert(r.player_id.clone(), r.clone());
    }
    Ok(rows.len())
  }
}
