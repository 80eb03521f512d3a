// Diesel-backed run ledger over `etl_run_log`. The warehouse connection is
// also the target of every table load.
use crate::connection::{establish, map_ledger_err, DbConn};
use crate::schema::etl_run_log;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use etl_core::{count_to_i64, utc_now, EtlError, Result, RunId, RunLedger, RunOutcome, RunRecord, RunStatus,
               SourceSystem, Watermark, ABANDONED_RUN_MESSAGE};

/// Connection to the data warehouse.
pub struct Warehouse {
  conn: DbConn,
  clock: fn() -> Watermark,
}

impl Warehouse {
  pub fn connect(target: &str) -> Result<Self> {
    let conn = establish(target).map_err(|e| match e {
                                  EtlError::Connection(msg) => EtlError::Connection(format!("warehouse: {}", msg)),
                                  other => other,
                                })?;
    Ok(Self::from_connection(conn))
  }

  pub fn from_connection(conn: DbConn) -> Self {
    Self { conn, clock: utc_now }
  }

  /// Replaces the clock used for run start and end times.
  pub fn with_clock(mut self, clock: fn() -> Watermark) -> Self {
    self.clock = clock;
    self
  }

  pub(crate) fn conn(&mut self) -> &mut DbConn {
    &mut self.conn
  }
}

#[derive(Debug, Queryable)]
struct RunLogRow {
  run_id: i64,
  source_system: String,
  table_name: String,
  run_start_time: NaiveDateTime,
  run_end_time: Option<NaiveDateTime>,
  status: String,
  records_extracted: i64,
  records_loaded: i64,
  last_extracted_timestamp: Option<NaiveDateTime>,
  error_message: Option<String>,
}

impl RunLogRow {
  fn into_record(self) -> Result<RunRecord> {
    let source_system = self.source_system
                            .parse::<SourceSystem>()
                            .map_err(|e| EtlError::Ledger(format!("run {}: {}", self.run_id, e)))?;
    Ok(RunRecord { run_id: self.run_id,
                   source_system,
                   table_name: self.table_name,
                   run_start_time: self.run_start_time,
                   run_end_time: self.run_end_time,
                   status: self.status.parse::<RunStatus>()?,
                   records_extracted: self.records_extracted,
                   records_loaded: self.records_loaded,
                   last_extracted_timestamp: self.last_extracted_timestamp,
                   error_message: self.error_message })
  }
}

impl RunLedger for Warehouse {
  fn get_watermark(&mut self, source: SourceSystem, table: &str) -> Result<Option<Watermark>> {
    use etl_run_log::dsl as runs;
    let found = runs::etl_run_log.filter(runs::source_system.eq(source.as_str()))
                                 .filter(runs::table_name.eq(table))
                                 .filter(runs::status.eq(RunStatus::Success.as_str()))
                                 .order((runs::run_end_time.desc(), runs::run_id.desc()))
                                 .select(runs::last_extracted_timestamp)
                                 .first::<Option<NaiveDateTime>>(&mut self.conn)
                                 .optional();
    Ok(map_ledger_err(found)?.flatten())
  }

  fn start_run(&mut self, source: SourceSystem, table: &str) -> Result<RunId> {
    use etl_run_log::dsl as runs;
    let now = (self.clock)();
    map_ledger_err(diesel::insert_into(runs::etl_run_log).values((runs::source_system.eq(source.as_str()),
                                                                  runs::table_name.eq(table),
                                                                  runs::run_start_time.eq(now),
                                                                  runs::status.eq(RunStatus::Running.as_str()),
                                                                  runs::records_extracted.eq(0i64),
                                                                  runs::records_loaded.eq(0i64)))
                                                         .returning(runs::run_id)
                                                         .get_result::<i64>(&mut self.conn))
  }

  fn end_run(&mut self, run_id: RunId, outcome: &RunOutcome) -> Result<()> {
    use etl_run_log::dsl as runs;
    if !outcome.status.is_terminal() {
      return Err(EtlError::Conflict(format!("run {}: end_run requires a terminal status", run_id)));
    }
    let now = (self.clock)();
    let target = runs::etl_run_log.filter(runs::run_id.eq(run_id))
                                  .filter(runs::status.eq(RunStatus::Running.as_str()));
    let updated =
      map_ledger_err(diesel::update(target).set((runs::run_end_time.eq(now),
                                                 runs::status.eq(outcome.status.as_str()),
                                                 runs::records_extracted.eq(count_to_i64(outcome.records_extracted)),
                                                 runs::records_loaded.eq(count_to_i64(outcome.records_loaded)),
                                                 runs::last_extracted_timestamp.eq(outcome.watermark),
                                                 runs::error_message.eq(outcome.error.as_deref())))
                                           .execute(&mut self.conn))?;
    if updated == 1 {
      return Ok(());
    }
    // Nothing updated: unknown id or already finalized.
    let current = map_ledger_err(runs::etl_run_log.filter(runs::run_id.eq(run_id))
                                                  .select(runs::status)
                                                  .first::<String>(&mut self.conn)
                                                  .optional())?;
    match current {
      None => Err(EtlError::NotFound(format!("run {}", run_id))),
      Some(status) => Err(EtlError::Conflict(format!("run {} already finalized as {}", run_id, status))),
    }
  }

  fn reconcile_stale_runs(&mut self, started_before: Watermark) -> Result<usize> {
    use etl_run_log::dsl as runs;
    let now = (self.clock)();
    let stale = runs::etl_run_log.filter(runs::status.eq(RunStatus::Running.as_str()))
                                 .filter(runs::run_start_time.lt(started_before));
    map_ledger_err(diesel::update(stale).set((runs::status.eq(RunStatus::Failed.as_str()),
                                              runs::run_end_time.eq(now),
                                              runs::error_message.eq(ABANDONED_RUN_MESSAGE)))
                                        .execute(&mut self.conn))
  }

  fn recent_runs(&mut self, source: SourceSystem, table: &str, limit: usize) -> Result<Vec<RunRecord>> {
    use etl_run_log::dsl as runs;
    let rows = map_ledger_err(runs::etl_run_log.filter(runs::source_system.eq(source.as_str()))
                                               .filter(runs::table_name.eq(table))
                                               .order(runs::run_id.desc())
                                               .limit(count_to_i64(limit))
                                               .load::<RunLogRow>(&mut self.conn))?;
    rows.into_iter().map(RunLogRow::into_record).collect()
  }
}
