// Archivo: stubs.rs
// Propósito: implementación en memoria del registro de ejecuciones para
// pruebas y wiring rápido. No es durable.
use crate::domain::{count_to_i64, utc_now, RunId, RunOutcome, RunRecord, RunStatus, SourceSystem, Watermark};
use crate::errors::{EtlError, Result};
use crate::ledger::{RunLedger, ABANDONED_RUN_MESSAGE};

/// Registro de ejecuciones en memoria, append-only como el real.
pub struct InMemoryRunLedger {
    records: Vec<RunRecord>,
    next_id: RunId,
    clock: fn() -> Watermark,
}

impl InMemoryRunLedger {
    /// Crea un registro vacío que usa el reloj del sistema.
    pub fn new() -> Self {
        Self::with_clock(utc_now)
    }

    /// Registro con reloj inyectado para las marcas de inicio y fin.
    pub fn with_clock(clock: fn() -> Watermark) -> Self {
        Self { records: Vec::new(), next_id: 1, clock }
    }

    /// Todos los registros, en orden de inserción.
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    /// Inserta un registro tal cual; sirve para preparar historial en
    /// pruebas.
    pub fn insert_record(&mut self, mut record: RunRecord) -> RunId {
        record.run_id = self.next_id;
        self.next_id += 1;
        let id = record.run_id;
        self.records.push(record);
        id
    }

    fn find_mut(&mut self, run_id: RunId) -> Result<&mut RunRecord> {
        self.records
            .iter_mut()
            .find(|r| r.run_id == run_id)
            .ok_or(EtlError::NotFound(format!("run {}", run_id)))
    }
}

impl Default for InMemoryRunLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl RunLedger for InMemoryRunLedger {
    /// Elegimos el éxito con mayor `run_end_time`; a igualdad, el de mayor id.
    fn get_watermark(&mut self, source: SourceSystem, table: &str) -> Result<Option<Watermark>> {
        Ok(self.records
               .iter()
               .filter(|r| r.source_system == source && r.table_name == table && r.status == RunStatus::Success)
               .max_by_key(|r| (r.run_end_time, r.run_id))
               .and_then(|r| r.last_extracted_timestamp))
    }

    fn start_run(&mut self, source: SourceSystem, table: &str) -> Result<RunId> {
        let now = (self.clock)();
        Ok(self.insert_record(RunRecord { run_id: 0,
                                          source_system: source,
                                          table_name: table.to_string(),
                                          run_start_time: now,
                                          run_end_time: None,
                                          status: RunStatus::Running,
                                          records_extracted: 0,
                                          records_loaded: 0,
                                          last_extracted_timestamp: None,
                                          error_message: None }))
    }

    fn end_run(&mut self, run_id: RunId, outcome: &RunOutcome) -> Result<()> {
        if !outcome.status.is_terminal() {
            return Err(EtlError::Conflict(format!("run {}: end_run requires a terminal status", run_id)));
        }
        let now = (self.clock)();
        let record = self.find_mut(run_id)?;
        if record.status.is_terminal() {
            return Err(EtlError::Conflict(format!("run {} already finalized as {}", run_id, record.status)));
        }
        record.run_end_time = Some(now);
        record.status = outcome.status;
        record.records_extracted = count_to_i64(outcome.records_extracted);
        record.records_loaded = count_to_i64(outcome.records_loaded);
        record.last_extracted_timestamp = outcome.watermark;
        record.error_message = outcome.error.clone();
        Ok(())
    }

    fn reconcile_stale_runs(&mut self, started_before: Watermark) -> Result<usize> {
        let now = (self.clock)();
        let mut closed = 0;
        for r in self.records
                     .iter_mut()
                     .filter(|r| r.status == RunStatus::Running && r.run_start_time < started_before)
        {
            r.status = RunStatus::Failed;
            r.run_end_time = Some(now);
            r.error_message = Some(ABANDONED_RUN_MESSAGE.to_string());
            closed += 1;
        }
        Ok(closed)
    }

    fn recent_runs(&mut self, source: SourceSystem, table: &str, limit: usize) -> Result<Vec<RunRecord>> {
        Ok(self.records
               .iter()
               .rev()
               .filter(|r| r.source_system == source && r.table_name == table)
               .take(limit)
               .cloned()
               .collect())
    }
}
