// Archivo: ledger.rs
// Propósito: definir el trait `RunLedger`, el contrato que deben implementar
// los registros de ejecuciones (Postgres, in-memory, etc.).
use crate::domain::{RunId, RunOutcome, RunRecord, SourceSystem, Watermark};
use crate::errors::Result;

/// Registro durable de intentos de ETL por (fuente, tabla).
///
/// Cada llamada es una única escritura durable: sin lotes ni reintentos. Los
/// métodos reciben `&mut self` porque las implementaciones reales son dueñas
/// de una conexión al warehouse durante toda la orquestación.
pub trait RunLedger {
    /// Devuelve `last_extracted_timestamp` de la ejecución `success` más
    /// reciente (por `run_end_time` descendente) para (fuente, tabla).
    /// `None` si nunca hubo éxito, lo que implica extracción completa.
    fn get_watermark(&mut self, source: SourceSystem, table: &str) -> Result<Option<Watermark>>;

    /// Inserta un registro en estado `running` con `run_start_time = now`.
    /// Cuando retorna, el registro ya es durable.
    fn start_run(&mut self, source: SourceSystem, table: &str) -> Result<RunId>;

    /// Escribe los campos terminales. Sólo se permite una vez por `run_id`:
    /// una segunda llamada devuelve `EtlError::Conflict` y un id desconocido
    /// `EtlError::NotFound`.
    fn end_run(&mut self, run_id: RunId, outcome: &RunOutcome) -> Result<()>;

    /// Marca como `failed` los registros que siguen en `running` y empezaron
    /// antes de `started_before` (procesos caídos entre `start_run` y
    /// `end_run`). Devuelve cuántos registros se cerraron.
    fn reconcile_stale_runs(&mut self, started_before: Watermark) -> Result<usize>;

    /// Historial más reciente primero, para inspección.
    fn recent_runs(&mut self, source: SourceSystem, table: &str, limit: usize) -> Result<Vec<RunRecord>>;
}

/// Mensaje que se deja en los registros cerrados por reconciliación.
pub const ABANDONED_RUN_MESSAGE: &str = "abandoned: process ended before the run was finalized";
