// Archivo: engine.rs
// Propósito: orquestador de una tabla. Secuencia
// ledger-read → extract → transform → load → ledger-write y aísla el fallo a
// esa tabla.
use crate::domain::{utc_now, LoadMode, RunId, RunOutcome, RunStatus, SourceSystem, Watermark};
use crate::errors::{EtlError, Result};
use crate::ledger::RunLedger;
use crate::table::{Stage, StageFailure, TableJob};
use log::{error, info};
use serde::{Deserialize, Serialize};

/// Resultado observable de la ejecución de una tabla.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableReport {
    pub source: SourceSystem,
    pub table: String,
    /// `None` cuando ni siquiera pudo registrarse el inicio.
    pub run_id: Option<RunId>,
    pub status: RunStatus,
    pub records_extracted: usize,
    pub records_loaded: usize,
    pub watermark: Option<Watermark>,
    pub error: Option<String>,
}

impl TableReport {
    /// Reporte para una tabla cuyo pipeline se interrumpió por un error del
    /// registro de ejecuciones.
    pub fn aborted(source: SourceSystem, table: &str, err: &EtlError) -> Self {
        Self { source,
               table: table.to_string(),
               run_id: None,
               status: RunStatus::Failed,
               records_extracted: 0,
               records_loaded: 0,
               watermark: None,
               error: Some(err.to_string()) }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// Motor de ejecución por tabla.
///
/// Máquina de estados: `start → extracting → loading → {success, failed}`.
/// - Si `start_run` falla, el error se propaga: sin registro durable no se
///   hace nada más con esa tabla.
/// - Un fallo de extracción o carga se registra como `failed` sin marca de
///   agua, de modo que la siguiente ejecución reintenta desde el mismo punto.
/// - Si el propio `end_run` falla, el error se propaga.
pub struct PipelineEngine {
    clock: fn() -> Watermark,
}

impl PipelineEngine {
    pub fn new() -> Self {
        Self { clock: utc_now }
    }

    /// Motor con un reloj fijo; útil en pruebas.
    pub fn with_clock(clock: fn() -> Watermark) -> Self {
        Self { clock }
    }

    pub fn now(&self) -> Watermark {
        (self.clock)()
    }

    /// Ejecuta una tabla completa y escribe exactamente una actualización
    /// terminal en el registro.
    pub fn run_table<S, W, J>(&self,
                              source: SourceSystem,
                              job: &J,
                              source_conn: &mut S,
                              warehouse: &mut W,
                              mode: LoadMode)
                              -> Result<TableReport>
        where W: RunLedger,
              J: TableJob<S, W> + ?Sized
    {
        let table = job.name();
        let run_id = warehouse.start_run(source, table)?;

        // La marca previa se lee también en carga completa: acota la nueva
        // marca para que nunca retroceda.
        let transfer = match warehouse.get_watermark(source, table) {
            Ok(prior) => {
                let since = match mode {
                    LoadMode::Incremental => prior,
                    LoadMode::Full => None,
                };
                job.transfer(source_conn, warehouse, since).map(|t| (t, prior))
            }
            Err(error) => Err(StageFailure { stage: Stage::Extract, extracted: 0, error }),
        };

        match transfer {
            Ok((t, prior)) => {
                let candidate = t.latest_change.unwrap_or_else(|| self.now());
                let watermark = match prior {
                    Some(p) if p > candidate => p,
                    _ => candidate,
                };
                warehouse.end_run(run_id, &RunOutcome::success(t.extracted, t.loaded, watermark))?;
                info!("{}.{}: extracted {} rows, loaded {} rows, watermark {}",
                      source, table, t.extracted, t.loaded, watermark);
                Ok(TableReport { source,
                                 table: table.to_string(),
                                 run_id: Some(run_id),
                                 status: RunStatus::Success,
                                 records_extracted: t.extracted,
                                 records_loaded: t.loaded,
                                 watermark: Some(watermark),
                                 error: None })
            }
            Err(failure) => {
                let message = failure.error.to_string();
                match failure.stage {
                    Stage::Extract => error!("{}.{}: extraction failed: {}", source, table, message),
                    Stage::Load => error!("{}.{}: load failed after extracting {} rows: {}",
                                          source, table, failure.extracted, message),
                }
                warehouse.end_run(run_id, &RunOutcome::failed(failure.extracted, message.clone()))?;
                Ok(TableReport { source,
                                 table: table.to_string(),
                                 run_id: Some(run_id),
                                 status: RunStatus::Failed,
                                 records_extracted: failure.extracted,
                                 records_loaded: 0,
                                 watermark: None,
                                 error: Some(message) })
            }
        }
    }
}

impl Default for PipelineEngine {
    fn default() -> Self {
        Self::new()
    }
}
