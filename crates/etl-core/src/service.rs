// Archivo: service.rs
// Propósito: implementar `EtlService`, la capa que expone el disparador
// (`run` para todas las fuentes, `run_source` para una). La invocan la CLI y
// el planificador.
use crate::domain::{LoadMode, SourceSystem};
use crate::engine::PipelineEngine;
use crate::errors::Result;
use crate::ledger::RunLedger;
use crate::source::{SourcePlan, SourceReport};
use chrono::Duration;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

/// Conexiones y tablas concretas sobre las que trabaja el servicio.
pub trait EtlBackend {
    /// Conexión a una base fuente.
    type Source;
    /// Conexión al warehouse; también es el registro de ejecuciones.
    type Warehouse: RunLedger;

    fn connect_warehouse(&self) -> Result<Self::Warehouse>;

    fn connect_source(&self, source: SourceSystem) -> Result<Self::Source>;

    /// Tablas de `source`, en orden de ejecución.
    fn plan(&self, source: SourceSystem) -> SourcePlan<Self::Source, Self::Warehouse>;
}

/// Fuentes alcanzadas por un disparo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Source(SourceSystem),
}

impl Scope {
    pub fn sources(&self) -> Vec<SourceSystem> {
        match self {
            Scope::All => SourceSystem::ALL.to_vec(),
            Scope::Source(s) => vec![*s],
        }
    }
}

/// Fuente que no llegó a ejecutarse (normalmente por conexión).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: SourceSystem,
    pub error: String,
}

/// Resumen de un disparo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub mode: LoadMode,
    /// Registros `running` abandonados que se cerraron al empezar.
    pub reconciled_runs: usize,
    pub sources: Vec<SourceReport>,
    pub source_failures: Vec<SourceFailure>,
}

impl RunSummary {
    /// `true` si todas las fuentes pudieron ejecutarse. Los fallos por tabla
    /// no cuentan: se registran en el ledger y se reintentan en el siguiente
    /// disparo.
    pub fn all_sources_ran(&self) -> bool {
        self.source_failures.is_empty()
    }

    pub fn failed_tables(&self) -> usize {
        self.sources.iter().map(|s| s.failed_tables()).sum()
    }
}

/// Opciones del servicio.
#[derive(Debug, Clone)]
pub struct EtlServiceConfig {
    /// Antigüedad a partir de la cual un registro `running` se considera
    /// abandonado.
    pub stale_run_after: Duration,
}

impl Default for EtlServiceConfig {
    fn default() -> Self {
        Self { stale_run_after: Duration::minutes(60) }
    }
}

/// Servicio de alto nivel: abre el warehouse, reconcilia ejecuciones
/// abandonadas y ejecuta las fuentes una tras otra.
pub struct EtlService<B> where B: EtlBackend
{
    backend: B,
    engine: PipelineEngine,
    config: EtlServiceConfig,
}

impl<B> EtlService<B> where B: EtlBackend
{
    pub fn new(backend: B, config: EtlServiceConfig) -> Self {
        Self::with_engine(backend, PipelineEngine::new(), config)
    }

    pub fn with_engine(backend: B, engine: PipelineEngine, config: EtlServiceConfig) -> Self {
        Self { backend, engine, config }
    }

    /// Ejecuta todas las fuentes.
    pub fn run(&self, full_load: bool) -> Result<RunSummary> {
        self.trigger(Scope::All, LoadMode::from_full_load(full_load))
    }

    /// Ejecuta una sola fuente.
    pub fn run_source(&self, source: SourceSystem, full_load: bool) -> Result<RunSummary> {
        self.trigger(Scope::Source(source), LoadMode::from_full_load(full_load))
    }

    /// Ejecuta las fuentes de `scope`. Sólo la conexión al warehouse es
    /// fatal; el fallo de una fuente no bloquea a las demás.
    pub fn trigger(&self, scope: Scope, mode: LoadMode) -> Result<RunSummary> {
        info!("starting ETL pipeline ({} load)", mode);
        let mut warehouse = self.backend.connect_warehouse().map_err(|e| {
                                                                 error!("failed to connect to warehouse: {}", e);
                                                                 e
                                                             })?;
        info!("connected to data warehouse");

        let reconciled_runs = self.reconcile(&mut warehouse);

        let mut sources = Vec::new();
        let mut source_failures = Vec::new();
        for source in scope.sources() {
            let plan = self.backend.plan(source);
            match plan.run(&self.engine, |s| self.backend.connect_source(s), &mut warehouse, mode) {
                Ok(report) => sources.push(report),
                Err(e) => source_failures.push(SourceFailure { source, error: e.to_string() }),
            }
        }
        drop(warehouse);

        let summary = RunSummary { mode, reconciled_runs, sources, source_failures };
        info!("ETL pipeline finished: {} source(s) ran, {} failed to start, {} table failure(s)",
              summary.sources.len(),
              summary.source_failures.len(),
              summary.failed_tables());
        Ok(summary)
    }

    /// Cierra los registros `running` más antiguos que el umbral. Un fallo
    /// aquí no impide la ejecución.
    fn reconcile(&self, warehouse: &mut B::Warehouse) -> usize {
        let cutoff = self.engine.now() - self.config.stale_run_after;
        match warehouse.reconcile_stale_runs(cutoff) {
            Ok(0) => 0,
            Ok(n) => {
                warn!("marked {} abandoned run(s) started before {} as failed", n, cutoff);
                n
            }
            Err(e) => {
                warn!("could not reconcile abandoned runs: {}", e);
                0
            }
        }
    }
}
