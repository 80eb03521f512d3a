// Archivo: source.rs
// Propósito: orquestador de un sistema fuente. Ejecuta su lista fija de
// tablas, en orden y de forma secuencial, sobre una conexión propia.
use crate::domain::{LoadMode, SourceSystem};
use crate::engine::{PipelineEngine, TableReport};
use crate::errors::Result;
use crate::ledger::RunLedger;
use crate::table::TableJob;
use log::{error, info};
use serde::{Deserialize, Serialize};

/// Resultado de todas las tablas de una fuente.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: SourceSystem,
    pub tables: Vec<TableReport>,
}

impl SourceReport {
    pub fn failed_tables(&self) -> usize {
        self.tables.iter().filter(|t| !t.is_success()).count()
    }
}

/// Lista ordenada de tablas de un sistema fuente.
pub struct SourcePlan<S, W> {
    source: SourceSystem,
    tables: Vec<Box<dyn TableJob<S, W>>>,
}

impl<S, W> SourcePlan<S, W> where W: RunLedger
{
    pub fn new(source: SourceSystem, tables: Vec<Box<dyn TableJob<S, W>>>) -> Self {
        Self { source, tables }
    }

    /// Nombres de las tablas, en orden de ejecución.
    pub fn table_names(&self) -> Vec<&'static str> {
        self.tables.iter().map(|t| t.name()).collect()
    }

    /// Abre la conexión de la fuente con `connect`, ejecuta cada tabla y
    /// libera la conexión al salir, haya fallos o no.
    ///
    /// Un error de conexión se propaga (fatal para esta fuente). Los errores
    /// de una tabla se registran y no impiden ejecutar las siguientes.
    pub fn run<F>(&self, engine: &PipelineEngine, connect: F, warehouse: &mut W, mode: LoadMode) -> Result<SourceReport>
        where F: FnOnce(SourceSystem) -> Result<S>
    {
        info!("starting {} ETL ({} load)", self.source, mode);
        let mut conn = connect(self.source).map_err(|e| {
                                                 error!("failed to connect to {}: {}", self.source, e);
                                                 e
                                             })?;

        let mut tables = Vec::with_capacity(self.tables.len());
        for job in &self.tables {
            match engine.run_table(self.source, job.as_ref(), &mut conn, warehouse, mode) {
                Ok(report) => tables.push(report),
                Err(e) => {
                    error!("{}.{}: pipeline aborted: {}", self.source, job.name(), e);
                    tables.push(TableReport::aborted(self.source, job.name(), &e));
                }
            }
        }
        drop(conn);

        let report = SourceReport { source: self.source, tables };
        info!("{} ETL completed ({} of {} tables failed)",
              self.source,
              report.failed_tables(),
              report.tables.len());
        Ok(report)
    }
}
