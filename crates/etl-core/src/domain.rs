// Archivo: domain.rs
// Propósito: tipos de dominio del registro de ejecuciones (run ledger) y del
// disparador: sistemas fuente, estados, registros y resultados de una
// ejecución.
use crate::errors::EtlError;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marca de agua de extracción: valor del campo de cambios (`updatedAt`,
/// `createdAt`, ...) hasta el cual ya se extrajo. Siempre en UTC.
pub type Watermark = NaiveDateTime;

/// Identificador de una ejecución, asignado por el warehouse.
pub type RunId = i64;

/// Instante actual en UTC, con la misma representación que `Watermark`.
pub fn utc_now() -> Watermark {
    Utc::now().naive_utc()
}

/// Sistemas operacionales de los que se extraen datos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSystem {
    UserService,
    GameService,
}

impl SourceSystem {
    /// Todas las fuentes, en el orden en que se ejecutan.
    pub const ALL: [SourceSystem; 2] = [SourceSystem::UserService, SourceSystem::GameService];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceSystem::UserService => "user_service",
            SourceSystem::GameService => "game_service",
        }
    }
}

impl fmt::Display for SourceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceSystem {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_service" => Ok(SourceSystem::UserService),
            "game_service" => Ok(SourceSystem::GameService),
            other => Err(EtlError::Config(format!("fuente desconocida: {}", other))),
        }
    }
}

/// Estado de un registro de ejecución. `Running` es el único estado no
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "success" => Ok(RunStatus::Success),
            "failed" => Ok(RunStatus::Failed),
            other => Err(EtlError::Ledger(format!("estado desconocido: {}", other))),
        }
    }
}

/// Modo de refresco solicitado por el disparador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Extrae sólo las filas cambiadas desde la marca de agua.
    Incremental,
    /// Extrae todas las filas, ignorando el historial.
    Full,
}

impl LoadMode {
    pub fn from_full_load(full_load: bool) -> Self {
        if full_load {
            LoadMode::Full
        } else {
            LoadMode::Incremental
        }
    }
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadMode::Incremental => f.write_str("incremental"),
            LoadMode::Full => f.write_str("full"),
        }
    }
}

/// Registro durable de un intento de ETL para (fuente, tabla).
///
/// Se crea en `Running` al comenzar y recibe exactamente una actualización
/// terminal. Nunca se borra.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: RunId,
    pub source_system: SourceSystem,
    pub table_name: String,
    pub run_start_time: NaiveDateTime,
    pub run_end_time: Option<NaiveDateTime>,
    pub status: RunStatus,
    pub records_extracted: i64,
    pub records_loaded: i64,
    /// Nueva marca de agua; sólo presente en ejecuciones exitosas.
    pub last_extracted_timestamp: Option<Watermark>,
    pub error_message: Option<String>,
}

/// Campos terminales que `end_run` escribe sobre un registro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub records_extracted: usize,
    pub records_loaded: usize,
    pub watermark: Option<Watermark>,
    pub error: Option<String>,
}

impl RunOutcome {
    /// Ejecución exitosa que avanza la marca de agua.
    pub fn success(records_extracted: usize, records_loaded: usize, watermark: Watermark) -> Self {
        Self { status: RunStatus::Success,
               records_extracted,
               records_loaded,
               watermark: Some(watermark),
               error: None }
    }

    /// Ejecución fallida: nunca lleva marca de agua, de modo que la anterior
    /// sigue siendo la autoritativa.
    pub fn failed(records_extracted: usize, error: impl Into<String>) -> Self {
        Self { status: RunStatus::Failed,
               records_extracted,
               records_loaded: 0,
               watermark: None,
               error: Some(error.into()) }
    }
}

/// Convierte un conteo a la columna `BIGINT` del registro.
pub fn count_to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_system_roundtrips_through_str() {
        for s in SourceSystem::ALL {
            assert_eq!(s.as_str().parse::<SourceSystem>().unwrap(), s);
        }
        assert!("billing".parse::<SourceSystem>().is_err());
    }

    #[test]
    fn failed_outcome_never_carries_watermark() {
        let o = RunOutcome::failed(7, "boom");
        assert_eq!(o.status, RunStatus::Failed);
        assert_eq!(o.records_extracted, 7);
        assert_eq!(o.records_loaded, 0);
        assert!(o.watermark.is_none());
    }
}
