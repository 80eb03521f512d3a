// Archivo: errors.rs
// Propósito: errores del protocolo ETL y el alias Result<T> usado por las
// APIs del crate.
use thiserror::Error;

/// Errores comunes del pipeline.
///
/// - `Connection`: no se pudo alcanzar una base de datos fuente o el
///   warehouse. Fatal para la unidad de orquestación que la necesitaba.
/// - `Extract` / `Load`: fallo dentro de una etapa de una tabla.
/// - `Ledger`: fallo al leer o escribir el registro de ejecuciones.
/// - `NotFound` / `Conflict`: uso inválido del registro (p.ej. cerrar dos
///   veces la misma ejecución).
#[derive(Error, Debug)]
pub enum EtlError {
    /// No se pudo establecer la conexión.
    #[error("Error de conexión: {0}")]
    Connection(String),
    /// Error de consulta o datos mal formados durante la extracción.
    #[error("Error de extracción: {0}")]
    Extract(String),
    /// Error al escribir en el warehouse (restricciones, conexión perdida).
    #[error("Error de carga: {0}")]
    Load(String),
    /// Error del registro de ejecuciones.
    #[error("Error del registro de ejecuciones: {0}")]
    Ledger(String),
    /// Entidad no encontrada (por ejemplo, un run_id inexistente).
    #[error("No encontrado: {0}")]
    NotFound(String),
    /// Transición de estado inválida.
    #[error("Conflicto: {0}")]
    Conflict(String),
    /// Configuración inválida o ausente.
    #[error("Error de configuración: {0}")]
    Config(String),
    /// Otro tipo de error.
    #[error("Otro: {0}")]
    Other(String),
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, EtlError>;
