// Archivo: table.rs
// Propósito: contrato por tabla (extract / transform / load) y su versión
// con borrado de tipos que usan los orquestadores.
use crate::domain::Watermark;
use crate::errors::{EtlError, Result};

/// Pipeline de una tabla: cómo extraer, transformar y cargar sus filas.
///
/// `S` es la conexión a la base fuente y `W` la conexión al warehouse.
pub trait TablePipeline<S, W> {
    /// Fila tal como se lee de la tabla fuente.
    type SourceRow;
    /// Fila con la forma de la tabla del warehouse.
    type WarehouseRow;

    /// Nombre de la tabla destino; también es la clave en el registro de
    /// ejecuciones.
    fn table_name(&self) -> &'static str;

    /// Lee las filas cambiadas desde `since` (estrictamente mayor), en orden
    /// ascendente por campo de cambios, o todas si `since` es `None`. El
    /// resultado está materializado: no se mantiene un cursor abierto.
    fn extract(&self, source: &mut S, since: Option<Watermark>) -> Result<Vec<Self::SourceRow>>;

    /// Valor del campo de seguimiento de cambios de una fila.
    fn change_marker(&self, row: &Self::SourceRow) -> Watermark;

    /// Transformación pura, sin I/O.
    fn transform(&self, row: &Self::SourceRow) -> Self::WarehouseRow;

    /// Carga idempotente. Todas las filas se confirman como una unidad o
    /// ninguna. Con `rows` vacío devuelve 0 sin usar la conexión.
    fn load(&self, warehouse: &mut W, rows: &[Self::WarehouseRow]) -> Result<usize>;
}

/// Etapa en la que falló una tabla.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Load,
}

/// Resultado de mover una tabla completa.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub extracted: usize,
    pub loaded: usize,
    /// Máximo valor del campo de cambios en el lote; `None` si el lote
    /// estaba vacío.
    pub latest_change: Option<Watermark>,
}

/// Fallo de una etapa, con lo que alcanzó a extraerse.
#[derive(Debug)]
pub struct StageFailure {
    pub stage: Stage,
    pub extracted: usize,
    pub error: EtlError,
}

/// Versión object-safe de `TablePipeline`, para listas heterogéneas de
/// tablas. Se implementa automáticamente para todo `TablePipeline`.
pub trait TableJob<S, W> {
    fn name(&self) -> &'static str;

    /// Extrae, transforma y carga. No toca el registro de ejecuciones.
    fn transfer(&self, source: &mut S, warehouse: &mut W, since: Option<Watermark>)
                -> std::result::Result<Transfer, StageFailure>;
}

impl<S, W, T> TableJob<S, W> for T where T: TablePipeline<S, W>
{
    fn name(&self) -> &'static str {
        <T as TablePipeline<S, W>>::table_name(self)
    }

    fn transfer(&self, source: &mut S, warehouse: &mut W, since: Option<Watermark>)
                -> std::result::Result<Transfer, StageFailure> {
        let rows = self.extract(source, since)
                       .map_err(|error| StageFailure { stage: Stage::Extract, extracted: 0, error })?;
        let extracted = rows.len();
        // max en lugar del último: en carga completa el orden es por fecha de
        // creación y no coincide con el campo de cambios.
        let latest_change = rows.iter().map(|r| self.change_marker(r)).max();
        let transformed: Vec<<T as TablePipeline<S, W>>::WarehouseRow> = rows.iter().map(|r| self.transform(r)).collect();
        let loaded = if transformed.is_empty() {
            0
        } else {
            self.load(warehouse, &transformed)
                .map_err(|error| StageFailure { stage: Stage::Load, extracted, error })?
        };
        Ok(Transfer { extracted, loaded, latest_change })
    }
}
