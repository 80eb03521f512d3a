//! Crate `etl-core`: protocolo de extracción incremental y carga idempotente
//!
//! Este crate define los tipos del registro de ejecuciones (`RunRecord`,
//! `RunOutcome`, `RunStatus`), el contrato `RunLedger`, el contrato por tabla
//! `TablePipeline` y los orquestadores que los combinan:
//!
//! - `PipelineEngine`: ejecuta una tabla (ledger → extract → transform →
//!   load → ledger) aislando el fallo a esa tabla.
//! - `SourcePlan`: lista ordenada de tablas de un sistema fuente; abre y
//!   cierra su propia conexión.
//! - `EtlService`: punto de entrada del disparador (`run` / `run_source`).
//!
//! El crate no conoce ninguna base de datos concreta: las conexiones son
//! tipos genéricos que aporta un `EtlBackend`. `InMemoryRunLedger` sirve
//! para pruebas y wiring rápido.
//!
//! Ejemplo rápido:
//! ```rust
//! use etl_core::{InMemoryRunLedger, RunLedger, RunOutcome, SourceSystem};
//! let mut ledger = InMemoryRunLedger::new();
//! let run = ledger.start_run(SourceSystem::UserService, "dim_users").unwrap();
//! let ts = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! ledger.end_run(run, &RunOutcome::success(3, 3, ts)).unwrap();
//! assert_eq!(ledger.get_watermark(SourceSystem::UserService, "dim_users").unwrap(), Some(ts));
//! ```
pub mod domain;
pub mod engine;
pub mod errors;
pub mod ledger;
pub mod service;
pub mod source;
pub mod stubs;
pub mod table;

pub use domain::*;
pub use engine::*;
pub use errors::*;
pub use ledger::*;
pub use service::*;
pub use source::*;
pub use stubs::*;
pub use table::*;
