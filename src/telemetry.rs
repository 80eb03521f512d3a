// Archivo: telemetry.rs
// Propósito: instalar el subscriber de `tracing` para el binario. Los crates
// de librería registran con `log`; `LogTracer` los reenvía aquí.
use std::path::Path;
use tracing::subscriber::set_global_default;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

const LOG_FILE_PREFIX: &str = "etl_pipeline";
const LOG_FILE_SUFFIX: &str = "log";

/// Configura la salida de logs: consola siempre y, si hay `log_dir`, además
/// el archivo `etl_pipeline.log` en ese directorio.
///
/// El nivel sale de `RUST_LOG` (por defecto `info`). Con archivo, el
/// `WorkerGuard` devuelto debe vivir hasta el final de `main` para que se
/// vacíe el buffer.
pub fn init(log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    LogTracer::init()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let console = fmt::layer().with_target(false);

    match log_dir {
        Some(dir) => {
            let appender = Builder::new().rotation(Rotation::NEVER)
                                         .filename_prefix(LOG_FILE_PREFIX)
                                         .filename_suffix(LOG_FILE_SUFFIX)
                                         .build(dir)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = fmt::layer().with_ansi(false).with_target(false).with_writer(writer);
            set_global_default(Registry::default().with(filter).with(console).with(file))?;
            Ok(Some(guard))
        }
        None => {
            set_global_default(Registry::default().with(filter).with(console))?;
            Ok(None)
        }
    }
}
