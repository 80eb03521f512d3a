//! `warehouse-etl`: copia incremental de los servicios de usuarios y de juego
//! al data warehouse.
//!
//! - `warehouse-etl run [--source all|user_service|game_service] [--full-load]`
//!   ejecuta una vez y termina.
//! - `warehouse-etl schedule` deja el proceso corriendo con ciclos
//!   periódicos y una carga completa diaria.
//!
//! Toda la configuración se lee de variables de entorno (ver
//! `warehouse_persistence::EtlConfig`).
mod scheduler;
mod telemetry;

use clap::{Parser, Subcommand, ValueEnum};
use etl_core::{RunSummary, SourceSystem};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use warehouse_persistence::{new_service, EtlConfig};

#[derive(Debug, Parser)]
#[command(name = "warehouse-etl", version, about = "ETL from the Mafia platform services into the data warehouse")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the pipeline once and exit.
    Run {
        /// Source system to extract from.
        #[arg(long, value_enum, default_value_t = SourceArg::All)]
        source: SourceArg,
        /// Ignore stored watermarks and re-extract every row.
        #[arg(long)]
        full_load: bool,
    },
    /// Keep running: incremental cycles every ETL_INTERVAL_MINUTES and a full
    /// load daily at ETL_FULL_LOAD_HOUR (UTC).
    Schedule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceArg {
    #[value(name = "all")]
    All,
    #[value(name = "user_service")]
    UserService,
    #[value(name = "game_service")]
    GameService,
}

impl SourceArg {
    fn system(self) -> Option<SourceSystem> {
        match self {
            SourceArg::All => None,
            SourceArg::UserService => Some(SourceSystem::UserService),
            SourceArg::GameService => Some(SourceSystem::GameService),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    // La configuración se lee antes que los logs: ETL_LOG_DIR decide dónde se
    // escriben.
    let config = match EtlConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let _log_guard = match telemetry::init(config.log_dir.as_deref()) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("could not initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match dispatch(cli.command, config) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn dispatch(command: Command, config: EtlConfig) -> anyhow::Result<ExitCode> {
    match command {
        Command::Run { source, full_load } => {
            let service = new_service(config);
            let summary = match source.system() {
                None => service.run(full_load)?,
                Some(s) => service.run_source(s, full_load)?,
            };
            log_summary(&summary);
            // Los fallos por tabla quedan en el ledger y se reintentan; sólo
            // una fuente inalcanzable cambia el código de salida.
            Ok(if summary.all_sources_ran() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Command::Schedule => {
            let schedule = scheduler::Schedule::from_config(&config);
            let service = Arc::new(new_service(config));
            let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
            runtime.block_on(scheduler::run(service, schedule))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Resumen de un disparo: una línea por fuente y el detalle en JSON a nivel
/// debug.
pub(crate) fn log_summary(summary: &RunSummary) {
    for source in &summary.sources {
        let loaded: usize = source.tables.iter().map(|t| t.records_loaded).sum();
        info!(source = %source.source,
              tables = source.tables.len(),
              failed = source.failed_tables(),
              loaded,
              "source finished");
    }
    for failure in &summary.source_failures {
        error!(source = %failure.source, error = %failure.error, "source could not run");
    }
    if summary.reconciled_runs > 0 {
        warn!(count = summary.reconciled_runs, "abandoned runs were closed as failed");
    }
    match serde_json::to_string(summary) {
        Ok(json) => debug!(summary = %json, "run summary"),
        Err(e) => warn!(error = %e, "could not serialize run summary"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults_to_all_sources_incremental() {
        let cli = Cli::try_parse_from(["warehouse-etl", "run"]).unwrap();
        match cli.command {
            Command::Run { source, full_load } => {
                assert_eq!(source, SourceArg::All);
                assert!(!full_load);
                assert_eq!(source.system(), None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn run_accepts_source_names_as_stored_in_the_ledger() {
        let cli = Cli::try_parse_from(["warehouse-etl", "run", "--source", "game_service", "--full-load"]).unwrap();
        match cli.command {
            Command::Run { source, full_load } => {
                assert_eq!(source.system(), Some(SourceSystem::GameService));
                assert!(full_load);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn unknown_source_is_rejected() {
        assert!(Cli::try_parse_from(["warehouse-etl", "run", "--source", "billing"]).is_err());
    }

    #[test]
    fn schedule_takes_no_arguments() {
        let cli = Cli::try_parse_from(["warehouse-etl", "schedule"]).unwrap();
        assert!(matches!(cli.command, Command::Schedule));
    }
}
