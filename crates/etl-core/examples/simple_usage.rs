use chrono::{Duration, NaiveDate};
use etl_core::errors::EtlError;
use etl_core::{InMemoryRunLedger, RunLedger, RunOutcome, SourceSystem};

fn main() -> Result<(), EtlError> {
    let mut ledger = InMemoryRunLedger::new();
    let table = "dim_users";
    let source = SourceSystem::UserService;

    // Primera ejecución: sin marca previa, equivale a carga completa
    println!("watermark before first run: {:?}", ledger.get_watermark(source, table)?);
    let first = ledger.start_run(source, table)?;
    let t0 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
    ledger.end_run(first, &RunOutcome::success(3, 3, t0))?;
    println!("run {} finished, watermark {:?}", first, ledger.get_watermark(source, table)?);

    // Una ejecución fallida no mueve la marca
    let second = ledger.start_run(source, table)?;
    ledger.end_run(second, &RunOutcome::failed(2, "connection reset by peer"))?;
    println!("run {} failed, watermark still {:?}", second, ledger.get_watermark(source, table)?);

    // Cerrar dos veces la misma ejecución es un conflicto
    match ledger.end_run(second, &RunOutcome::success(0, 0, t0)) {
        Err(e) => println!("second end_run rejected: {}", e),
        Ok(()) => println!("unexpected: run {} finalized twice", second),
    }

    // Una ejecución colgada se reconcilia como fallida
    let _stuck = ledger.start_run(source, table)?;
    let closed = ledger.reconcile_stale_runs(etl_core::utc_now() + Duration::minutes(1))?;
    println!("reconciled {} abandoned run(s)", closed);

    for r in ledger.recent_runs(source, table, 10)? {
        println!("{:>3} {:<8} extracted={} loaded={} watermark={:?} error={:?}",
                 r.run_id, r.status, r.records_extracted, r.records_loaded, r.last_extracted_timestamp, r.error_message);
    }
    Ok(())
}
