// Archivo: scheduler.rs
// Propósito: modo `schedule`. Un ciclo incremental al arrancar, otro cada
// intervalo y una carga completa diaria a la hora configurada (UTC). Los
// ciclos nunca se solapan: cada uno se espera antes de volver a escuchar.
use crate::log_summary;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use etl_core::{EtlService, LoadMode, Scope};
use std::sync::Arc;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{error, info};
use warehouse_persistence::{DieselBackend, EtlConfig};

/// Cadencia del planificador.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schedule {
    pub interval: std::time::Duration,
    pub full_load_hour: u32,
}

impl Schedule {
    pub fn from_config(config: &EtlConfig) -> Self {
        Self { interval: std::time::Duration::from_secs(config.interval_minutes.saturating_mul(60)),
               full_load_hour: config.full_load_hour }
    }
}

/// Próxima `hour:00` UTC estrictamente posterior a `now`.
pub fn next_full_load_after(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let at = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(at).and_utc();
    if today > now { today } else { today + Duration::days(1) }
}

/// Si la carga completa ya venció en `now`, devuelve el siguiente plazo.
/// El plazo es absoluto: un ciclo que cruza la hora no lo desplaza, la
/// carga completa se ejecuta al terminar ese ciclo.
pub fn full_load_due(now: DateTime<Utc>, deadline: DateTime<Utc>, hour: u32) -> Option<DateTime<Utc>> {
    (now >= deadline).then(|| next_full_load_after(now, hour))
}

/// Bucle principal. Termina con SIGINT/SIGTERM, siempre después de que el
/// ciclo en curso haya acabado.
pub async fn run(service: Arc<EtlService<DieselBackend>>, schedule: Schedule) -> anyhow::Result<()> {
    let mut shutdown = Shutdown::install()?;
    info!(interval_secs = schedule.interval.as_secs(),
          full_load_hour = schedule.full_load_hour,
          "ETL scheduler started");

    let mut next_full = next_full_load_after(Utc::now(), schedule.full_load_hour);
    run_cycle(&service, LoadMode::Incremental).await;

    let mut ticker = interval_at(Instant::now() + schedule.interval, schedule.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        let full_at = Instant::now() + (next_full - Utc::now()).to_std().unwrap_or_default();
        tokio::select! {
            biased;
            _ = shutdown.wait() => {
                info!("shutdown signal received, stopping scheduler");
                break;
            }
            _ = sleep_until(full_at) => {}
            _ = ticker.tick() => run_cycle(&service, LoadMode::Incremental).await,
        }
        if let Some(following) = full_load_due(Utc::now(), next_full, schedule.full_load_hour) {
            next_full = following;
            run_cycle(&service, LoadMode::Full).await;
        }
    }
    Ok(())
}

/// Ejecuta un ciclo en un hilo bloqueante. Un fallo se registra y nunca
/// detiene el planificador.
async fn run_cycle(service: &Arc<EtlService<DieselBackend>>, mode: LoadMode) {
    info!(%mode, "scheduled ETL cycle starting");
    let svc = Arc::clone(service);
    match tokio::task::spawn_blocking(move || svc.trigger(Scope::All, mode)).await {
        Ok(Ok(summary)) => log_summary(&summary),
        Ok(Err(e)) => error!(%mode, error = %e, "scheduled ETL cycle failed"),
        Err(e) => error!(%mode, error = %e, "scheduled ETL cycle panicked"),
    }
}

/// Señales de parada, registradas antes del primer ciclo para no perder una
/// que llegue mientras se ejecuta.
struct Shutdown {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl Shutdown {
    #[cfg(unix)]
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self { interrupt: signal(SignalKind::interrupt())?, terminate: signal(SignalKind::terminate())? })
    }

    #[cfg(not(unix))]
    fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }

    #[cfg(unix)]
    async fn wait(&mut self) {
        tokio::select! {
            _ = self.interrupt.recv() => {}
            _ = self.terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    async fn wait(&mut self) {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, h, m, s).unwrap()
    }

    fn until_full(now: DateTime<Utc>, hour: u32) -> Duration {
        next_full_load_after(now, hour) - now
    }

    #[test]
    fn full_load_later_today() {
        assert_eq!(until_full(utc(0, 30, 0), 2), Duration::minutes(90));
    }

    #[test]
    fn full_load_tomorrow_once_the_hour_has_passed() {
        assert_eq!(until_full(utc(2, 0, 1), 2), Duration::hours(24) - Duration::seconds(1));
        assert_eq!(until_full(utc(23, 0, 0), 2), Duration::hours(3));
    }

    #[test]
    fn exactly_on_the_hour_waits_a_full_day() {
        assert_eq!(until_full(utc(2, 0, 0), 2), Duration::days(1));
    }

    #[test]
    fn midnight_full_load() {
        assert_eq!(until_full(utc(12, 0, 0), 0), Duration::hours(12));
    }

    #[test]
    fn full_load_not_due_before_deadline() {
        let deadline = next_full_load_after(utc(1, 0, 0), 2);
        assert_eq!(full_load_due(utc(1, 59, 59), deadline, 2), None);
    }

    #[test]
    fn cycle_crossing_the_hour_still_runs_full_load() {
        // Ciclo incremental de 01:59:30 a 02:00:30.
        let deadline = next_full_load_after(utc(1, 59, 30), 2);
        assert_eq!(deadline, utc(2, 0, 0));

        let following = full_load_due(utc(2, 0, 30), deadline, 2);
        assert_eq!(following, Some(utc(2, 0, 0) + Duration::days(1)));
    }

    #[test]
    fn full_load_due_exactly_at_deadline() {
        let deadline = utc(2, 0, 0);
        assert_eq!(full_load_due(deadline, deadline, 2), Some(deadline + Duration::days(1)));
    }

    #[test]
    fn schedule_reads_minutes_from_config() {
        let config = EtlConfig::from_lookup(|key| match key {
                                                "ETL_INTERVAL_MINUTES" => Some("15".to_string()),
                                                "ETL_FULL_LOAD_HOUR" => Some("4".to_string()),
                                                _ => None,
                                            }).unwrap();
        let schedule = Schedule::from_config(&config);
        assert_eq!(schedule.interval, std::time::Duration::from_secs(900));
        assert_eq!(schedule.full_load_hour, 4);
    }
}
