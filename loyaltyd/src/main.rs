//! Loyalty points daemon
//!
//! Wires the ledger engine, the daily scheduler, and the alert monitor onto
//! one shared event bus and runs until interrupted.

use loyalty_alerting::{AlertMonitor, MemoryCache};
use loyalty_economy::{DailyScheduler, EmissionController};
use loyalty_events::EventBus;
use loyalty_ledger::{audit::AuditService, Config, PointsLedger};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let run_time =
        std::env::var("LOYALTY_DAILY_RUN_TIME").unwrap_or_else(|_| "00:05".to_string());

    let bus = EventBus::default();
    let ledger = PointsLedger::open(&config)?.with_bus(bus.clone());

    let audit = Arc::new(AuditService::new(ledger.storage()).with_metrics(ledger.metrics()));
    let controller = Arc::new(EmissionController::new(ledger.storage(), bus.clone()));
    let scheduler = DailyScheduler::new(audit, controller, &run_time)?;

    let monitor = AlertMonitor::new(ledger.storage(), bus, Arc::new(MemoryCache::new()));

    let scheduler_task = tokio::spawn(scheduler.start());
    let monitor_task = tokio::spawn(monitor.run());

    tracing::info!("loyaltyd running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    scheduler_task.abort();
    monitor_task.abort();
    ledger.shutdown().await?;

    Ok(())
}
