//! Daily job scheduler
//!
//! Ticks every 30 seconds and fires once per UTC day at the configured
//! time: first the audit seal for the day that just ended, then the
//! emission check. Job failures are logged and retried the next day, never
//! propagated out of the loop.

use crate::{EmissionController, Error, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use loyalty_ledger::audit::AuditService;
use std::sync::Arc;
use tracing::{info, warn};

const TICK_SECONDS: u64 = 30;

/// Daily scheduler for the audit seal and the emission check
pub struct DailyScheduler {
    audit: Arc<AuditService>,
    controller: Arc<EmissionController>,
    run_time: NaiveTime,
    last_run: Option<NaiveDate>,
}

impl DailyScheduler {
    /// Create a scheduler firing at `run_time` ("%H:%M", UTC) every day
    pub fn new(
        audit: Arc<AuditService>,
        controller: Arc<EmissionController>,
        run_time: &str,
    ) -> Result<Self> {
        let run_time = NaiveTime::parse_from_str(run_time, "%H:%M")
            .map_err(|e| Error::InvalidRunTime(format!("'{}': {}", run_time, e)))?;

        Ok(Self {
            audit,
            controller,
            run_time,
            last_run: None,
        })
    }

    /// True when the configured time has passed and today's run is pending
    fn should_run(&self, now: DateTime<Utc>) -> bool {
        now.time() >= self.run_time && self.last_run != Some(now.date_naive())
    }

    /// Run both daily jobs for the day `now` falls on
    ///
    /// Each job fails independently; one failing never skips the other.
    pub fn run_once(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        self.last_run = Some(today);

        if let Some(yesterday) = today.pred_opt() {
            match self.audit.generate_daily_hash(yesterday) {
                Ok(sealed) => {
                    info!(date = %yesterday, entry_count = sealed.entry_count, "Daily seal done");
                }
                Err(e) => warn!(date = %yesterday, error = %e, "Daily seal failed"),
            }
        }

        match self.controller.generate_recommendation_if_needed() {
            Ok(Some(rec)) => {
                info!(recommendation_id = %rec.id, "Emission check produced a recommendation");
            }
            Ok(None) => {
                info!("Emission check: no action needed");
            }
            Err(e) => warn!(error = %e, "Emission check failed"),
        }
    }

    /// Run the scheduler loop forever
    pub async fn start(mut self) {
        info!(run_time = %self.run_time, "Daily scheduler started");

        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(TICK_SECONDS));

        loop {
            interval.tick().await;

            let now = Utc::now();
            if self.should_run(now) {
                self.run_once(now);
            }
        }
    }
}
