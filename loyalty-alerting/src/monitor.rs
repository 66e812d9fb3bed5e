//! Real-time alert monitor
//!
//! Consumes `transaction.completed` events and maintains a rolling metrics
//! snapshot in the cache, applying each event incrementally instead of
//! rescanning storage. When the snapshot (with a large enough sample)
//! breaches a health threshold, an alert row is persisted and published,
//! throttled to one per alert type per hour.

use crate::{
    cache::{keys, ttl, MetricsCache},
    Result,
};
use chrono::{DateTime, Utc};
use loyalty_economy::{controller::METRICS_WINDOW_DAYS, EconomicMetrics};
use loyalty_events::{Event, EventBus, Topic};
use loyalty_ledger::{
    types::{AlertSeverity, AlertType, EconomicAlert},
    Storage,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

/// Outstanding-points share above which the liability alert fires
pub const ACTIVE_POINTS_RATIO_THRESHOLD: Decimal = Decimal::from_parts(80, 0, 0, false, 2);

/// Redemption rate below which the engagement alert fires
pub const REDEMPTION_RATE_FLOOR: Decimal = loyalty_economy::controller::REDEMPTION_THRESHOLD;

/// Snapshots with fewer transactions than this never raise alerts
pub const MIN_SAMPLE_SIZE: u64 = loyalty_economy::controller::MIN_SAMPLE_SIZE;

/// Rolling metrics snapshot kept in the cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Points granted to customers
    pub points_issued: u64,

    /// Points redeemed by customers
    pub points_redeemed: u64,

    /// Points burned (expired or revoked), reported by event payloads only
    pub points_burned: u64,

    /// Transactions applied to this snapshot
    pub transaction_count: u64,

    /// `points_redeemed / points_issued`
    pub redemption_rate: Decimal,

    /// `(points_issued - points_redeemed - points_burned) / points_issued`
    pub active_points_ratio: Decimal,

    /// When the snapshot was last recomputed or updated
    pub computed_at: DateTime<Utc>,
}

impl MetricsSnapshot {
    fn from_metrics(metrics: &EconomicMetrics) -> Self {
        let mut snapshot = Self {
            points_issued: metrics.points_issued,
            points_redeemed: metrics.points_redeemed,
            points_burned: 0,
            transaction_count: metrics.transaction_count,
            redemption_rate: Decimal::ZERO,
            active_points_ratio: Decimal::ZERO,
            computed_at: Utc::now(),
        };
        snapshot.recompute_ratios();
        snapshot
    }

    fn recompute_ratios(&mut self) {
        if self.points_issued == 0 {
            self.redemption_rate = Decimal::ZERO;
            self.active_points_ratio = Decimal::ZERO;
            return;
        }

        let issued = Decimal::from(self.points_issued);
        self.redemption_rate = Decimal::from(self.points_redeemed) / issued;

        let outstanding = self
            .points_issued
            .saturating_sub(self.points_redeemed)
            .saturating_sub(self.points_burned);
        self.active_points_ratio = Decimal::from(outstanding) / issued;
    }
}

/// The alerting subscriber
pub struct AlertMonitor {
    storage: Arc<Storage>,
    bus: EventBus,
    cache: Arc<dyn MetricsCache>,
}

impl AlertMonitor {
    /// Create the monitor
    pub fn new(storage: Arc<Storage>, bus: EventBus, cache: Arc<dyn MetricsCache>) -> Self {
        Self { storage, bus, cache }
    }

    /// Consume completed transactions until the bus closes
    ///
    /// Lag drops events; the snapshot self-heals at the next cache expiry,
    /// so lag is a warning, not a failure.
    pub async fn run(self) {
        let mut rx = self.bus.subscribe(Topic::TransactionCompleted);
        tracing::info!("Alert monitor started");

        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Err(e) = self.handle_event(&event) {
                        tracing::error!(event_id = %event.id, error = %e, "Alert handling failed");
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Alert monitor lagged behind the bus");
                }
                Err(RecvError::Closed) => break,
            }
        }

        tracing::info!("Alert monitor stopped");
    }

    /// Apply one completed transaction to the snapshot and check thresholds
    fn handle_event(&self, event: &Event) -> Result<()> {
        let mut snapshot = self.load_snapshot()?;

        let points = event.payload["pointsAmount"].as_u64().unwrap_or(0);
        match event.payload["type"].as_str() {
            Some("EARN") => snapshot.points_issued += points,
            Some("REDEEM") => snapshot.points_redeemed += points,
            other => {
                tracing::warn!(event_id = %event.id, ?other, "Unknown transaction type in event");
            }
        }
        if let Some(burn) = event.payload["burnAmount"].as_u64() {
            snapshot.points_burned += burn;
        }
        snapshot.transaction_count += 1;
        snapshot.recompute_ratios();
        snapshot.computed_at = Utc::now();

        self.cache.set(
            keys::METRICS_SNAPSHOT,
            serde_json::to_string(&snapshot)?,
            ttl::METRICS_SNAPSHOT,
        );

        self.check_thresholds(&snapshot)?;
        Ok(())
    }

    /// Cached snapshot, or a fresh recompute from the trailing window
    fn load_snapshot(&self) -> Result<MetricsSnapshot> {
        if let Some(cached) = self.cache.get(keys::METRICS_SNAPSHOT) {
            match serde_json::from_str(&cached) {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding malformed cached snapshot");
                }
            }
        }

        let metrics = EconomicMetrics::compute(&self.storage, Utc::now(), METRICS_WINDOW_DAYS)?;
        Ok(MetricsSnapshot::from_metrics(&metrics))
    }

    fn check_thresholds(&self, snapshot: &MetricsSnapshot) -> Result<()> {
        if snapshot.transaction_count < MIN_SAMPLE_SIZE {
            return Ok(());
        }

        if snapshot.active_points_ratio > ACTIVE_POINTS_RATIO_THRESHOLD {
            self.raise_alert(
                AlertType::ActivePointsRatioHigh,
                AlertSeverity::Critical,
                format!(
                    "Outstanding points at {} of all points issued (threshold {})",
                    snapshot.active_points_ratio.round_dp(4),
                    ACTIVE_POINTS_RATIO_THRESHOLD
                ),
                snapshot,
            )?;
        }

        if snapshot.redemption_rate < REDEMPTION_RATE_FLOOR {
            self.raise_alert(
                AlertType::RedemptionRateLow,
                AlertSeverity::Warning,
                format!(
                    "Redemption rate at {} (floor {})",
                    snapshot.redemption_rate.round_dp(4),
                    REDEMPTION_RATE_FLOOR
                ),
                snapshot,
            )?;
        }

        Ok(())
    }

    /// Persist and publish one alert, throttled per alert type
    fn raise_alert(
        &self,
        alert_type: AlertType,
        severity: AlertSeverity,
        message: String,
        snapshot: &MetricsSnapshot,
    ) -> Result<()> {
        let suppression_key = keys::alert_suppression(alert_type.code());
        if self.cache.get(&suppression_key).is_some() {
            tracing::debug!(alert_type = %alert_type, "Alert suppressed (throttle window)");
            return Ok(());
        }

        let alert = EconomicAlert {
            id: Uuid::now_v7(),
            alert_type,
            severity,
            message,
            metrics_snapshot: serde_json::to_string(snapshot)?,
            acknowledged: false,
            created_at: Utc::now(),
        };
        self.storage.put_alert(&alert)?;

        // Throttling starts only once the row has landed; if the write
        // fails, the alert type stays eligible to fire on the next event
        self.cache
            .set(&suppression_key, "1".to_string(), ttl::ALERT_SUPPRESSION);

        tracing::warn!(
            alert_id = %alert.id,
            alert_type = %alert_type,
            severity = ?severity,
            message = %alert.message,
            "Economic alert raised"
        );

        self.bus.publish(
            Topic::EconomicAlertTriggered,
            json!({
                "id": alert.id,
                "alertType": alert_type.code(),
                "severity": format!("{:?}", severity).to_uppercase(),
                "message": alert.message,
            }),
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use loyalty_ledger::Config;

    fn monitor_with_bus() -> (AlertMonitor, EventBus, Arc<MemoryCache>, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        let storage = Arc::new(Storage::open(&config).unwrap());
        let bus = EventBus::default();
        let cache = Arc::new(MemoryCache::new());
        let monitor = AlertMonitor::new(storage, bus.clone(), cache.clone());
        (monitor, bus, cache, temp_dir)
    }

    fn earn_event(points: u64) -> Event {
        Event::new(
            Topic::TransactionCompleted,
            json!({"type": "EARN", "pointsAmount": points}),
        )
    }

    fn redeem_event(points: u64) -> Event {
        Event::new(
            Topic::TransactionCompleted,
            json!({"type": "REDEEM", "pointsAmount": points}),
        )
    }

    fn cached_snapshot(cache: &MemoryCache) -> MetricsSnapshot {
        serde_json::from_str(&cache.get(keys::METRICS_SNAPSHOT).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_incremental_snapshot_updates() {
        let (monitor, _bus, cache, _temp) = monitor_with_bus();

        monitor.handle_event(&earn_event(1000)).unwrap();
        monitor.handle_event(&redeem_event(300)).unwrap();

        let snapshot = cached_snapshot(&cache);
        assert_eq!(snapshot.points_issued, 1000);
        assert_eq!(snapshot.points_redeemed, 300);
        assert_eq!(snapshot.transaction_count, 2);
        assert_eq!(snapshot.redemption_rate, Decimal::new(3, 1));
        assert_eq!(snapshot.active_points_ratio, Decimal::new(7, 1));
    }

    #[tokio::test]
    async fn test_burn_amount_applied() {
        let (monitor, _bus, cache, _temp) = monitor_with_bus();

        monitor.handle_event(&earn_event(1000)).unwrap();
        let burn = Event::new(
            Topic::TransactionCompleted,
            json!({"type": "REDEEM", "pointsAmount": 100, "burnAmount": 400}),
        );
        monitor.handle_event(&burn).unwrap();

        let snapshot = cached_snapshot(&cache);
        assert_eq!(snapshot.points_burned, 400);
        // (1000 - 100 - 400) / 1000
        assert_eq!(snapshot.active_points_ratio, Decimal::new(5, 1));
    }

    #[tokio::test]
    async fn test_small_sample_never_alerts() {
        let (monitor, bus, _cache, _temp) = monitor_with_bus();
        let mut alerts = bus.subscribe(Topic::EconomicAlertTriggered);

        // Ratio 1.0 and rate 0.0, but only one transaction
        monitor.handle_event(&earn_event(1000)).unwrap();

        assert!(matches!(
            alerts.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_breach_raises_and_throttles() {
        let (monitor, bus, _cache, _temp) = monitor_with_bus();
        let mut alerts = bus.subscribe(Topic::EconomicAlertTriggered);

        // 150 earns with no redemptions: both thresholds breached once the
        // sample gate opens
        for _ in 0..150 {
            monitor.handle_event(&earn_event(10)).unwrap();
        }

        let first = alerts.recv().await.unwrap();
        assert_eq!(first.payload["alertType"], "ACTIVE_POINTS_RATIO_HIGH");
        let second = alerts.recv().await.unwrap();
        assert_eq!(second.payload["alertType"], "REDEMPTION_RATE_LOW");

        // Every later breach inside the hour is suppressed
        assert!(matches!(
            alerts.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));

        let stored = monitor.storage.list_alerts(10).unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|a| !a.acknowledged));
    }

    #[tokio::test]
    async fn test_suppression_backed_by_persisted_alert() {
        let (monitor, _bus, cache, _temp) = monitor_with_bus();

        // Below the sample gate nothing fires, so no throttle key may exist
        for _ in 0..50 {
            monitor.handle_event(&earn_event(10)).unwrap();
        }
        for alert_type in [AlertType::ActivePointsRatioHigh, AlertType::RedemptionRateLow] {
            assert!(cache.get(&keys::alert_suppression(alert_type.code())).is_none());
        }
        assert!(monitor.storage.list_alerts(10).unwrap().is_empty());

        // Past the gate: every throttle key corresponds to a stored row
        for _ in 0..100 {
            monitor.handle_event(&earn_event(10)).unwrap();
        }
        let stored = monitor.storage.list_alerts(10).unwrap();
        assert_eq!(stored.len(), 2);
        for alert in &stored {
            assert!(cache
                .get(&keys::alert_suppression(alert.alert_type.code()))
                .is_some());
        }
    }

    #[tokio::test]
    async fn test_healthy_economy_stays_quiet() {
        let (monitor, bus, _cache, _temp) = monitor_with_bus();
        let mut alerts = bus.subscribe(Topic::EconomicAlertTriggered);

        // Half of everything issued is redeemed
        for _ in 0..75 {
            monitor.handle_event(&earn_event(100)).unwrap();
            monitor.handle_event(&redeem_event(50)).unwrap();
        }

        assert!(matches!(
            alerts.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
        assert!(monitor.storage.list_alerts(10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_loop_consumes_published_events() {
        let (monitor, bus, cache, _temp) = monitor_with_bus();

        let handle = tokio::spawn(monitor.run());

        // Give the subscriber a beat to attach, then publish
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        bus.publish(
            Topic::TransactionCompleted,
            json!({"type": "EARN", "pointsAmount": 77}),
        );

        // Poll until the snapshot lands
        for _ in 0..50 {
            if cache.get(keys::METRICS_SNAPSHOT).is_some() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        let snapshot = cached_snapshot(&cache);
        assert_eq!(snapshot.points_issued, 77);

        handle.abort();
    }
}
