//! Emission-rate control loop
//!
//! When the trailing 30-day redemption rate drops below the healthy floor,
//! the controller proposes cutting the BASE emission rate. The proposal is
//! advisory: it sits Pending until an admin approves or rejects it, and only
//! approval touches the rate config. A cooldown keeps the loop from piling
//! up proposals, and stale proposals expire instead of applying.

use crate::{metrics::EconomicMetrics, Error, Result};
use chrono::{DateTime, Duration, Utc};
use loyalty_ledger::{
    types::{
        EmissionRateConfig, EmissionRecommendation, RateType, RecommendationStatus,
    },
    Storage,
};
use loyalty_events::{EventBus, Topic};
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Minimum transactions in the window before the loop acts
pub const MIN_SAMPLE_SIZE: u64 = 100;

/// Healthy floor for the trailing redemption rate
pub const REDEMPTION_THRESHOLD: Decimal = Decimal::from_parts(25, 0, 0, false, 2);

/// Days between consecutive recommendations
pub const COOLDOWN_DAYS: i64 = 7;

/// Smallest fractional cut a recommendation may propose
pub const MIN_ADJUSTMENT: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Largest fractional cut a recommendation may propose
pub const MAX_ADJUSTMENT: Decimal = Decimal::from_parts(20, 0, 0, false, 2);

/// Days until a Pending recommendation can no longer be applied
pub const RECOMMENDATION_EXPIRY_DAYS: i64 = 7;

/// Trailing window the metrics cover
pub const METRICS_WINDOW_DAYS: i64 = 30;

/// The emission-rate controller
pub struct EmissionController {
    storage: Arc<Storage>,
    bus: EventBus,
}

impl EmissionController {
    /// Create the controller
    pub fn new(storage: Arc<Storage>, bus: EventBus) -> Self {
        Self { storage, bus }
    }

    fn current_config(&self) -> Result<EmissionRateConfig> {
        Ok(self
            .storage
            .get_emission_config(RateType::Base)?
            .unwrap_or_else(EmissionRateConfig::default_base))
    }

    /// True when a Pending or Approved recommendation was created inside
    /// the cooldown window
    fn in_cooldown(&self, now: DateTime<Utc>) -> Result<bool> {
        let cutoff = now - Duration::days(COOLDOWN_DAYS);
        let recent = self.storage.list_recommendations()?.into_iter().any(|rec| {
            matches!(
                rec.status,
                RecommendationStatus::Pending | RecommendationStatus::Approved
            ) && rec.created_at > cutoff
        });
        Ok(recent)
    }

    /// Run one emission check
    ///
    /// Returns the new recommendation, or None when the economy is healthy,
    /// the sample is too small, or the cooldown is active.
    pub fn generate_recommendation_if_needed(&self) -> Result<Option<EmissionRecommendation>> {
        let now = Utc::now();
        let metrics = EconomicMetrics::compute(&self.storage, now, METRICS_WINDOW_DAYS)?;

        if metrics.transaction_count < MIN_SAMPLE_SIZE {
            tracing::debug!(
                transaction_count = metrics.transaction_count,
                "Sample too small for emission check"
            );
            return Ok(None);
        }

        if metrics.redemption_rate >= REDEMPTION_THRESHOLD {
            tracing::debug!(
                redemption_rate = %metrics.redemption_rate,
                "Redemption rate healthy"
            );
            return Ok(None);
        }

        if self.in_cooldown(now)? {
            tracing::info!("Emission check skipped: recommendation cooldown active");
            return Ok(None);
        }

        let config = self.current_config()?;
        let adjustment = (REDEMPTION_THRESHOLD - metrics.redemption_rate)
            .clamp(MIN_ADJUSTMENT, MAX_ADJUSTMENT);
        let recommended = (config.emission_rate * (Decimal::ONE - adjustment)).round_dp(4);

        let rec = EmissionRecommendation {
            id: Uuid::now_v7(),
            current_emission_rate: config.emission_rate,
            recommended_emission_rate: recommended,
            adjustment_percentage: adjustment,
            reason: format!(
                "30-day redemption rate {} below threshold {}",
                metrics.redemption_rate.round_dp(4),
                REDEMPTION_THRESHOLD
            ),
            redemption_rate_30d: metrics.redemption_rate,
            metrics_snapshot: serde_json::to_string(&metrics)?,
            status: RecommendationStatus::Pending,
            approved_by: None,
            approved_at: None,
            applied_at: None,
            created_at: now,
            expires_at: now + Duration::days(RECOMMENDATION_EXPIRY_DAYS),
        };

        self.storage.put_recommendation(&rec)?;

        tracing::warn!(
            recommendation_id = %rec.id,
            redemption_rate = %metrics.redemption_rate,
            current_rate = %rec.current_emission_rate,
            recommended_rate = %rec.recommended_emission_rate,
            "Emission rate cut recommended"
        );

        self.bus.publish(
            Topic::EmissionRecommendationCreated,
            json!({
                "id": rec.id,
                "currentEmissionRate": rec.current_emission_rate,
                "recommendedEmissionRate": rec.recommended_emission_rate,
                "adjustmentPercentage": rec.adjustment_percentage,
                "reason": rec.reason,
            }),
        );

        Ok(Some(rec))
    }

    /// Approve and apply a Pending recommendation
    ///
    /// The expiry re-check happens here, at decision time: a stale proposal
    /// is moved to Expired and never applied. The rate config update and the
    /// recommendation transition commit atomically.
    pub fn apply_recommendation(
        &self,
        id: Uuid,
        approved_by: &str,
    ) -> Result<EmissionRecommendation> {
        let mut rec = self
            .storage
            .get_recommendation(id)?
            .ok_or_else(|| loyalty_ledger::Error::NotFound(format!("recommendation {}", id)))?;

        if rec.status != RecommendationStatus::Pending {
            return Err(Error::Ledger(loyalty_ledger::Error::InvalidState(format!(
                "recommendation {} is {:?}, not Pending",
                id, rec.status
            ))));
        }

        let now = Utc::now();
        if rec.is_expired_at(now) {
            rec.status = RecommendationStatus::Expired;
            self.storage.put_recommendation(&rec)?;
            return Err(Error::Ledger(loyalty_ledger::Error::Expired(format!(
                "recommendation {} expired at {}",
                id, rec.expires_at
            ))));
        }

        rec.status = RecommendationStatus::Approved;
        rec.approved_by = Some(approved_by.to_string());
        rec.approved_at = Some(now);
        rec.applied_at = Some(now);

        let mut config = self.current_config()?;
        config.emission_rate = rec.recommended_emission_rate;
        config.last_adjusted_at = Some(now);
        config.last_adjusted_by = Some(approved_by.to_string());

        self.storage.apply_rate_adjustment(&config, &rec)?;

        self.bus.publish(
            Topic::EmissionRateAdjusted,
            json!({
                "recommendationId": rec.id,
                "newEmissionRate": config.emission_rate,
                "approvedBy": approved_by,
            }),
        );

        Ok(rec)
    }

    /// Reject a Pending recommendation
    pub fn reject_recommendation(
        &self,
        id: Uuid,
        rejected_by: &str,
    ) -> Result<EmissionRecommendation> {
        let mut rec = self
            .storage
            .get_recommendation(id)?
            .ok_or_else(|| loyalty_ledger::Error::NotFound(format!("recommendation {}", id)))?;

        if rec.status != RecommendationStatus::Pending {
            return Err(Error::Ledger(loyalty_ledger::Error::InvalidState(format!(
                "recommendation {} is {:?}, not Pending",
                id, rec.status
            ))));
        }

        rec.status = RecommendationStatus::Rejected;
        rec.approved_by = Some(rejected_by.to_string());
        rec.approved_at = Some(Utc::now());
        self.storage.put_recommendation(&rec)?;

        tracing::info!(recommendation_id = %rec.id, rejected_by, "Recommendation rejected");

        Ok(rec)
    }

    /// Stored recommendations, newest first, optionally filtered by status
    pub fn get_recommendations(
        &self,
        status: Option<RecommendationStatus>,
    ) -> Result<Vec<EmissionRecommendation>> {
        let mut recs = self.storage.list_recommendations()?;
        if let Some(status) = status {
            recs.retain(|rec| rec.status == status);
        }
        recs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recs)
    }
}
