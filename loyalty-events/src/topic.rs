//! Event topics

use serde::{Deserialize, Serialize};
use std::fmt;

/// Topics published on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    /// A transaction committed (payload: full transaction record)
    TransactionCompleted,
    /// The control loop created a PENDING emission-rate recommendation
    EmissionRecommendationCreated,
    /// An approved recommendation was applied to the emission-rate config
    EmissionRateAdjusted,
    /// The alert monitor raised an economic alert
    EconomicAlertTriggered,
}

impl Topic {
    /// Dotted subject string for this topic
    pub fn subject(&self) -> &'static str {
        match self {
            Topic::TransactionCompleted => "transaction.completed",
            Topic::EmissionRecommendationCreated => "emission.recommendation.created",
            Topic::EmissionRateAdjusted => "emission.rate.adjusted",
            Topic::EconomicAlertTriggered => "economic.alert.triggered",
        }
    }

    /// Parse from a subject string
    pub fn from_subject(s: &str) -> Option<Self> {
        match s {
            "transaction.completed" => Some(Topic::TransactionCompleted),
            "emission.recommendation.created" => Some(Topic::EmissionRecommendationCreated),
            "emission.rate.adjusted" => Some(Topic::EmissionRateAdjusted),
            "economic.alert.triggered" => Some(Topic::EconomicAlertTriggered),
            _ => None,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.subject())
    }
}
