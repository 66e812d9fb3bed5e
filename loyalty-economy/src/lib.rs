//! Economic control loop for the points economy
//!
//! Watches the trailing transaction window and proposes emission-rate cuts
//! when redemption falls below the healthy floor. Recommendations are
//! advisory: a human approves or rejects them, and only approval mutates
//! the rate config. A daily scheduler drives the audit seal and the
//! emission check.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod controller;
pub mod error;
pub mod metrics;
pub mod scheduler;

pub use controller::EmissionController;
pub use error::{Error, Result};
pub use metrics::EconomicMetrics;
pub use scheduler::DailyScheduler;
