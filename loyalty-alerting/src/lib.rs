//! Real-time economic alerting
//!
//! Subscribes to completed transactions, keeps a cached metrics snapshot up
//! to date incrementally, and raises throttled alerts when the economy
//! breaches its health thresholds. The whole path is best-effort: a failure
//! while handling one event is logged and the loop moves on.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod cache;
pub mod error;
pub mod monitor;

pub use cache::{MemoryCache, MetricsCache};
pub use error::{Error, Result};
pub use monitor::{AlertMonitor, MetricsSnapshot};
