//! In-process event bus for the loyalty rail
//!
//! Fan-out is built on `tokio::sync::broadcast` channels, one per topic.
//! The publisher contract is strict: publishing never blocks and never
//! fails, regardless of subscriber state. Consumers that fall behind see
//! `Lagged` on their receiver and catch up from the next event.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bus;
pub mod error;
pub mod event;
pub mod topic;

pub use bus::EventBus;
pub use error::{Error, Result};
pub use event::Event;
pub use topic::Topic;
