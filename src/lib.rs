//! Stream Valve - metered, chunked byte streams
//!
//! A valve wraps a byte source, hands it out as fixed-size chunks and keeps
//! count of how many chunks and bytes went through and at what rate. Rate
//! limiting plugs in through the [`limiter::Limiter`] trait.

pub mod config;
pub mod error;
pub mod limiter;
pub mod logging;
pub mod report;
pub mod valve;

pub use config::{Settings, ValveConfig};
pub use error::{Result, ValveError};
pub use valve::{FileValve, Valve};
