//! Metered byte valves.
//!
//! A [`Valve`] wraps a [`Source`] and hands out its bytes as fixed-size
//! chunks while metering how many chunks and bytes went through and how fast.
//! [`FileValve`] is the file-backed valve; new sources plug in by
//! implementing [`Source`].

mod base;
mod file;
mod guard;
mod meter;
mod source;

pub use base::{Chunks, Valve};
pub use file::{FileSource, FileValve};
pub use guard::ValveGuard;
pub use meter::{Meter, MeterSnapshot};
pub use source::Source;
