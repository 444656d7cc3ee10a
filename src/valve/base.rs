//! The metered valve and its chunk iterator.

use std::iter::FusedIterator;

use tracing::{debug, Level};

use super::guard::ValveGuard;
use super::meter::{Meter, MeterSnapshot};
use super::source::Source;
use crate::config::ValveConfig;
use crate::error::{Result, ValveError};

/// A controllable, metered stream of byte chunks from a [`Source`].
///
/// A valve is constructed once and may be opened and closed repeatedly; each
/// `open()` acquires the source and zeroes the meter. Chunks can only be read
/// while open, through [`chunks`](Valve::chunks). The iterator borrows the
/// valve mutably, so a valve has at most one consumer at a time.
#[derive(Debug)]
pub struct Valve<S> {
    config: ValveConfig,
    source: S,
    is_open: bool,
    meter: Meter,
}

impl<S: Source> Valve<S> {
    /// Create a valve over `source`, validating the configuration.
    pub fn with_source(source: S, config: ValveConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            source,
            is_open: false,
            meter: Meter::new(),
        })
    }

    /// Acquire the source, mark the valve open and zero the meter.
    ///
    /// If the source cannot be acquired the valve stays closed and the meter
    /// keeps its previous totals.
    pub fn open(&mut self) -> Result<()> {
        if self.is_open {
            return Err(ValveError::AlreadyOpen);
        }

        self.source.acquire()?;
        self.is_open = true;
        self.meter_zero();

        debug!(chunk_size = self.config.chunk_size, "Valve opened");
        Ok(())
    }

    /// Release the source and mark the valve closed.
    ///
    /// The meter keeps its totals until the next `open()`.
    pub fn close(&mut self) -> Result<()> {
        if !self.is_open {
            return Err(ValveError::NotOpen);
        }

        self.source.release()?;
        self.is_open = false;

        debug!(
            chunks = self.meter.iter_count(),
            bytes = self.meter.size_accumulator(),
            "Valve closed"
        );
        Ok(())
    }

    /// Zero every meter total and restart the clock.
    pub fn meter_zero(&mut self) {
        self.meter.zero();
    }

    /// Open the valve for the lifetime of the returned guard.
    ///
    /// The valve is closed when the guard is dropped, on every exit path.
    pub fn scoped(&mut self) -> Result<ValveGuard<'_, S>> {
        self.open()?;
        Ok(ValveGuard::new(self))
    }

    /// Run `f` with the valve open, closing it afterwards.
    pub fn with_open<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Valve<S>) -> Result<T>,
    {
        let mut guard = self.scoped()?;
        let out = f(&mut *guard)?;
        guard.close()?;
        Ok(out)
    }

    /// Iterate over the remaining chunks.
    ///
    /// Fails with [`ValveError::NotOpen`] unless the valve is open. The
    /// sequence is single-pass: chunks already yielded are not produced again.
    pub fn chunks(&mut self) -> Result<Chunks<'_, S>> {
        if !self.is_open {
            return Err(ValveError::NotOpen);
        }
        Ok(Chunks {
            valve: self,
            done: false,
        })
    }

    /// Pull one chunk from the source and meter it.
    fn pull(&mut self) -> Result<Option<Vec<u8>>> {
        let chunk = match self.source.flow_out(self.config.chunk_size)? {
            Some(chunk) if !chunk.is_empty() => chunk,
            _ => return Ok(None),
        };

        let rate = self.meter.record(chunk.len());
        if self.config.debug {
            if let Some(rate) = rate {
                self.log(&format!("rate: {:.2} bytes/s", rate), Level::INFO);
            }
        }

        Ok(Some(chunk))
    }

    /// Forward `msg` to the configured logger, or print it when there is
    /// none, it has gone away, or it filters out `level`.
    pub fn log(&self, msg: &str, level: Level) {
        if !self.forward(msg, level) {
            println!("{} {}", level, msg);
        }
    }

    fn forward(&self, msg: &str, level: Level) -> bool {
        self.config
            .logger
            .as_ref()
            .is_some_and(|logger| logger.emit(level, msg))
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn config(&self) -> &ValveConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn iter_count(&self) -> u64 {
        self.meter.iter_count()
    }

    pub fn size_accumulator(&self) -> u64 {
        self.meter.size_accumulator()
    }

    pub fn time_accumulator(&self) -> f64 {
        self.meter.time_accumulator()
    }

    /// Observed bytes per second since the last `open()`.
    pub fn rate(&self) -> Option<f64> {
        self.meter.rate()
    }

    pub fn meter(&self) -> MeterSnapshot {
        self.meter.snapshot()
    }
}

/// Iterator over the chunks of an open valve.
///
/// A read error is yielded once, after which the iterator is exhausted.
pub struct Chunks<'a, S: Source> {
    valve: &'a mut Valve<S>,
    done: bool,
}

impl<S: Source> Iterator for Chunks<'_, S> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.valve.pull() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<S: Source> FusedIterator for Chunks<'_, S> {}
