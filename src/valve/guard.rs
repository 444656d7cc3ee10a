//! Scoped acquisition of a valve.

use std::ops::{Deref, DerefMut};

use tracing::warn;

use super::base::Valve;
use super::source::Source;
use crate::error::Result;

/// Keeps a valve open for its own lifetime.
///
/// Created by [`Valve::scoped`]. Dropping the guard closes the valve, which
/// releases the source even when the caller bails out mid-iteration. Use
/// [`close`](ValveGuard::close) to observe the close result instead.
pub struct ValveGuard<'a, S: Source> {
    valve: &'a mut Valve<S>,
}

impl<'a, S: Source> ValveGuard<'a, S> {
    pub(super) fn new(valve: &'a mut Valve<S>) -> Self {
        Self { valve }
    }

    /// Close the valve now and report any error.
    pub fn close(self) -> Result<()> {
        if self.valve.is_open() {
            self.valve.close()
        } else {
            Ok(())
        }
    }
}

impl<S: Source> Deref for ValveGuard<'_, S> {
    type Target = Valve<S>;

    fn deref(&self) -> &Self::Target {
        self.valve
    }
}

impl<S: Source> DerefMut for ValveGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.valve
    }
}

impl<S: Source> Drop for ValveGuard<'_, S> {
    fn drop(&mut self) {
        if self.valve.is_open() {
            if let Err(e) = self.valve.close() {
                warn!(error = %e, "Failed to close valve on scope exit");
            }
        }
    }
}
