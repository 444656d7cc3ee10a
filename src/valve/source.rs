//! Byte source trait for abstracting what a valve reads from.

use crate::error::{Result, ValveError};

/// A producer of raw byte chunks.
///
/// A valve calls [`acquire`](Source::acquire) when it opens,
/// [`release`](Source::release) when it closes, and
/// [`flow_out`](Source::flow_out) once per chunk in between. Sources without
/// an underlying resource can rely on the default `acquire`/`release`.
pub trait Source {
    /// Acquire the underlying resource.
    fn acquire(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release the underlying resource.
    fn release(&mut self) -> Result<()> {
        Ok(())
    }

    /// Produce the next chunk of at most `chunk_size` bytes.
    ///
    /// Returns `Ok(None)` once the source is exhausted.
    fn flow_out(&mut self, chunk_size: usize) -> Result<Option<Vec<u8>>> {
        let _ = chunk_size;
        Err(ValveError::NotImplemented("flow_out"))
    }
}
