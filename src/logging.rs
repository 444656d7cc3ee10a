//! Logging sink references and subscriber setup.
//!
//! A [`Logger`] is a named, non-owning handle to a `tracing` dispatcher. Valves
//! hold one to forward their output without keeping the subscriber alive; once
//! the subscriber is gone the valve falls back to printing on the console.

use std::fmt;
use std::sync::Arc;

use tracing::dispatcher::{self, Dispatch, WeakDispatch};
use tracing::subscriber::NoSubscriber;
use tracing::{debug, error, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, Settings};
use crate::error::{Result, ValveError};

/// A named, weak reference to a logging sink.
#[derive(Clone)]
pub struct Logger {
    /// Name recorded on every forwarded event
    name: Arc<str>,
    /// Dispatcher the events are forwarded to
    dispatch: WeakDispatch,
}

impl Logger {
    /// Create a logger that forwards to the given dispatcher.
    pub fn new(name: impl Into<Arc<str>>, dispatch: &Dispatch) -> Self {
        Self {
            name: name.into(),
            dispatch: dispatch.downgrade(),
        }
    }

    /// Create a logger bound to the dispatcher that is currently in effect.
    ///
    /// Returns `None` when no subscriber has been installed, since events sent
    /// there would be silently discarded.
    pub fn current(name: impl Into<Arc<str>>) -> Option<Self> {
        let dispatch = dispatcher::get_default(|d| d.clone());
        if dispatch.is::<NoSubscriber>() {
            return None;
        }
        Some(Self::new(name, &dispatch))
    }

    /// Create a logger named after the configured logger name.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        Self::current(settings.logger_name.as_str())
    }

    /// The logger name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the underlying subscriber is still alive.
    pub fn is_attached(&self) -> bool {
        self.dispatch.upgrade().is_some()
    }

    /// Forward a message at the given level.
    ///
    /// Returns `false` without emitting anything if the subscriber has been
    /// dropped or its filter rejects events at `level`, so the caller can
    /// print the message itself.
    pub fn emit(&self, level: Level, msg: &str) -> bool {
        let Some(dispatch) = self.dispatch.upgrade() else {
            return false;
        };

        let name = &*self.name;
        macro_rules! forward {
            ($level:ident, $event:ident) => {
                if tracing::enabled!(Level::$level) {
                    $event!(logger = name, "{}", msg);
                    true
                } else {
                    false
                }
            };
        }

        dispatcher::with_default(&dispatch, || {
            if level == Level::ERROR {
                forward!(ERROR, error)
            } else if level == Level::WARN {
                forward!(WARN, warn)
            } else if level == Level::INFO {
                forward!(INFO, info)
            } else if level == Level::DEBUG {
                forward!(DEBUG, debug)
            } else {
                forward!(TRACE, trace)
            }
        })
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Install the process-wide subscriber described by the settings.
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(settings: &Settings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match settings.log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|e| ValveError::Config(format!("Failed to install subscriber: {}", e)))
}


#[cfg(test)]
mod tests {
    use super::test_support::{capturing_dispatch, capturing_dispatch_at};
    use super::*;

    #[test]
    fn test_logger_forwards_to_dispatch() {
        let (dispatch, output) = capturing_dispatch();
        let logger = Logger::new("stream-valve", &dispatch);

        assert!(logger.emit(Level::INFO, "hello"));
        assert!(logger.emit(Level::WARN, "careful"));

        let contents = output.contents();
        assert!(contents.contains("hello"));
        assert!(contents.contains("careful"));
        assert!(contents.contains("stream-valve"));
    }

    #[test]
    fn test_logger_does_not_own_dispatch() {
        let (dispatch, _output) = capturing_dispatch();
        let logger = Logger::new("stream-valve", &dispatch);
        assert!(logger.is_attached());

        drop(dispatch);

        assert!(!logger.is_attached());
        assert!(!logger.emit(Level::INFO, "lost"));
    }

    #[test]
    fn test_filtered_level_is_not_forwarded() {
        let (dispatch, output) = capturing_dispatch_at(Level::INFO);
        let logger = Logger::new("stream-valve", &dispatch);

        assert!(!logger.emit(Level::DEBUG, "too chatty"));
        assert!(logger.emit(Level::INFO, "kept"));

        let contents = output.contents();
        assert!(!contents.contains("too chatty"));
        assert!(contents.contains("kept"));
    }

    #[test]
    fn test_current_uses_scoped_default() {
        let (dispatch, output) = capturing_dispatch();

        let logger = dispatcher::with_default(&dispatch, || Logger::current("scoped"));
        let logger = logger.expect("a scoped subscriber is installed");

        assert_eq!(logger.name(), "scoped");
        logger.emit(Level::ERROR, "boom");
        assert!(output.contents().contains("boom"));
    }
}
