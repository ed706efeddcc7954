//! Injected logging capability
//!
//! The engine reports "cannot watch" warnings and fatal errors through a
//! [`Log`] it owns. Anything `Fn(Level, fmt::Arguments)` works, so callers can
//! route messages to syslog, stderr, or a test buffer.

use std::fmt;
use tracing::Level;

/// Sink for engine warnings and errors
///
/// Must not block and must not panic; the engine never looks at the outcome.
pub trait Log {
    fn log(&self, level: Level, args: fmt::Arguments<'_>);
}

impl<F> Log for F
where
    F: Fn(Level, fmt::Arguments<'_>),
{
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        self(level, args)
    }
}

/// Forwards to `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl Log for TracingLog {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if level == Level::ERROR {
            tracing::error!("{}", args);
        } else if level == Level::WARN {
            tracing::warn!("{}", args);
        } else if level == Level::INFO {
            tracing::info!("{}", args);
        } else if level == Level::DEBUG {
            tracing::debug!("{}", args);
        } else {
            tracing::trace!("{}", args);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn as_log<F: Fn(Level, fmt::Arguments<'_>)>(f: F) -> F {
        f
    }

    #[test]
    fn test_closure_as_log() {
        let lines = RefCell::new(Vec::new());
        let log = as_log(|level, args| {
            lines.borrow_mut().push(format!("{level}: {args}"));
        });

        let sink: &dyn Log = &log;
        sink.log(Level::WARN, format_args!("cannot watch {:?}", "/x"));
        assert_eq!(lines.borrow().as_slice(), ["WARN: cannot watch \"/x\""]);
    }

    #[test]
    fn test_tracing_log_without_subscriber() {
        // No subscriber installed: must be a silent no-op
        TracingLog.log(Level::ERROR, format_args!("boom"));
    }
}
