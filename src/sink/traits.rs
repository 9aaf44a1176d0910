//! Event sink trait for Flowstate.

use std::sync::Arc;

use crate::core::PerceptionEvent;
use crate::error::Result;

/// Observer for processed perception events.
///
/// Implementations must not assume their result is acted upon: the engine
/// treats every error as fail-open.
pub trait EventSink: Send + Sync {
    /// Record one validated event.
    fn record(&self, event: &PerceptionEvent) -> Result<()>;

    /// Sink name for logging.
    fn name(&self) -> &'static str;
}

/// Blanket implementation of EventSink for Arc-wrapped sinks.
///
/// Lets tests keep a handle on a sink the engine owns.
impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn record(&self, event: &PerceptionEvent) -> Result<()> {
        (**self).record(event)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Blanket implementation for borrowed sinks.
///
/// Lets a command lend its sink to a short-lived engine.
impl<T: EventSink + ?Sized> EventSink for &T {
    fn record(&self, event: &PerceptionEvent) -> Result<()> {
        (**self).record(event)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Blanket implementation for boxed trait objects.
impl EventSink for Box<dyn EventSink> {
    fn record(&self, event: &PerceptionEvent) -> Result<()> {
        (**self).record(event)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: &PerceptionEvent) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "null"
    }
}
