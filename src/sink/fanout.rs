//! Fan-out sink wrapper.
//!
//! Forwards each event to every inner sink. A failing sink does not stop
//! the others from receiving the event. Failures are reported once, as a
//! single error naming every failing sink; logging is left to the caller.

use crate::core::PerceptionEvent;
use crate::error::{FlowError, Result};
use crate::sink::traits::EventSink;

/// Sink that forwards to several sinks in order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style add.
    pub fn with(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn push(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Names of the inner sinks, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }
}

impl EventSink for FanoutSink {
    /// Tries every sink, then fails if any of them did.
    fn record(&self, event: &PerceptionEvent) -> Result<()> {
        let failures: Vec<String> = self
            .sinks
            .iter()
            .filter_map(|sink| {
                sink.record(event)
                    .err()
                    .map(|e| format!("'{}' failed: {}", sink.name(), e))
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(FlowError::sink(format!(
                "{} of {} sinks failed for event {}: {}",
                failures.len(),
                self.sinks.len(),
                event.id(),
                failures.join("; ")
            )))
        }
    }

    fn name(&self) -> &'static str {
        "fanout"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Domain, FlowEngine};
    use crate::sink::memory::MemorySink;
    use crate::sink::traits::tests::{capture_logs, sample_event, FailingSink};
    use crate::sink::traits::NullSink;
    use std::sync::Arc;

    #[test]
    fn test_empty_fanout_accepts() {
        let sink = FanoutSink::new();
        assert!(sink.is_empty());
        assert!(sink.record(&sample_event(Domain::Game)).is_ok());
    }

    #[test]
    fn test_forwards_to_all() {
        let a = Arc::new(MemorySink::new());
        let b = Arc::new(MemorySink::new());
        let sink = FanoutSink::new().with(Arc::clone(&a)).with(Arc::clone(&b));

        sink.record(&sample_event(Domain::Narrative)).unwrap();

        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_failure_does_not_stop_later_sinks() {
        let memory = Arc::new(MemorySink::new());
        let sink = FanoutSink::new()
            .with(FailingSink)
            .with(Arc::clone(&memory));

        let result = sink.record(&sample_event(Domain::Dao));

        assert!(result.is_err());
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_failures_reported_as_one_error() {
        let sink = FanoutSink::new()
            .with(FailingSink)
            .with(NullSink)
            .with(FailingSink);

        let err = sink.record(&sample_event(Domain::Game)).unwrap_err();

        assert!(matches!(err, FlowError::Sink { .. }));
        let msg = err.to_string();
        assert!(msg.contains("2 of 3 sinks failed"));
        assert_eq!(msg.matches("'failing' failed").count(), 2);
    }

    #[test]
    fn test_failing_sink_warned_once_per_event() {
        let memory = Arc::new(MemorySink::new());
        let sink = FanoutSink::new()
            .with(FailingSink)
            .with(Arc::clone(&memory));
        let mut engine = FlowEngine::new(sink);

        let logs = capture_logs(|| {
            engine.process(sample_event(Domain::Narrative));
        });

        let warnings: Vec<&str> = logs.lines().filter(|l| l.contains("WARN")).collect();
        assert_eq!(warnings.len(), 1, "{logs}");
        assert!(warnings[0].contains("'failing' failed"));
        assert_eq!(memory.len(), 1);
        assert_eq!(engine.events_processed(), 1);
    }

    #[test]
    fn test_names() {
        let mut sink = FanoutSink::new().with(NullSink);
        sink.push(Box::new(MemorySink::new()));
        assert_eq!(sink.names(), vec!["null", "memory"]);
    }
}
