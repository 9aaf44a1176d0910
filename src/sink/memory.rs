//! In-memory event sink for testing.
//!
//! Thread-safe via `RwLock<Vec>`. Events are lost when the sink is dropped.

use std::sync::RwLock;

use crate::core::PerceptionEvent;
use crate::error::{FlowError, Result};
use crate::sink::traits::EventSink;

/// In-memory sink that keeps every recorded event in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: RwLock<Vec<PerceptionEvent>>,
}

impl MemorySink {
    /// Create a new empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<PerceptionEvent> {
        match self.events.read() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self.events.read() {
            Ok(events) => events.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all recorded events.
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &PerceptionEvent) -> Result<()> {
        let mut events = self
            .events
            .write()
            .map_err(|_| FlowError::sink("memory sink lock poisoned"))?;
        events.push(event.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Domain;
    use crate::sink::traits::tests::sample_event;

    #[test]
    fn test_new_sink_is_empty() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());
        assert_eq!(sink.len(), 0);
    }

    #[test]
    fn test_records_in_order() {
        let sink = MemorySink::new();
        let first = sample_event(Domain::Game);
        let second = sample_event(Domain::Dao);

        sink.record(&first).unwrap();
        sink.record(&second).unwrap();

        assert_eq!(sink.events(), vec![first, second]);
    }

    #[test]
    fn test_clear() {
        let sink = MemorySink::new();
        sink.record(&sample_event(Domain::Narrative)).unwrap();
        assert_eq!(sink.len(), 1);

        sink.clear();
        assert!(sink.is_empty());
    }
}
