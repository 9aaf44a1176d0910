//! Tracing-backed event sink.

use crate::core::PerceptionEvent;
use crate::error::Result;
use crate::sink::traits::EventSink;

/// Emits one structured `info` record per event under the `flowstate::event`
/// target, with the full event serialized as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for TracingSink {
    fn record(&self, event: &PerceptionEvent) -> Result<()> {
        let json = serde_json::to_string(event)?;
        tracing::info!(
            target: "flowstate::event",
            id = %event.id(),
            domain = %event.domain(),
            event = %json,
            "EVENT"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "tracing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Domain;
    use crate::sink::traits::tests::{capture_logs, sample_event};

    #[test]
    fn test_tracing_sink_records_without_subscriber() {
        let sink = TracingSink::new();
        for domain in Domain::all() {
            assert!(sink.record(&sample_event(*domain)).is_ok());
        }
        assert_eq!(sink.name(), "tracing");
    }

    #[test]
    fn test_tracing_sink_emits_full_event() {
        let sink = TracingSink::new();
        let event = sample_event(Domain::Game);

        let logs = capture_logs(|| sink.record(&event).unwrap());

        let line = logs
            .lines()
            .find(|l| l.contains("flowstate::event"))
            .unwrap_or_else(|| panic!("no event record in {logs:?}"));
        assert!(line.contains("INFO"));
        assert!(line.contains("EVENT"));
        assert!(line.contains(&format!("id={}", event.id())));
        assert!(line.contains("domain=game"));

        let json = line
            .split_once("event=")
            .map(|(_, rest)| rest.trim())
            .unwrap();
        let decoded = PerceptionEvent::from_json(json).unwrap();
        assert_eq!(decoded, event);
        assert_eq!(decoded.user_hash(), "deadbeef".repeat(8));
        assert_eq!(decoded.payload().get("score"), Some(&serde_json::json!(100)));
    }

    #[test]
    fn test_one_record_per_event() {
        let sink = TracingSink::new();
        let logs = capture_logs(|| {
            for domain in Domain::all() {
                sink.record(&sample_event(*domain)).unwrap();
            }
        });
        assert_eq!(logs.matches("EVENT").count(), Domain::all().len());
    }
}
