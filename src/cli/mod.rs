//! CLI commands for Flowstate.
//!
//! - **demo**: process one generated event on a fresh engine
//! - **process**: run one session over a JSON Lines stream of events

pub mod demo;
pub mod process;

pub use demo::DemoCommand;
pub use process::ProcessCommand;

use crate::config::EventLogConfig;
use crate::sink::{FanoutSink, JsonlEventLog, TracingSink};

/// Build the sink a CLI session records events to.
///
/// Always logs through tracing; adds the JSONL event log when enabled.
pub fn session_sink(event_log: &EventLogConfig) -> FanoutSink {
    let mut sink = FanoutSink::new().with(TracingSink);
    if let Some(path) = event_log.resolved_path() {
        sink.push(Box::new(JsonlEventLog::new(path)));
    }
    sink
}

/// Format a state line for human-readable output.
fn describe(response: &crate::core::AdaptationResponse) -> String {
    format!(
        "skill={:.3} challenge={:.3} match={:+.3} -> {}",
        response.state.skill_estimate(),
        response.state.challenge_estimate(),
        response.state.match_score(),
        response.adaptation
    )
}
