//! Demo command for Flowstate.
//!
//! Builds a single event, processes it on a fresh engine, and prints the
//! response.

use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;
use crate::core::{AdaptationResponse, EventTimestamp, FlowEngine, Payload, PerceptionEvent};
use crate::error::Result;
use crate::sink::EventSink;

/// Pseudonymous user hash used for demo events.
pub const DEMO_USER_HASH: &str =
    "deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef";

/// Options for the demo command.
#[derive(Debug, Clone)]
pub struct DemoOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Domain of the generated event.
    pub domain: String,
    /// Difficulty placed in the payload.
    pub difficulty: f64,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            json: false,
            quiet: false,
            domain: "game".to_string(),
            difficulty: 0.8,
        }
    }
}

/// Output format for the demo command.
#[derive(Debug, Clone, Serialize)]
pub struct DemoOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<PerceptionEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<AdaptationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DemoOutput {
    pub fn success(event: PerceptionEvent, response: AdaptationResponse) -> Self {
        Self {
            success: true,
            event: Some(event),
            response: Some(response),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            event: None,
            response: None,
            error: Some(error.into()),
        }
    }
}

/// The demo command implementation.
pub struct DemoCommand<S: EventSink> {
    sink: S,
    config: Config,
}

impl<S: EventSink> DemoCommand<S> {
    pub fn new(sink: S, config: Config) -> Self {
        Self { sink, config }
    }

    /// Run the demo.
    pub fn run(&self, options: &DemoOptions) -> DemoOutput {
        match self.try_run(options) {
            Ok((event, response)) => DemoOutput::success(event, response),
            Err(e) => DemoOutput::failure(e.to_string()),
        }
    }

    fn try_run(&self, options: &DemoOptions) -> Result<(PerceptionEvent, AdaptationResponse)> {
        let event = PerceptionEvent::new(
            Uuid::new_v4(),
            EventTimestamp::now(),
            &options.domain,
            DEMO_USER_HASH,
            Payload::new()
                .with("difficulty", options.difficulty)
                .with("score", 100),
        )?;

        let mut engine = FlowEngine::with_model(self.config.model.clone(), &self.sink)?;
        let response = engine.process(event.clone());
        Ok((event, response))
    }

    /// Format output based on options.
    ///
    /// JSON output is the response alone, matching the wire response shape.
    pub fn format_output(&self, output: &DemoOutput, options: &DemoOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            let value = match &output.response {
                Some(response) => serde_json::to_string_pretty(response),
                None => serde_json::to_string_pretty(output),
            };
            value.unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &DemoOutput) -> String {
        match (&output.event, &output.response) {
            (Some(event), Some(response)) => format!(
                "Event {} ({})\n{}\n",
                event.id(),
                event.domain(),
                super::describe(response)
            ),
            _ => format!(
                "Demo failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Adaptation;
    use crate::sink::MemorySink;
    use std::sync::Arc;

    #[test]
    fn test_demo_default_event() {
        let sink = Arc::new(MemorySink::new());
        let cmd = DemoCommand::new(Arc::clone(&sink), Config::default());

        let output = cmd.run(&DemoOptions::default());

        assert!(output.success);
        let response = output.response.unwrap();
        assert!((response.state.skill_estimate() - 0.05).abs() < 1e-9);
        assert!((response.state.challenge_estimate() - 0.024).abs() < 1e-9);
        assert_eq!(response.adaptation, Adaptation::KeepSteady);

        let recorded = sink.events();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].user_hash(), DEMO_USER_HASH);
        assert_eq!(
            recorded[0].payload().get("score"),
            Some(&serde_json::json!(100))
        );
    }

    #[test]
    fn test_demo_invalid_domain() {
        let sink = MemorySink::new();
        let cmd = DemoCommand::new(&sink, Config::default());
        let options = DemoOptions {
            domain: "politics".to_string(),
            ..DemoOptions::default()
        };

        let output = cmd.run(&options);

        assert!(!output.success);
        assert!(output.error.unwrap().contains("politics"));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_demo_json_output_is_response() {
        let cmd = DemoCommand::new(crate::sink::NullSink, Config::default());
        let options = DemoOptions {
            json: true,
            ..DemoOptions::default()
        };

        let output = cmd.run(&options);
        let text = cmd.format_output(&output, &options);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["adaptation"], "keep challenge steady");
        assert!(value["state"]["match_score"].is_number());
    }

    #[test]
    fn test_demo_human_output() {
        let cmd = DemoCommand::new(crate::sink::NullSink, Config::default());
        let options = DemoOptions::default();

        let output = cmd.run(&options);
        let text = cmd.format_output(&output, &options);

        assert!(text.contains("(game)"));
        assert!(text.contains("skill=0.050"));
        assert!(text.contains("match=-0.026"));
        assert!(text.contains("keep challenge steady"));
    }

    #[test]
    fn test_demo_quiet() {
        let cmd = DemoCommand::new(crate::sink::NullSink, Config::default());
        let options = DemoOptions {
            quiet: true,
            ..DemoOptions::default()
        };
        let output = cmd.run(&options);
        assert!(cmd.format_output(&output, &options).is_empty());
    }
}
