//! Process command for Flowstate.
//!
//! Runs one session over a JSON Lines stream: each non-blank line is one
//! perception event. Valid events are processed in order on a single
//! engine. Rejected lines are reported and leave the session state as it
//! was.

use std::io::BufRead;

use serde::Serialize;

use crate::config::Config;
use crate::core::{Adaptation, AdaptationResponse, FlowEngine, FlowState, PerceptionEvent};
use crate::error::{exit_codes, FlowError, Result};
use crate::sink::EventSink;

/// Options for the process command.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Output as JSON Lines.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Outcome of one input line.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LineOutcome {
    Accepted {
        line: usize,
        state: FlowState,
        adaptation: Adaptation,
    },
    Rejected {
        line: usize,
        error: String,
    },
}

impl LineOutcome {
    pub fn line(&self) -> usize {
        match self {
            LineOutcome::Accepted { line, .. } | LineOutcome::Rejected { line, .. } => *line,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, LineOutcome::Accepted { .. })
    }
}

/// Output of the process command.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutput {
    pub outcomes: Vec<LineOutcome>,
    pub accepted: usize,
    pub rejected: usize,
    /// Session state after the last accepted event.
    pub final_state: FlowState,
}

impl ProcessOutput {
    pub fn exit_code(&self) -> i32 {
        if self.rejected > 0 {
            exit_codes::INVALID_INPUT
        } else {
            exit_codes::SUCCESS
        }
    }
}

/// The process command implementation.
pub struct ProcessCommand<S: EventSink> {
    sink: S,
    config: Config,
}

impl<S: EventSink> ProcessCommand<S> {
    pub fn new(sink: S, config: Config) -> Self {
        Self { sink, config }
    }

    /// Process every event in `reader` as one session.
    ///
    /// Fails only if the input cannot be read or the configured model is
    /// invalid. Bad events, including lines that are not UTF-8, become
    /// [`LineOutcome::Rejected`].
    pub fn run<R: BufRead>(&self, reader: R) -> Result<ProcessOutput> {
        let mut engine = FlowEngine::with_model(self.config.model.clone(), &self.sink)?;
        let mut outcomes = Vec::new();
        let mut accepted = 0;
        let mut rejected = 0;

        for (index, bytes) in reader.split(b'\n').enumerate() {
            let mut bytes = bytes.map_err(FlowError::from)?;
            let line_no = index + 1;
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }

            let decoded = String::from_utf8(bytes)
                .map_err(|e| FlowError::serde(format!("line is not valid UTF-8: {}", e)))
                .and_then(|line| {
                    if line.trim().is_empty() {
                        Ok(None)
                    } else {
                        PerceptionEvent::from_json(&line).map(Some)
                    }
                });

            match decoded {
                Ok(None) => continue,
                Ok(Some(event)) => {
                    let response = engine.process(event);
                    accepted += 1;
                    outcomes.push(LineOutcome::Accepted {
                        line: line_no,
                        state: response.state,
                        adaptation: response.adaptation,
                    });
                }
                Err(e) => {
                    tracing::warn!("Rejected event on line {}: {}", line_no, e);
                    rejected += 1;
                    outcomes.push(LineOutcome::Rejected {
                        line: line_no,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(ProcessOutput {
            outcomes,
            accepted,
            rejected,
            final_state: engine.state(),
        })
    }

    /// Format output based on options.
    ///
    /// JSON output has one line per outcome; accepted lines carry the
    /// response fields `state` and `adaptation`.
    pub fn format_output(&self, output: &ProcessOutput, options: &ProcessOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            let mut text = String::new();
            for outcome in &output.outcomes {
                text.push_str(&serde_json::to_string(outcome).unwrap_or_else(|_| "{}".to_string()));
                text.push('\n');
            }
            text
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &ProcessOutput) -> String {
        let mut text = String::new();
        for outcome in &output.outcomes {
            match outcome {
                LineOutcome::Accepted {
                    line,
                    state,
                    adaptation,
                } => {
                    let response = AdaptationResponse::new(*state, *adaptation);
                    text.push_str(&format!("line {}: {}\n", line, super::describe(&response)));
                }
                LineOutcome::Rejected { line, error } => {
                    text.push_str(&format!("line {}: rejected: {}\n", line, error));
                }
            }
        }
        text.push_str(&format!(
            "{} accepted, {} rejected\n",
            output.accepted, output.rejected
        ));
        text
    }
}
