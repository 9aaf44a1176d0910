//! Flow-state engine.
//!
//! One engine is one logical session. It owns its [`FlowState`], consumes
//! validated events one at a time, and answers each with an
//! [`AdaptationResponse`]. `process` takes `&mut self`, so at most one call
//! is ever in flight; sessions served in parallel each own their own engine.

use tracing::debug;

use crate::config::ModelConfig;
use crate::core::adaptation::AdaptationResponse;
use crate::core::event::{PerceptionEvent, RawPerceptionEvent};
use crate::core::state::FlowState;
use crate::error::{FailOpen, Result};
use crate::sink::{EventSink, TracingSink};

/// Session-scoped flow-state engine.
pub struct FlowEngine<S: EventSink = TracingSink> {
    state: FlowState,
    model: ModelConfig,
    sink: S,
    events_processed: u64,
}

impl Default for FlowEngine<TracingSink> {
    fn default() -> Self {
        Self::new(TracingSink)
    }
}

impl<S: EventSink> FlowEngine<S> {
    /// Create an engine with the default model.
    pub fn new(sink: S) -> Self {
        Self {
            state: FlowState::new(),
            model: ModelConfig::default(),
            sink,
            events_processed: 0,
        }
    }

    /// Create an engine with a custom model.
    ///
    /// Fails if the model would break the state invariants (negative
    /// rates, inverted thresholds).
    pub fn with_model(model: ModelConfig, sink: S) -> Result<Self> {
        model.validate()?;
        Ok(Self {
            state: FlowState::new(),
            model,
            sink,
            events_processed: 0,
        })
    }

    /// Process one validated event.
    ///
    /// Records the event on the sink (best-effort), applies the update
    /// rule, and returns the new state with its recommendation. Never fails.
    pub fn process(&mut self, event: PerceptionEvent) -> AdaptationResponse {
        self.sink
            .record(&event)
            .fail_open_default("recording perception event");

        let delta = self.state.apply(&event, &self.model);
        self.events_processed += 1;

        let response = AdaptationResponse::from_state(self.state, &self.model);
        debug!(
            id = %event.id(),
            domain = %event.domain(),
            delta_skill = delta.skill,
            delta_challenge = delta.challenge,
            skill = self.state.skill_estimate(),
            challenge = self.state.challenge_estimate(),
            match_score = self.state.match_score(),
            adaptation = %response.adaptation,
            "processed event"
        );
        response
    }

    /// Validate a raw event, then process it.
    ///
    /// A rejected event leaves the engine untouched.
    pub fn submit(&mut self, raw: RawPerceptionEvent) -> Result<AdaptationResponse> {
        let event = raw.validate()?;
        Ok(self.process(event))
    }

    /// Current state snapshot.
    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Number of events processed in this session.
    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }
}
