//! Flow state and the update rule.
//!
//! The state holds two latent estimates (skill, challenge) and the match
//! score derived from them. Each event adds a skill delta chosen by domain
//! and a challenge delta proportional to the event's difficulty:
//!
//! ```text
//! delta_skill     = GAME_SKILL_DELTA if domain == game else DEFAULT_SKILL_DELTA
//! delta_challenge = difficulty * CHALLENGE_RATE
//! skill           = max(0, skill + delta_skill)
//! challenge       = max(0, challenge + delta_challenge)
//! match_score     = clamp(challenge - skill, -1, 1)
//! ```
//!
//! Estimates are floored at zero but have no ceiling and no decay; only the
//! match score is bounded.

use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::core::event::{Domain, PerceptionEvent};

/// Model parameters.
pub mod tuning {
    /// Skill delta for gameplay events.
    pub const GAME_SKILL_DELTA: f64 = 0.05;
    /// Skill delta for narrative and governance events.
    pub const DEFAULT_SKILL_DELTA: f64 = 0.02;
    /// Multiplier from difficulty to challenge delta.
    pub const CHALLENGE_RATE: f64 = 0.03;
    /// Difficulty used when the payload carries no usable value.
    pub const DEFAULT_DIFFICULTY: f64 = 0.5;
    /// Match score above which challenge has outpaced skill.
    pub const ANXIETY_THRESHOLD: f64 = 0.2;
    /// Match score below which skill has outpaced challenge.
    pub const BOREDOM_THRESHOLD: f64 = -0.2;
    /// Lower bound of the match score.
    pub const MATCH_SCORE_MIN: f64 = -1.0;
    /// Upper bound of the match score.
    pub const MATCH_SCORE_MAX: f64 = 1.0;
}

/// Per-event increments computed from one event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateDelta {
    pub skill: f64,
    pub challenge: f64,
}

impl StateDelta {
    /// Compute the deltas an event contributes under `model`.
    pub fn for_event(event: &PerceptionEvent, model: &ModelConfig) -> Self {
        let skill = match event.domain() {
            Domain::Game => model.game_skill_delta,
            Domain::Narrative | Domain::Dao => model.default_skill_delta,
        };
        let difficulty = event.payload().difficulty_or(model.default_difficulty);
        Self {
            skill,
            challenge: difficulty * model.challenge_rate,
        }
    }
}

/// Session state: skill and challenge estimates plus the derived match score.
///
/// `match_score` always equals `clamp(challenge - skill, -1, 1)`; it can
/// only change through [`FlowState::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "FlowStateRepr")]
pub struct FlowState {
    skill_estimate: f64,
    challenge_estimate: f64,
    match_score: f64,
}

impl FlowState {
    /// Fresh state: both estimates zero, perfectly matched.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from two estimates, deriving the match score.
    ///
    /// Negative or non-finite estimates are floored at zero.
    pub fn from_estimates(skill_estimate: f64, challenge_estimate: f64) -> Self {
        let mut state = Self {
            skill_estimate: floor_zero(skill_estimate),
            challenge_estimate: floor_zero(challenge_estimate),
            match_score: 0.0,
        };
        state.match_score = state.derive_match_score();
        state
    }

    pub fn skill_estimate(&self) -> f64 {
        self.skill_estimate
    }

    pub fn challenge_estimate(&self) -> f64 {
        self.challenge_estimate
    }

    pub fn match_score(&self) -> f64 {
        self.match_score
    }

    /// Apply one event. Returns the deltas that were added.
    pub fn apply(&mut self, event: &PerceptionEvent, model: &ModelConfig) -> StateDelta {
        let delta = StateDelta::for_event(event, model);
        self.apply_delta(delta);
        delta
    }

    /// Add precomputed deltas and recompute the match score.
    pub fn apply_delta(&mut self, delta: StateDelta) {
        self.skill_estimate = floor_zero(self.skill_estimate + delta.skill);
        self.challenge_estimate = floor_zero(self.challenge_estimate + delta.challenge);
        self.match_score = self.derive_match_score();
    }

    fn derive_match_score(&self) -> f64 {
        (self.challenge_estimate - self.skill_estimate)
            .clamp(tuning::MATCH_SCORE_MIN, tuning::MATCH_SCORE_MAX)
    }
}

// NaN fails the comparison and lands on zero.
fn floor_zero(value: f64) -> f64 {
    if value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Wire form of [`FlowState`]. The match score is recomputed on decode.
#[derive(Deserialize)]
struct FlowStateRepr {
    skill_estimate: f64,
    challenge_estimate: f64,
    #[allow(dead_code)]
    #[serde(default)]
    match_score: Option<f64>,
}

impl From<FlowStateRepr> for FlowState {
    fn from(repr: FlowStateRepr) -> Self {
        Self::from_estimates(repr.skill_estimate, repr.challenge_estimate)
    }
}
