//! Adaptation policy.
//!
//! Maps a match score to a recommended difficulty adjustment. Thresholds
//! are checked in order and the first match wins:
//!
//! - above the anxiety threshold: decrease difficulty
//! - below the boredom threshold: increase difficulty
//! - otherwise: keep the challenge steady

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::core::state::FlowState;

/// Zone of the challenge/skill balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowZone {
    /// Challenge has outpaced skill.
    Anxiety,
    /// Skill has outpaced challenge.
    Boredom,
    /// Challenge and skill are balanced.
    Flow,
}

/// Recommended difficulty adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Adaptation {
    #[serde(rename = "decrease difficulty")]
    DecreaseDifficulty,
    #[serde(rename = "increase difficulty")]
    IncreaseDifficulty,
    #[serde(rename = "keep challenge steady")]
    KeepSteady,
}

impl Adaptation {
    /// Recommendation for a match score under the given thresholds.
    pub fn for_score(match_score: f64, model: &ModelConfig) -> Self {
        if match_score > model.anxiety_threshold {
            Adaptation::DecreaseDifficulty
        } else if match_score < model.boredom_threshold {
            Adaptation::IncreaseDifficulty
        } else {
            Adaptation::KeepSteady
        }
    }

    /// Recommendation for a state's current match score.
    pub fn for_state(state: &FlowState, model: &ModelConfig) -> Self {
        Self::for_score(state.match_score(), model)
    }

    /// The recommendation text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Adaptation::DecreaseDifficulty => "decrease difficulty",
            Adaptation::IncreaseDifficulty => "increase difficulty",
            Adaptation::KeepSteady => "keep challenge steady",
        }
    }

    pub fn zone(&self) -> FlowZone {
        match self {
            Adaptation::DecreaseDifficulty => FlowZone::Anxiety,
            Adaptation::IncreaseDifficulty => FlowZone::Boredom,
            Adaptation::KeepSteady => FlowZone::Flow,
        }
    }

    /// Whether a downstream consumer should change anything.
    pub fn is_change(&self) -> bool {
        !matches!(self, Adaptation::KeepSteady)
    }
}

impl fmt::Display for Adaptation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of processing one event: a state snapshot and a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptationResponse {
    pub state: FlowState,
    pub adaptation: Adaptation,
}

impl AdaptationResponse {
    pub fn new(state: FlowState, adaptation: Adaptation) -> Self {
        Self { state, adaptation }
    }

    /// Build a response for `state`, deriving the recommendation.
    pub fn from_state(state: FlowState, model: &ModelConfig) -> Self {
        Self::new(state, Adaptation::for_state(&state, model))
    }
}
