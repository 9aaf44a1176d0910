//! Core types and logic for Flowstate.
//!
//! Events are validated in [`event`], folded into session state in
//! [`state`], mapped to a recommendation in [`adaptation`], and driven per
//! session by the [`engine`].

pub mod adaptation;
pub mod engine;
pub mod event;
pub mod state;

pub use adaptation::{Adaptation, AdaptationResponse, FlowZone};
pub use engine::FlowEngine;
pub use event::{
    Domain, EventTimestamp, Payload, PerceptionEvent, RawPerceptionEvent, DIFFICULTY_KEY,
};
pub use state::{tuning, FlowState, StateDelta};
