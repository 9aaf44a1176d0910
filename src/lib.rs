//! Flowstate - challenge/skill matching for perception events
//!
//! Flowstate ingests telemetry events from front-end domains (games,
//! interactive narrative, governance surfaces), keeps a running estimate of
//! the user's skill and the challenge presented to them, and recommends
//! whether difficulty should go up, go down, or hold steady.
//!
//! ```
//! use flowstate::{FlowEngine, NullSink, Payload, PerceptionEvent};
//!
//! let event = PerceptionEvent::new(
//!     uuid::Uuid::new_v4(),
//!     chrono::Utc::now(),
//!     "game",
//!     "deadbeef",
//!     Payload::new().with("difficulty", 0.8),
//! )?;
//!
//! let mut engine = FlowEngine::new(NullSink);
//! let response = engine.process(event);
//! assert_eq!(response.adaptation.as_str(), "keep challenge steady");
//! # Ok::<(), flowstate::FlowError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod sink;

pub use config::{Config, EventLogConfig, ModelConfig};
pub use core::{
    tuning, Adaptation, AdaptationResponse, Domain, EventTimestamp, FlowEngine, FlowState,
    FlowZone, Payload, PerceptionEvent, RawPerceptionEvent, StateDelta,
};
pub use error::{FailOpen, FlowError, Result};
pub use sink::{EventSink, FanoutSink, JsonlEventLog, MemorySink, NullSink, TracingSink};

pub use cli::{DemoCommand, ProcessCommand};
