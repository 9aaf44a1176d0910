//! Event sinks for Flowstate.
//!
//! Every event the engine processes is handed to a sink before the state
//! update. Sinks are observers only: a failing sink is logged and ignored,
//! and never changes the engine's result.

pub mod fanout;
pub mod jsonl;
pub mod log;
pub mod memory;
pub mod traits;

pub use fanout::FanoutSink;
pub use jsonl::{EventLogRecord, JsonlEventLog, EVENT_LOG_SCHEMA_VERSION};
pub use log::TracingSink;
pub use memory::MemorySink;
pub use traits::{EventSink, NullSink};
