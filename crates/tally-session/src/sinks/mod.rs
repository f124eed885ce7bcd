//! Built-in settlement sinks.

pub mod jsonl;
pub mod recording;

pub use jsonl::JsonLinesSink;
pub use recording::RecordingSink;
