//! Topic-based event bus for runtime events.
//!
//! Engine events are published to the topic that matches what they describe,
//! and consumers subscribe only to the topics they need.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::TickEvent;
