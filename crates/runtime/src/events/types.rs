use serde::{Deserialize, Serialize};

/// Published after every world advance, manual or scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvent {
    /// World clock after the advance.
    pub clock_ms: u64,
    /// Time the advance covered.
    pub elapsed_ms: u32,
}
