//! Per-cycle inputs to the state machine

use super::machine::DisabledReason;

/// Everything the transition logic needs from one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Observation {
    /// Monotonic time (ms)
    pub now_ms: u64,
    /// Set when a prerequisite for checking is missing
    pub disabled: Option<DisabledReason>,
    /// Vehicle is armed
    pub armed: bool,
    /// Vehicle is probably airborne
    pub likely_flying: bool,
    /// Live spin-up delay (ms)
    pub arm_delay_ms: u32,
}

impl Observation {
    /// Whether the spin-up delay has run out for a session armed at `armed_at_ms`
    pub fn spinup_elapsed(&self, armed_at_ms: u64) -> bool {
        self.now_ms >= armed_at_ms.saturating_add(self.arm_delay_ms as u64)
    }
}
