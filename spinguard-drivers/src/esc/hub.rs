//! Latest telemetry per ESC

use super::kiss::{KissTelemetry, TelemetryError};

/// Telemetry older than this reports no RPM (ms)
pub const STALE_AFTER_MS: u64 = 1000;

#[derive(Debug, Clone, Copy)]
struct Slot {
    telemetry: KissTelemetry,
    updated_ms: u64,
}

/// Latest telemetry for up to `N` ESCs
///
/// Frames are assigned to slots in arrival order, wrapping after the
/// configured ESC count.
#[derive(Debug)]
pub struct EscTelemetryHub<const N: usize> {
    slots: [Option<Slot>; N],
    esc_count: usize,
    poles: u8,
    next: usize,
    errors: u32,
}

impl<const N: usize> Default for EscTelemetryHub<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EscTelemetryHub<N> {
    /// Create an unconfigured hub (all `N` slots, 14-pole motors)
    pub const fn new() -> Self {
        Self {
            slots: [None; N],
            esc_count: N,
            poles: 14,
            next: 0,
            errors: 0,
        }
    }

    /// Set the number of ESCs answering in a round and the motor pole count
    ///
    /// The ESC count is clamped to `N`. Clears all stored telemetry.
    pub fn configure(&mut self, esc_count: usize, poles: u8) -> Result<(), TelemetryError> {
        if poles == 0 || poles % 2 != 0 {
            return Err(TelemetryError::InvalidPoles);
        }
        self.esc_count = esc_count.clamp(1, N);
        self.poles = poles;
        self.slots = [None; N];
        self.next = 0;
        Ok(())
    }

    /// Store a frame in the next slot
    ///
    /// Returns the slot it was stored in.
    pub fn record_next(&mut self, telemetry: KissTelemetry, now_ms: u64) -> usize {
        let slot = self.next;
        self.slots[slot] = Some(Slot {
            telemetry,
            updated_ms: now_ms,
        });
        self.advance();
        slot
    }

    /// Skip the next slot after a frame that failed to decode
    pub fn record_error(&mut self) {
        self.errors = self.errors.saturating_add(1);
        self.advance();
    }

    /// Start the next round at slot 0
    pub fn resync(&mut self) {
        self.next = 0;
    }

    fn advance(&mut self) {
        self.next = (self.next + 1) % self.esc_count;
    }

    /// Slot the next frame will be stored in
    pub fn next_slot(&self) -> usize {
        self.next
    }

    /// Frames that failed to decode
    pub fn errors(&self) -> u32 {
        self.errors
    }

    /// Latest telemetry for `slot` and its arrival time (ms)
    pub fn latest(&self, slot: usize) -> Option<(KissTelemetry, u64)> {
        self.slots
            .get(slot)
            .copied()
            .flatten()
            .map(|s| (s.telemetry, s.updated_ms))
    }

    /// Mechanical RPM for `slot`, if fresh
    pub fn rpm(&self, slot: usize, now_ms: u64) -> Option<u32> {
        let (telemetry, updated_ms) = self.latest(slot)?;
        if now_ms.saturating_sub(updated_ms) > STALE_AFTER_MS {
            return None;
        }
        telemetry.rpm(self.poles).ok()
    }
}
