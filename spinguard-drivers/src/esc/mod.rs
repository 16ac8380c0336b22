//! ESC telemetry
//!
//! ESCs on a shared telemetry wire answer one at a time, in the order the
//! flight stack requests them. The monitor only listens: frames are assigned
//! to ESC slots round-robin, and the slot counter restarts whenever the line
//! has been quiet for longer than the configured resync gap.

pub mod hub;
pub mod kiss;

pub use hub::{EscTelemetryHub, STALE_AFTER_MS};
pub use kiss::{FrameAssembler, KissTelemetry, TelemetryError, FRAME_LEN};
