//! State machine definition
//!
//! Transition priority, highest first:
//!
//! 1. A missing prerequisite suspends checking (`SuspendedDisabled`)
//! 2. Disarmed resets everything (`Idle`)
//! 3. Flight detected stands checking down until the next disarm
//!    (`SuspendedFlying`)
//! 4. First armed cycle starts the spin-up timer (`WaitingSpinup`)
//! 5. Timer expired: motors are checked every cycle (`Monitoring`)
//! 6. Otherwise keep waiting
//!
//! `Tripped` is entered by the monitor itself after it has requested a
//! disarm, and holds until the vehicle is seen disarmed.
//!
//! `SuspendedFlying` and `Tripped` are per-session latches. A suspension in
//! the middle of a session carries the latch along, so restoring the
//! prerequisites while still armed returns to the latched state instead of
//! starting a new spin-up wait.

use super::observation::Observation;

/// Why checking is suspended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisabledReason {
    /// Turned off by `RPM_CHK_ENABLE`
    CheckDisabled,
    /// ESC telemetry hardware is not enabled, so no RPM is available
    EscTelemetryDisabled,
    /// A parameter is missing or out of range
    InvalidConfig,
}

/// Session latch held while armed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Latch {
    /// Flight was detected
    Flying,
    /// A disarm has been requested
    Tripped,
}

/// Monitor states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MonitorState {
    /// Disarmed
    Idle,
    /// Armed, spin-up delay running
    WaitingSpinup {
        /// Time the arm was first observed (ms)
        armed_at_ms: u64,
    },
    /// Armed, motors checked every cycle
    Monitoring {
        /// Time the arm was first observed (ms)
        armed_at_ms: u64,
    },
    /// Disarm requested after a motor fault; waiting to see the disarm
    Tripped,
    /// Vehicle detected airborne; no checks until disarmed
    SuspendedFlying,
    /// A prerequisite is missing
    SuspendedDisabled {
        reason: DisabledReason,
        /// Latch of the current arm session, if any
        latch: Option<Latch>,
    },
}

impl MonitorState {
    /// Compute the next state from this cycle's observation
    pub fn transition(self, obs: &Observation) -> Self {
        use MonitorState::*;

        if let Some(reason) = obs.disabled {
            // Disarm ends the session; flight seen while suspended still
            // counts for it
            let latch = if obs.armed {
                self.latch()
                    .or(obs.likely_flying.then_some(Latch::Flying))
            } else {
                None
            };
            return SuspendedDisabled { reason, latch };
        }

        if !obs.armed {
            return Idle;
        }

        match self {
            // Latched until the vehicle disarms
            SuspendedFlying
            | SuspendedDisabled {
                latch: Some(Latch::Flying),
                ..
            } => SuspendedFlying,
            Tripped
            | SuspendedDisabled {
                latch: Some(Latch::Tripped),
                ..
            } => Tripped,

            _ if obs.likely_flying => SuspendedFlying,

            // Arm observed (or prerequisites restored while armed):
            // start the spin-up timer
            Idle | SuspendedDisabled { latch: None, .. } => WaitingSpinup {
                armed_at_ms: obs.now_ms,
            },

            WaitingSpinup { armed_at_ms } | Monitoring { armed_at_ms } => {
                if obs.spinup_elapsed(armed_at_ms) {
                    Monitoring { armed_at_ms }
                } else {
                    WaitingSpinup { armed_at_ms }
                }
            }
        }
    }

    /// Session latch held by this state
    pub fn latch(&self) -> Option<Latch> {
        match self {
            MonitorState::SuspendedFlying => Some(Latch::Flying),
            MonitorState::Tripped => Some(Latch::Tripped),
            MonitorState::SuspendedDisabled { latch, .. } => *latch,
            _ => None,
        }
    }

    /// Why checking is suspended, if it is
    pub fn disabled_reason(&self) -> Option<DisabledReason> {
        match self {
            MonitorState::SuspendedDisabled { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Arm timestamp of the current session, if the spin-up timer is running
    pub fn armed_at_ms(&self) -> Option<u64> {
        match self {
            MonitorState::WaitingSpinup { armed_at_ms }
            | MonitorState::Monitoring { armed_at_ms } => Some(*armed_at_ms),
            _ => None,
        }
    }

    /// Check if motors are evaluated in this state
    pub fn evaluates_motors(&self) -> bool {
        matches!(self, MonitorState::Monitoring { .. })
    }

    /// Check if checking is stood down
    pub fn is_suspended(&self) -> bool {
        matches!(
            self,
            MonitorState::SuspendedFlying | MonitorState::SuspendedDisabled { .. }
        )
    }

    /// Compact code for heartbeats
    ///
    /// 0 idle, 1 waiting for spin-up, 2 monitoring, 3 tripped,
    /// 4 suspended (flying), 5 suspended (disabled).
    pub fn code(&self) -> u8 {
        match self {
            MonitorState::Idle => 0,
            MonitorState::WaitingSpinup { .. } => 1,
            MonitorState::Monitoring { .. } => 2,
            MonitorState::Tripped => 3,
            MonitorState::SuspendedFlying => 4,
            MonitorState::SuspendedDisabled { .. } => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed_at(now_ms: u64) -> Observation {
        Observation {
            now_ms,
            disabled: None,
            armed: true,
            likely_flying: false,
            arm_delay_ms: 2000,
        }
    }

    #[test]
    fn test_arm_starts_spinup_timer() {
        let next = MonitorState::Idle.transition(&armed_at(10_000));
        assert_eq!(next, MonitorState::WaitingSpinup { armed_at_ms: 10_000 });
        assert_eq!(next.armed_at_ms(), Some(10_000));
    }

    #[test]
    fn test_waits_until_delay_expires() {
        let waiting = MonitorState::WaitingSpinup { armed_at_ms: 10_000 };

        let next = waiting.transition(&armed_at(10_500));
        assert_eq!(next, waiting);
        assert!(!next.evaluates_motors());

        let next = waiting.transition(&armed_at(11_999));
        assert_eq!(next, waiting);

        let next = waiting.transition(&armed_at(12_000));
        assert_eq!(next, MonitorState::Monitoring { armed_at_ms: 10_000 });
        assert!(next.evaluates_motors());
    }

    #[test]
    fn test_disarm_returns_to_idle_from_any_state() {
        let states = [
            MonitorState::WaitingSpinup { armed_at_ms: 5 },
            MonitorState::Monitoring { armed_at_ms: 5 },
            MonitorState::Tripped,
            MonitorState::SuspendedFlying,
        ];

        for state in states {
            let obs = Observation {
                armed: false,
                ..armed_at(20_000)
            };
            let next = state.transition(&obs);
            assert_eq!(next, MonitorState::Idle);
            assert_eq!(next.armed_at_ms(), None);
        }
    }

    #[test]
    fn test_disabled_wins_over_everything() {
        let obs = Observation {
            disabled: Some(DisabledReason::EscTelemetryDisabled),
            armed: false,
            likely_flying: true,
            ..armed_at(0)
        };
        for state in [MonitorState::Idle, MonitorState::Monitoring { armed_at_ms: 0 }] {
            assert_eq!(
                state.transition(&obs),
                MonitorState::SuspendedDisabled {
                    reason: DisabledReason::EscTelemetryDisabled,
                    latch: None,
                }
            );
        }
    }

    #[test]
    fn test_flying_latches_until_disarm() {
        let flying = Observation {
            likely_flying: true,
            ..armed_at(13_000)
        };
        let state = MonitorState::Monitoring { armed_at_ms: 10_000 }.transition(&flying);
        assert_eq!(state, MonitorState::SuspendedFlying);
        assert!(state.is_suspended());

        // Landing while still armed does not resume checks
        let state = state.transition(&armed_at(20_000));
        assert_eq!(state, MonitorState::SuspendedFlying);

        let disarmed = Observation {
            armed: false,
            ..armed_at(21_000)
        };
        assert_eq!(state.transition(&disarmed), MonitorState::Idle);
    }

    #[test]
    fn test_reenable_while_armed_restarts_timer() {
        let state = MonitorState::SuspendedDisabled {
            reason: DisabledReason::CheckDisabled,
            latch: None,
        };
        let next = state.transition(&armed_at(30_000));
        assert_eq!(next, MonitorState::WaitingSpinup { armed_at_ms: 30_000 });
    }

    #[test]
    fn test_latch_carried_through_suspension() {
        let disabled = Observation {
            disabled: Some(DisabledReason::InvalidConfig),
            ..armed_at(30_000)
        };

        for (latched, latch) in [
            (MonitorState::SuspendedFlying, Latch::Flying),
            (MonitorState::Tripped, Latch::Tripped),
        ] {
            let suspended = latched.transition(&disabled);
            assert_eq!(suspended.latch(), Some(latch));
            assert_eq!(
                suspended.disabled_reason(),
                Some(DisabledReason::InvalidConfig)
            );

            // Still latched through a change of reason
            let other = Observation {
                disabled: Some(DisabledReason::CheckDisabled),
                ..armed_at(30_100)
            };
            let suspended = suspended.transition(&other);
            assert_eq!(suspended.latch(), Some(latch));

            // Restored while armed: back to the latch, never a new spin-up
            assert_eq!(suspended.transition(&armed_at(30_200)), latched);
        }
    }

    #[test]
    fn test_flight_while_suspended_latches() {
        let state = MonitorState::WaitingSpinup { armed_at_ms: 0 };
        let flying_disabled = Observation {
            disabled: Some(DisabledReason::CheckDisabled),
            likely_flying: true,
            ..armed_at(1_000)
        };
        let state = state.transition(&flying_disabled);
        assert_eq!(state.latch(), Some(Latch::Flying));

        // Landed and re-enabled without disarming
        assert_eq!(
            state.transition(&armed_at(9_000)),
            MonitorState::SuspendedFlying
        );
    }

    #[test]
    fn test_disarm_while_suspended_clears_latch() {
        let state = MonitorState::SuspendedDisabled {
            reason: DisabledReason::CheckDisabled,
            latch: Some(Latch::Tripped),
        };
        let disarmed = Observation {
            disabled: Some(DisabledReason::CheckDisabled),
            armed: false,
            ..armed_at(40_000)
        };
        let state = state.transition(&disarmed);
        assert_eq!(state.latch(), None);

        // Re-armed and re-enabled: a fresh session
        assert_eq!(
            state.transition(&armed_at(41_000)),
            MonitorState::WaitingSpinup { armed_at_ms: 41_000 }
        );
    }

    #[test]
    fn test_tripped_holds_while_armed() {
        let next = MonitorState::Tripped.transition(&armed_at(50_000));
        assert_eq!(next, MonitorState::Tripped);
        assert!(!next.evaluates_motors());
    }

    #[test]
    fn test_longer_live_delay_resumes_waiting() {
        let obs = Observation {
            arm_delay_ms: 5000,
            ..armed_at(13_000)
        };
        let next = MonitorState::Monitoring { armed_at_ms: 10_000 }.transition(&obs);
        assert_eq!(next, MonitorState::WaitingSpinup { armed_at_ms: 10_000 });
    }
}
