//! Spin check monitor
//!
//! Owns the state machine, the spin-up timer and the per-motor status.
//! The host calls [`SpinCheckMonitor::update`] every [`CHECK_PERIOD_MS`];
//! each call reads everything it needs, makes at most one disarm request
//! and returns without blocking.

use heapless::Vec;

use super::evaluator::evaluate;
use crate::config::{CheckParams, MotorMap, ParamSource, MAX_MOTORS};
use crate::notify::{format_status, Severity};
use crate::state::{DisabledReason, MonitorState, Observation};
use crate::telemetry::MotorSample;
use crate::traits::{DisarmReason, MotorFeedback, Notifier, TelemetrySink, Vehicle};

/// Requested update period (ms)
pub const CHECK_PERIOD_MS: u32 = 100;

/// Most samples plus status texts one [`SpinCheckMonitor::update`] can emit
///
/// Reached when every motor faults: a sample and a fault text per motor,
/// then the disarm notice. Entry notices never share a cycle with an
/// evaluation.
pub const MAX_OUTPUTS_PER_CYCLE: usize = 2 * MAX_MOTORS + 1;

/// Live status of one motor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorStatus {
    /// PWM seen on the last evaluated cycle
    pub last_pwm: u32,
    /// RPM seen on the last evaluated cycle
    pub last_rpm: u32,
    /// Failed checks in the current arm session
    pub fault_count: u32,
}

/// Motor spin-up check
#[derive(Debug, Clone)]
pub struct SpinCheckMonitor {
    motors: MotorMap,
    status: Vec<MotorStatus, MAX_MOTORS>,
    state: MonitorState,
}

impl SpinCheckMonitor {
    /// Create a monitor for the given motors, starting disarmed
    pub fn new(motors: MotorMap) -> Self {
        let mut status = Vec::new();
        for _ in motors.channels() {
            // MotorMap never holds more than MAX_MOTORS channels
            let _ = status.push(MotorStatus::default());
        }

        Self {
            motors,
            status,
            state: MonitorState::Idle,
        }
    }

    /// Current state
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Monitored motors
    pub fn motors(&self) -> &MotorMap {
        &self.motors
    }

    /// Status of every motor (index 0 is motor 1)
    pub fn motor_status(&self) -> &[MotorStatus] {
        &self.status
    }

    /// Run one check cycle
    ///
    /// Reads parameters, vehicle state and motor feedback, advances the
    /// state machine, and when monitoring evaluates every motor before
    /// deciding on a single disarm.
    pub fn update(
        &mut self,
        now_us: u64,
        vehicle: &mut impl Vehicle,
        feedback: &impl MotorFeedback,
        params: &impl ParamSource,
        telemetry: &mut impl TelemetrySink,
        notifier: &mut impl Notifier,
    ) -> MonitorState {
        let loaded = CheckParams::load(params);
        let disabled = match &loaded {
            Err(_) => Some(DisabledReason::InvalidConfig),
            Ok(p) if !p.enabled => Some(DisabledReason::CheckDisabled),
            Ok(p) if !p.esc_telemetry_enabled => Some(DisabledReason::EscTelemetryDisabled),
            Ok(_) => None,
        };

        let armed = vehicle.is_armed();
        let obs = Observation {
            now_ms: now_us / 1000,
            disabled,
            armed,
            likely_flying: armed && vehicle.is_likely_flying(),
            arm_delay_ms: loaded.map(|p| p.arm_delay_ms).unwrap_or(0),
        };

        let prev = self.state;
        let mut next = prev.transition(&obs);

        if !armed {
            self.reset_motors();
        }

        match next {
            MonitorState::SuspendedDisabled { reason, .. }
                if prev.disabled_reason() != Some(reason) =>
            {
                notify_disabled(notifier, reason);
            }
            MonitorState::SuspendedFlying if prev != next => {
                notifier.send_text(Severity::Info, "RPM check: flying, check suspended");
            }
            MonitorState::WaitingSpinup { .. } if prev.armed_at_ms().is_none() => {
                let text = format_status(format_args!(
                    "RPM check: waiting {} ms for spin-up",
                    obs.arm_delay_ms
                ));
                notifier.send_text(Severity::Info, &text);
            }
            _ => {}
        }

        if let (true, Ok(params)) = (next.evaluates_motors(), loaded) {
            let faults = self.check_motors(now_us, &params, feedback, telemetry, notifier);
            if faults > 0 {
                vehicle.disarm(DisarmReason::MotorNotSpinning);
                let text = format_status(format_args!(
                    "RPM check: disarming, {} motor(s) not spinning",
                    faults
                ));
                notifier.send_text(Severity::Emergency, &text);
                next = MonitorState::Tripped;
            }
        }

        self.state = next;
        next
    }

    /// Evaluate every motor, returning the number that failed
    fn check_motors(
        &mut self,
        now_us: u64,
        params: &CheckParams,
        feedback: &impl MotorFeedback,
        telemetry: &mut impl TelemetrySink,
        notifier: &mut impl Notifier,
    ) -> u8 {
        let mut faults = 0u8;

        for (index, (channel, status)) in self
            .motors
            .channels()
            .iter()
            .zip(self.status.iter_mut())
            .enumerate()
        {
            // No output or no telemetry reads as not commanded / not turning
            let pwm = feedback.output_pwm(channel.function_id).unwrap_or(0);
            let rpm = feedback.rpm(channel.rpm_sensor_id).unwrap_or(0);
            status.last_pwm = pwm;
            status.last_rpm = rpm;

            let eval = evaluate(pwm, rpm, params.min_pwm, params.min_rpm);
            let Some(sample_status) = eval.sample_status() else {
                continue;
            };

            let motor = index as u8 + 1;
            telemetry.write_sample(&MotorSample {
                timestamp_us: now_us,
                motor,
                pwm,
                rpm,
                status: sample_status,
            });

            if eval.is_fault() {
                status.fault_count = status.fault_count.saturating_add(1);
                faults += 1;
                let text = format_status(format_args!(
                    "RPM check: motor {} RPM {} < {} at PWM {}",
                    motor, rpm, params.min_rpm, pwm
                ));
                notifier.send_text(Severity::Critical, &text);
            }
        }

        faults
    }

    fn reset_motors(&mut self) {
        for status in self.status.iter_mut() {
            *status = MotorStatus::default();
        }
    }
}

fn notify_disabled(notifier: &mut impl Notifier, reason: DisabledReason) {
    let text = match reason {
        DisabledReason::CheckDisabled => "RPM check: disabled",
        DisabledReason::EscTelemetryDisabled => "RPM check: suspended, ESC telemetry off",
        DisabledReason::InvalidConfig => "RPM check: suspended, invalid parameters",
    };
    notifier.send_text(Severity::Info, text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ParamId, ParamTable, MOTOR1_FUNCTION};
    use crate::notify::StatusQueue;
    use crate::state::Latch;
    use crate::telemetry::{SampleLog, SampleStatus};

    #[derive(Default)]
    struct MockVehicle {
        armed: bool,
        flying: bool,
        disarms: std::vec::Vec<DisarmReason>,
    }

    impl Vehicle for MockVehicle {
        fn is_armed(&self) -> bool {
            self.armed
        }

        fn is_likely_flying(&self) -> bool {
            self.flying
        }

        fn disarm(&mut self, reason: DisarmReason) {
            self.disarms.push(reason);
        }
    }

    /// Quad on functions 33..=36, ESC slots 0..=3
    struct MockMotors {
        pwm: [Option<u32>; 4],
        rpm: [Option<u32>; 4],
    }

    impl MotorFeedback for MockMotors {
        fn output_pwm(&self, function_id: u8) -> Option<u32> {
            let index = function_id.checked_sub(MOTOR1_FUNCTION)? as usize;
            self.pwm.get(index).copied().flatten()
        }

        fn rpm(&self, sensor_id: u8) -> Option<u32> {
            self.rpm.get(sensor_id as usize).copied().flatten()
        }
    }

    struct Harness {
        monitor: SpinCheckMonitor,
        vehicle: MockVehicle,
        motors: MockMotors,
        params: ParamTable,
        log: SampleLog<64>,
        status: StatusQueue<32>,
    }

    impl Harness {
        fn new() -> Self {
            let mut params = ParamTable::new();
            params.set(ParamId::Enable, 1).unwrap();
            params.set(ParamId::ArmDelay, 2000).unwrap();
            params.set(ParamId::MinRpm, 100).unwrap();
            params.set(ParamId::MinPwm, 1080).unwrap();
            params.set(ParamId::EscTelemetry, 1).unwrap();

            Self {
                monitor: SpinCheckMonitor::new(MotorMap::sequential(4).unwrap()),
                vehicle: MockVehicle::default(),
                motors: MockMotors {
                    pwm: [Some(1200); 4],
                    rpm: [Some(3000); 4],
                },
                params,
                log: SampleLog::new(),
                status: StatusQueue::new(),
            }
        }

        fn tick(&mut self, now_ms: u64) -> MonitorState {
            self.monitor.update(
                now_ms * 1000,
                &mut self.vehicle,
                &self.motors,
                &self.params,
                &mut self.log,
                &mut self.status,
            )
        }

        fn count(&self, severity: Severity) -> usize {
            self.status.iter().filter(|m| m.severity == severity).count()
        }
    }

    #[test]
    fn test_blocked_motor_disarms_once() {
        let mut h = Harness::new();
        h.motors.rpm[1] = Some(50);
        h.vehicle.armed = true;

        assert_eq!(h.tick(0), MonitorState::WaitingSpinup { armed_at_ms: 0 });
        assert_eq!(h.tick(2000), MonitorState::Tripped);

        assert_eq!(h.vehicle.disarms, [DisarmReason::MotorNotSpinning]);
        assert_eq!(h.count(Severity::Emergency), 1);
        assert_eq!(h.count(Severity::Critical), 1);
        assert_eq!(h.monitor.motor_status()[1].fault_count, 1);
        assert_eq!(h.monitor.motor_status()[1].last_rpm, 50);

        // Every checked motor is logged, pass or fail
        assert_eq!(h.log.len(), 4);
        let fault = h.log.iter().find(|s| s.status == SampleStatus::Fault).unwrap();
        assert_eq!((fault.motor, fault.pwm, fault.rpm), (2, 1200, 50));
        assert_eq!(fault.timestamp_us, 2_000_000);

        // Disarm takes a cycle to land: no second request meanwhile
        assert_eq!(h.tick(2100), MonitorState::Tripped);
        assert_eq!(h.vehicle.disarms.len(), 1);
        assert_eq!(h.count(Severity::Emergency), 1);
    }

    #[test]
    fn test_disarm_clears_session() {
        let mut h = Harness::new();
        h.motors.rpm[0] = Some(0);
        h.vehicle.armed = true;
        h.tick(0);
        h.tick(2000);
        assert_eq!(h.monitor.motor_status()[0].fault_count, 1);

        h.vehicle.armed = false;
        let state = h.tick(2100);
        assert_eq!(state, MonitorState::Idle);
        assert_eq!(state.armed_at_ms(), None);
        assert!(h
            .monitor
            .motor_status()
            .iter()
            .all(|s| *s == MotorStatus::default()));

        // Re-arm starts a fresh spin-up wait
        h.vehicle.armed = true;
        assert_eq!(h.tick(5000), MonitorState::WaitingSpinup { armed_at_ms: 5000 });
    }

    #[test]
    fn test_idle_motors_are_not_checked() {
        let mut h = Harness::new();
        h.motors.pwm = [Some(1000); 4];
        h.motors.rpm = [Some(0); 4];
        h.vehicle.armed = true;

        h.tick(0);
        assert_eq!(h.tick(2000), MonitorState::Monitoring { armed_at_ms: 0 });
        assert_eq!(h.tick(2100), MonitorState::Monitoring { armed_at_ms: 0 });

        assert!(h.vehicle.disarms.is_empty());
        assert!(h.log.is_empty());
        // Only the spin-up notice
        assert_eq!(h.status.len(), 1);
        assert_eq!(h.monitor.motor_status()[0].last_pwm, 1000);
    }

    #[test]
    fn test_no_check_during_spinup() {
        let mut h = Harness::new();
        h.motors.rpm = [Some(0); 4];
        h.vehicle.armed = true;

        h.tick(1000);
        assert_eq!(h.tick(1500), MonitorState::WaitingSpinup { armed_at_ms: 1000 });
        assert_eq!(h.tick(2999), MonitorState::WaitingSpinup { armed_at_ms: 1000 });

        assert!(h.log.is_empty());
        assert!(h.vehicle.disarms.is_empty());
        assert_eq!(h.monitor.motor_status()[0], MotorStatus::default());
    }

    #[test]
    fn test_disabled_notifies_once() {
        let mut h = Harness::new();
        h.params.set(ParamId::Enable, 0).unwrap();
        h.motors.rpm = [Some(0); 4];
        h.vehicle.armed = true;

        for t in 0..10 {
            assert_eq!(
                h.tick(t * 100),
                MonitorState::SuspendedDisabled {
                    reason: DisabledReason::CheckDisabled,
                    latch: None,
                }
            );
        }
        assert_eq!(h.status.len(), 1);
        assert_eq!(h.count(Severity::Info), 1);
        assert!(h.vehicle.disarms.is_empty());

        // Re-enabled while armed: timer starts from now
        h.params.set(ParamId::Enable, 1).unwrap();
        assert_eq!(h.tick(1000), MonitorState::WaitingSpinup { armed_at_ms: 1000 });
        assert_eq!(h.status.len(), 2);
    }

    #[test]
    fn test_esc_telemetry_prerequisite() {
        let mut h = Harness::new();
        h.params.set(ParamId::EscTelemetry, 0).unwrap();
        h.vehicle.armed = true;

        assert_eq!(
            h.tick(0),
            MonitorState::SuspendedDisabled {
                reason: DisabledReason::EscTelemetryDisabled,
                latch: None,
            }
        );
        let msg = h.status.pop().unwrap();
        assert_eq!(msg.severity, Severity::Info);
        assert!(msg.text.contains("ESC telemetry"));
    }

    #[test]
    fn test_missing_param_suspends() {
        let mut h = Harness::new();
        h.params = ParamTable::new();
        h.vehicle.armed = true;

        assert_eq!(
            h.tick(0),
            MonitorState::SuspendedDisabled {
                reason: DisabledReason::InvalidConfig,
                latch: None,
            }
        );
        assert!(h.vehicle.disarms.is_empty());
    }

    #[test]
    fn test_flying_stands_down_until_disarm() {
        let mut h = Harness::new();
        h.vehicle.armed = true;
        h.tick(0);
        h.tick(2000);

        h.vehicle.flying = true;
        assert_eq!(h.tick(2100), MonitorState::SuspendedFlying);
        let infos = h.count(Severity::Info);

        // Motor stops in flight: no disarm, no repeated notice
        h.motors.rpm[3] = Some(0);
        h.vehicle.flying = false;
        for t in 22..40 {
            assert_eq!(h.tick(t * 100), MonitorState::SuspendedFlying);
        }
        assert!(h.vehicle.disarms.is_empty());
        assert_eq!(h.count(Severity::Info), infos);

        h.vehicle.armed = false;
        assert_eq!(h.tick(4000), MonitorState::Idle);
    }

    #[test]
    fn test_all_motors_evaluated_before_single_disarm() {
        let mut h = Harness::new();
        h.motors.rpm[0] = Some(10);
        h.motors.rpm[2] = None; // telemetry lost
        h.vehicle.armed = true;

        h.tick(0);
        h.tick(2000);

        assert_eq!(h.vehicle.disarms.len(), 1);
        assert_eq!(h.count(Severity::Critical), 2);
        assert_eq!(h.count(Severity::Emergency), 1);

        // Per-motor faults come first, the disarm notice last
        let severities: std::vec::Vec<Severity> = h.status.iter().map(|m| m.severity).collect();
        assert_eq!(
            severities,
            [
                Severity::Info,
                Severity::Critical,
                Severity::Critical,
                Severity::Emergency
            ]
        );
        assert!(h
            .status
            .iter()
            .last()
            .unwrap()
            .text
            .contains("2 motor(s)"));
    }

    #[test]
    fn test_parameters_are_read_live() {
        let mut h = Harness::new();
        h.motors.rpm = [Some(500); 4];
        h.vehicle.armed = true;
        h.tick(0);
        assert_eq!(h.tick(2000), MonitorState::Monitoring { armed_at_ms: 0 });

        h.params.set(ParamId::MinRpm, 1000).unwrap();
        assert_eq!(h.tick(2100), MonitorState::Tripped);
        assert_eq!(h.vehicle.disarms.len(), 1);
    }

    #[test]
    fn test_flight_latch_survives_enable_toggle() {
        let mut h = Harness::new();
        h.vehicle.armed = true;
        h.tick(0);
        assert_eq!(h.tick(2000), MonitorState::Monitoring { armed_at_ms: 0 });

        h.vehicle.flying = true;
        assert_eq!(h.tick(2100), MonitorState::SuspendedFlying);

        h.params.set(ParamId::Enable, 0).unwrap();
        let state = h.tick(2200);
        assert_eq!(state.disabled_reason(), Some(DisabledReason::CheckDisabled));
        assert_eq!(state.latch(), Some(Latch::Flying));

        // Landed, re-enabled and a motor stopped, all without a disarm
        h.params.set(ParamId::Enable, 1).unwrap();
        h.vehicle.flying = false;
        h.motors.rpm[0] = Some(0);
        for t in 23..60 {
            assert_eq!(h.tick(t * 100), MonitorState::SuspendedFlying);
        }
        assert!(h.vehicle.disarms.is_empty());
        assert!(h.log.is_empty());
        assert_eq!(h.count(Severity::Emergency), 0);
    }

    #[test]
    fn test_trip_latch_survives_invalid_params() {
        let mut h = Harness::new();
        h.motors.rpm[2] = Some(0);
        h.vehicle.armed = true;
        h.tick(0);
        assert_eq!(h.tick(2000), MonitorState::Tripped);

        // Parameter table briefly unusable while the disarm lands
        h.params = ParamTable::new();
        let state = h.tick(2100);
        assert_eq!(state.disabled_reason(), Some(DisabledReason::InvalidConfig));
        assert_eq!(state.latch(), Some(Latch::Tripped));

        h.params = Harness::new().params;
        for t in 22..60 {
            assert_eq!(h.tick(t * 100), MonitorState::Tripped);
        }
        assert_eq!(h.vehicle.disarms.len(), 1);
        assert_eq!(h.count(Severity::Emergency), 1);

        h.vehicle.armed = false;
        assert_eq!(h.tick(6000), MonitorState::Idle);
    }

    #[test]
    fn test_disabled_reason_change_notifies_again() {
        let mut h = Harness::new();
        h.params.set(ParamId::Enable, 0).unwrap();
        h.vehicle.armed = true;
        h.tick(0);
        h.vehicle.flying = true;
        // Latch changes, reason does not: no repeat
        h.tick(100);
        assert_eq!(h.status.len(), 1);

        h.params.set(ParamId::Enable, 1).unwrap();
        h.params.set(ParamId::EscTelemetry, 0).unwrap();
        h.tick(200);
        assert_eq!(h.status.len(), 2);
        assert!(h.status.iter().last().unwrap().text.contains("ESC telemetry"));
    }

    #[test]
    fn test_worst_case_cycle_output_bound() {
        struct Stalled;

        impl MotorFeedback for Stalled {
            fn output_pwm(&self, _function_id: u8) -> Option<u32> {
                Some(1500)
            }

            fn rpm(&self, _sensor_id: u8) -> Option<u32> {
                Some(0)
            }
        }

        let mut monitor = SpinCheckMonitor::new(MotorMap::sequential(MAX_MOTORS as u8).unwrap());
        let mut vehicle = MockVehicle {
            armed: true,
            ..Default::default()
        };
        let params = Harness::new().params;
        let mut log: SampleLog<64> = SampleLog::new();
        let mut status: StatusQueue<64> = StatusQueue::new();

        monitor.update(0, &mut vehicle, &Stalled, &params, &mut log, &mut status);
        let before = log.len() + status.len();

        let state = monitor.update(
            2_000_000,
            &mut vehicle,
            &Stalled,
            &params,
            &mut log,
            &mut status,
        );
        assert_eq!(state, MonitorState::Tripped);
        assert_eq!(log.len() + status.len() - before, MAX_OUTPUTS_PER_CYCLE);

        // The disarm notice is the last thing emitted
        assert_eq!(status.iter().last().unwrap().severity, Severity::Emergency);
    }
}
