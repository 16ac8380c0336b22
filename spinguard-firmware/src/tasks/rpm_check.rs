//! Spin check task
//!
//! Runs the monitor every check period against the latest vehicle status,
//! ESC telemetry and live parameters. Everything the monitor emits goes out
//! over the link.

use defmt::*;
use embassy_time::{Duration, Instant, Ticker};
use portable_atomic::Ordering;

use spinguard_core::config::{MotorMap, MAX_MOTORS};
use spinguard_core::notify::{format_status, QueuedStatus};
use spinguard_core::safety::monitor::CHECK_PERIOD_MS;
use spinguard_core::traits::{DisarmReason, MotorFeedback, Notifier, TelemetrySink, Vehicle};
use spinguard_core::{MotorSample, Severity, SpinCheckMonitor};
use spinguard_protocol::VehicleStatus;

use crate::channels::{
    send_outbound, vehicle_status, Outbound, DISARM_REQUEST, ESC_HUB, MONITOR_STATE, PARAMS,
};

/// Vehicle as seen over the link
///
/// With no fresh status the vehicle reads as disarmed.
struct LinkVehicle<'a> {
    status: Option<&'a VehicleStatus>,
}

impl Vehicle for LinkVehicle<'_> {
    fn is_armed(&self) -> bool {
        self.status.is_some_and(|s| s.armed)
    }

    fn is_likely_flying(&self) -> bool {
        self.status.is_some_and(|s| s.likely_flying)
    }

    fn disarm(&mut self, reason: DisarmReason) {
        warn!("Requesting disarm: {:?}", reason);
        DISARM_REQUEST.signal(reason);
    }
}

/// Outputs and RPM captured at the start of a cycle
struct CycleFeedback<'a> {
    status: Option<&'a VehicleStatus>,
    rpm: [Option<u32>; MAX_MOTORS],
}

impl MotorFeedback for CycleFeedback<'_> {
    fn output_pwm(&self, function_id: u8) -> Option<u32> {
        self.status.and_then(|s| s.pwm_for(function_id))
    }

    fn rpm(&self, sensor_id: u8) -> Option<u32> {
        self.rpm.get(sensor_id as usize).copied().flatten()
    }
}

/// Samples and status text onto the outbound channel
struct LinkOutput;

impl TelemetrySink for LinkOutput {
    fn write_sample(&mut self, sample: &MotorSample) {
        trace!(
            "Motor {}: pwm={} rpm={} {:?}",
            sample.motor,
            sample.pwm,
            sample.rpm,
            sample.status
        );
        send_outbound(Outbound::Sample(*sample));
    }
}

impl Notifier for LinkOutput {
    fn send_text(&mut self, severity: Severity, text: &str) {
        match severity {
            Severity::Emergency | Severity::Alert | Severity::Critical | Severity::Error => {
                error!("{}", text)
            }
            Severity::Warning => warn!("{}", text),
            Severity::Notice | Severity::Info => info!("{}", text),
            Severity::Debug => debug!("{}", text),
        }
        send_outbound(Outbound::Status(QueuedStatus {
            severity,
            text: format_status(format_args!("{}", text)),
        }));
    }
}

/// RPM check task - evaluates motors every check period
#[embassy_executor::task]
pub async fn rpm_check_task(motors: MotorMap) {
    info!("RPM check task started, {} motor(s)", motors.len());

    let mut monitor = SpinCheckMonitor::new(motors);
    let mut ticker = Ticker::every(Duration::from_millis(CHECK_PERIOD_MS as u64));
    let mut link_up = false;
    let mut last_state = monitor.state();

    loop {
        ticker.next().await;

        let now = Instant::now();
        let now_ms = now.as_millis();

        let status = vehicle_status(now);
        if status.is_some() != link_up {
            link_up = status.is_some();
            if link_up {
                info!("Vehicle link up");
            } else {
                warn!("Vehicle status lost, treating vehicle as disarmed");
            }
        }

        let params = PARAMS.lock(|p| p.get());
        let rpm = ESC_HUB.lock(|hub| {
            let hub = hub.borrow();
            core::array::from_fn(|slot| hub.rpm(slot, now_ms))
        });

        let mut vehicle = LinkVehicle {
            status: status.as_ref(),
        };
        let feedback = CycleFeedback {
            status: status.as_ref(),
            rpm,
        };

        let state = monitor.update(
            now.as_micros(),
            &mut vehicle,
            &feedback,
            &params,
            &mut LinkOutput,
            &mut LinkOutput,
        );

        if state != last_state {
            debug!("Monitor state: {:?} -> {:?}", last_state, state);
            last_state = state;
        }
        MONITOR_STATE.store(state.code(), Ordering::Relaxed);
    }
}
