//! Per-motor check samples
//!
//! One sample is written for every motor that was actually checked in a
//! cycle. Motors below the PWM threshold produce no sample.

use heapless::Deque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::traits::TelemetrySink;

/// Check outcome recorded in a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SampleStatus {
    /// Motor below minimum RPM
    Fault = 0,
    /// Motor spinning as expected
    Pass = 1,
}

/// One checked motor in one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotorSample {
    /// Monotonic time of the check (µs)
    pub timestamp_us: u64,
    /// Motor number (1-based)
    pub motor: u8,
    /// Commanded PWM
    pub pwm: u32,
    /// Measured RPM
    pub rpm: u32,
    pub status: SampleStatus,
}

/// Ring buffer of the most recent samples
///
/// Oldest samples are overwritten when full.
#[derive(Debug)]
pub struct SampleLog<const N: usize> {
    samples: Deque<MotorSample, N>,
}

impl<const N: usize> Default for SampleLog<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SampleLog<N> {
    pub const fn new() -> Self {
        Self {
            samples: Deque::new(),
        }
    }

    /// Number of retained samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Retained samples, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &MotorSample> {
        self.samples.iter()
    }

    /// Take the oldest retained sample
    pub fn pop(&mut self) -> Option<MotorSample> {
        self.samples.pop_front()
    }
}

impl<const N: usize> TelemetrySink for SampleLog<N> {
    fn write_sample(&mut self, sample: &MotorSample) {
        if self.samples.is_full() {
            self.samples.pop_front();
        }
        let _ = self.samples.push_back(*sample);
    }
}
