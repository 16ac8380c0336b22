//! Operator notifications
//!
//! Severities follow the ground-station STATUSTEXT scale (0 = emergency,
//! 7 = debug). Text is bounded to [`MAX_STATUS_TEXT_LEN`] characters and is
//! truncated, never rejected.

use core::fmt::{self, Write};

use heapless::{Deque, String};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::traits::Notifier;

/// Maximum status text length
pub const MAX_STATUS_TEXT_LEN: usize = 50;

/// Bounded status text
pub type StatusText = String<MAX_STATUS_TEXT_LEN>;

/// Message severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Severity {
    /// Decode from the wire value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Severity::Emergency),
            1 => Some(Severity::Alert),
            2 => Some(Severity::Critical),
            3 => Some(Severity::Error),
            4 => Some(Severity::Warning),
            5 => Some(Severity::Notice),
            6 => Some(Severity::Info),
            7 => Some(Severity::Debug),
            _ => None,
        }
    }

    /// Wire value
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Format into a status text, truncating at the length limit
pub fn format_status(args: fmt::Arguments<'_>) -> StatusText {
    let mut out = Truncating(StatusText::new());
    // Err only signals truncation
    let _ = out.write_fmt(args);
    out.0
}

struct Truncating(StatusText);

impl Write for Truncating {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            self.0.push(c).map_err(|_| fmt::Error)?;
        }
        Ok(())
    }
}

/// A queued status message
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueuedStatus {
    pub severity: Severity,
    pub text: StatusText,
}

/// Fixed-capacity status message queue
///
/// When full, the oldest message is dropped to make room and counted.
#[derive(Debug)]
pub struct StatusQueue<const N: usize> {
    queue: Deque<QueuedStatus, N>,
    dropped: u32,
}

impl<const N: usize> Default for StatusQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> StatusQueue<N> {
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
            dropped: 0,
        }
    }

    /// Take the oldest pending message
    pub fn pop(&mut self) -> Option<QueuedStatus> {
        self.queue.pop_front()
    }

    /// Pending message count
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Messages discarded because the queue was full
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Pending messages, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &QueuedStatus> {
        self.queue.iter()
    }
}

impl<const N: usize> Notifier for StatusQueue<N> {
    fn send_text(&mut self, severity: Severity, text: &str) {
        if self.queue.is_full() {
            self.queue.pop_front();
            self.dropped = self.dropped.saturating_add(1);
        }
        let message = QueuedStatus {
            severity,
            text: format_status(format_args!("{}", text)),
        };
        // Cannot fail: a slot was freed above
        let _ = self.queue.push_back(message);
    }
}
