//! Message types for the spin check link
//!
//! Message types are divided into two directions:
//! - Flight stack → monitor: vehicle status, parameter changes, parameter
//!   reset
//! - Monitor → flight stack: check samples, status text, disarm requests,
//!   heartbeat

use heapless::Vec;
use serde::{de::DeserializeOwned, Serialize};
use spinguard_core::traits::DisarmReason;
use spinguard_core::{MotorSample, Severity};

use crate::frame::{Frame, FrameError, MAX_PAYLOAD_SIZE};
use crate::vehicle::{ParamSet, VehicleStatus};

// Message type IDs: flight stack → monitor
pub const MSG_VEHICLE_STATUS: u8 = 0x01;
pub const MSG_PARAM_SET: u8 = 0x02;
pub const MSG_PARAM_RESET: u8 = 0x03;

// Message type IDs: monitor → flight stack
pub const MSG_SAMPLE: u8 = 0x20;
pub const MSG_STATUS_TEXT: u8 = 0x21;
pub const MSG_DISARM: u8 = 0x22;
pub const MSG_HEARTBEAT: u8 = 0x23;

/// Longest status text carried on the wire
pub const MAX_TEXT_LEN: usize = spinguard_core::notify::MAX_STATUS_TEXT_LEN;

fn encode_postcard<T: Serialize>(msg_type: u8, value: &T) -> Result<Frame, FrameError> {
    let mut buf = [0u8; MAX_PAYLOAD_SIZE];
    let used = postcard::to_slice(value, &mut buf).map_err(|_| FrameError::PayloadTooLarge)?;
    Frame::new(msg_type, used)
}

fn decode_postcard<T: DeserializeOwned>(frame: &Frame) -> Result<T, FrameError> {
    postcard::from_bytes(&frame.payload).map_err(|_| FrameError::InvalidPayload)
}

/// Messages from the monitor to the flight stack
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MonitorMessage<'a> {
    /// One checked motor
    Sample(MotorSample),
    /// Operator message
    StatusText { severity: Severity, text: &'a str },
    /// Disarm request
    Disarm { reason: DisarmReason },
    /// Liveness, with the monitor state code
    Heartbeat { state: u8 },
}

impl<'a> MonitorMessage<'a> {
    /// Encode this message into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            MonitorMessage::Sample(sample) => encode_postcard(MSG_SAMPLE, sample),
            MonitorMessage::StatusText { severity, text } => {
                // Payload: [severity][len][chars...]
                let len = floor_char_boundary(text, MAX_TEXT_LEN);

                let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
                payload
                    .push(severity.as_u8())
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                payload
                    .push(len as u8)
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                payload
                    .extend_from_slice(&text.as_bytes()[..len])
                    .map_err(|_| FrameError::PayloadTooLarge)?;

                Frame::new(MSG_STATUS_TEXT, &payload)
            }
            MonitorMessage::Disarm { reason } => encode_postcard(MSG_DISARM, reason),
            MonitorMessage::Heartbeat { state } => Frame::new(MSG_HEARTBEAT, &[*state]),
        }
    }

    /// Parse a message from a frame (for the flight stack side and tests)
    pub fn from_frame(frame: &'a Frame) -> Result<Self, FrameError> {
        match frame.msg_type {
            MSG_SAMPLE => Ok(MonitorMessage::Sample(decode_postcard(frame)?)),
            MSG_STATUS_TEXT => {
                if frame.payload.len() < 2 {
                    return Err(FrameError::InvalidFrame);
                }
                let severity =
                    Severity::from_u8(frame.payload[0]).ok_or(FrameError::InvalidPayload)?;
                let len = frame.payload[1] as usize;
                let bytes = frame
                    .payload
                    .get(2..2 + len)
                    .ok_or(FrameError::InvalidFrame)?;
                let text = core::str::from_utf8(bytes).map_err(|_| FrameError::InvalidPayload)?;
                Ok(MonitorMessage::StatusText { severity, text })
            }
            MSG_DISARM => Ok(MonitorMessage::Disarm {
                reason: decode_postcard(frame)?,
            }),
            MSG_HEARTBEAT => {
                let state = *frame.payload.first().ok_or(FrameError::InvalidFrame)?;
                Ok(MonitorMessage::Heartbeat { state })
            }
            _ => Err(FrameError::InvalidFrame),
        }
    }
}

/// Longest prefix of `text` within `max` bytes that ends on a char boundary
fn floor_char_boundary(text: &str, max: usize) -> usize {
    if text.len() <= max {
        return text.len();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// Messages from the flight stack to the monitor
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VehicleMessage {
    /// Arming, flight and output snapshot
    Status(VehicleStatus),
    /// Parameter change
    ParamSet(ParamSet),
    /// Forget stored parameters and return to the built-in defaults
    ParamReset,
}

impl VehicleMessage {
    /// Parse a message from a frame
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        match frame.msg_type {
            MSG_VEHICLE_STATUS => Ok(VehicleMessage::Status(decode_postcard(frame)?)),
            MSG_PARAM_SET => Ok(VehicleMessage::ParamSet(decode_postcard(frame)?)),
            MSG_PARAM_RESET => Ok(VehicleMessage::ParamReset),
            _ => Err(FrameError::InvalidFrame),
        }
    }

    /// Encode this message into a frame (for the flight stack side and tests)
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            VehicleMessage::Status(status) => encode_postcard(MSG_VEHICLE_STATUS, status),
            VehicleMessage::ParamSet(set) => encode_postcard(MSG_PARAM_SET, set),
            VehicleMessage::ParamReset => Ok(Frame::empty(MSG_PARAM_RESET)),
        }
    }
}
