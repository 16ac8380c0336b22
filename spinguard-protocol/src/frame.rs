//! Frame encoding and decoding for the spin check link.
//!
//! Frame format:
//! - START (1 byte): 0xA5 synchronization byte
//! - LENGTH (1 byte): payload length (0-128)
//! - TYPE (1 byte): message type identifier
//! - PAYLOAD (0-128 bytes): type-specific data
//! - CRC8 (1 byte): CRC-8 (poly 0x07, init 0) of LENGTH, TYPE and PAYLOAD

use heapless::Vec;

use spinguard_core::crc::{crc8, crc8_update};

/// Frame synchronization byte
pub const FRAME_START: u8 = 0xA5;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 128;

/// Maximum complete frame size (START + LENGTH + TYPE + MAX_PAYLOAD + CRC8)
pub const MAX_FRAME_SIZE: usize = 1 + 1 + 1 + MAX_PAYLOAD_SIZE + 1;

/// Errors that can occur during frame parsing, encoding or message decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// CRC mismatch
    InvalidCrc,
    /// Invalid frame structure or unknown message type
    InvalidFrame,
    /// Payload does not decode as the message type
    InvalidPayload,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type identifier
    pub msg_type: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given message type and payload
    pub fn new(msg_type: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self {
            msg_type,
            payload: payload_vec,
        })
    }

    /// Create a frame with no payload
    pub fn empty(msg_type: u8) -> Self {
        Self {
            msg_type,
            payload: Vec::new(),
        }
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let payload_len = self.payload.len();
        let frame_len = 4 + payload_len;
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        buffer[0] = FRAME_START;
        buffer[1] = payload_len as u8;
        buffer[2] = self.msg_type;
        buffer[3..3 + payload_len].copy_from_slice(&self.payload);
        buffer[3 + payload_len] = crc8(&buffer[1..3 + payload_len]);

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }
}

/// State machine for parsing incoming frames
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    buffer: Vec<u8, MAX_PAYLOAD_SIZE>,
    expected_length: u8,
    msg_type: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for START byte
    WaitingForStart,
    /// Got START, waiting for LENGTH
    WaitingForLength,
    /// Got LENGTH, waiting for TYPE
    WaitingForType,
    /// Reading payload bytes
    ReadingPayload,
    /// Waiting for CRC
    WaitingForCrc,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForStart,
            buffer: Vec::new(),
            expected_length: 0,
            msg_type: 0,
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForStart;
        self.buffer.clear();
        self.expected_length = 0;
        self.msg_type = 0;
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on parse error.
    /// The parser is ready for the next frame after an error.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        match self.state {
            ParseState::WaitingForStart => {
                if byte == FRAME_START {
                    self.state = ParseState::WaitingForLength;
                }
                Ok(None)
            }
            ParseState::WaitingForLength => {
                if byte as usize > MAX_PAYLOAD_SIZE {
                    self.reset();
                    return Err(FrameError::InvalidFrame);
                }
                self.expected_length = byte;
                self.state = ParseState::WaitingForType;
                Ok(None)
            }
            ParseState::WaitingForType => {
                self.msg_type = byte;
                self.buffer.clear();
                self.state = if self.expected_length == 0 {
                    ParseState::WaitingForCrc
                } else {
                    ParseState::ReadingPayload
                };
                Ok(None)
            }
            ParseState::ReadingPayload => {
                // Cannot overflow: expected_length <= MAX_PAYLOAD_SIZE
                let _ = self.buffer.push(byte);
                if self.buffer.len() == self.expected_length as usize {
                    self.state = ParseState::WaitingForCrc;
                }
                Ok(None)
            }
            ParseState::WaitingForCrc => {
                let header = crc8(&[self.expected_length, self.msg_type]);
                let expected = crc8_update(header, &self.buffer);

                if byte != expected {
                    self.reset();
                    return Err(FrameError::InvalidCrc);
                }

                let frame = Frame {
                    msg_type: self.msg_type,
                    payload: self.buffer.clone(),
                };

                self.reset();
                Ok(Some(frame))
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found, if any.
    /// Remaining bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Frame>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}
