//! KISS / BLHeli32 ESC telemetry
//!
//! Each ESC answers a telemetry request with a 10-byte frame at 115200 baud
//! (8N1). Multi-byte fields are big-endian:
//!
//! | Byte | Field                         |
//! |------|-------------------------------|
//! | 0    | Temperature (°C)              |
//! | 1-2  | Voltage (10 mV)               |
//! | 3-4  | Current (10 mA)               |
//! | 5-6  | Consumption (mAh)             |
//! | 7-8  | Electrical RPM / 100          |
//! | 9    | CRC8 over bytes 0-8           |
//!
//! Frames carry no sync byte; framing relies on the gap between answers.

use spinguard_core::crc::crc8;

/// Telemetry frame length in bytes
pub const FRAME_LEN: usize = 10;

/// Telemetry decode errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryError {
    /// Checksum did not match
    CrcMismatch,
    /// Pole count of zero or odd
    InvalidPoles,
}

/// One decoded telemetry frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KissTelemetry {
    /// ESC temperature (°C)
    pub temperature_c: u8,
    /// Supply voltage (10 mV units)
    pub voltage_cv: u16,
    /// Motor current (10 mA units)
    pub current_ca: u16,
    /// Consumed charge since power-up (mAh)
    pub consumption_mah: u16,
    /// Electrical RPM divided by 100
    pub erpm_hundreds: u16,
}

impl KissTelemetry {
    /// Decode and verify a complete frame
    pub fn parse(frame: &[u8; FRAME_LEN]) -> Result<Self, TelemetryError> {
        if crc8(&frame[..FRAME_LEN - 1]) != frame[FRAME_LEN - 1] {
            return Err(TelemetryError::CrcMismatch);
        }

        let be = |i: usize| u16::from_be_bytes([frame[i], frame[i + 1]]);

        Ok(Self {
            temperature_c: frame[0],
            voltage_cv: be(1),
            current_ca: be(3),
            consumption_mah: be(5),
            erpm_hundreds: be(7),
        })
    }

    /// Encode into a frame (for simulation and tests)
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut frame = [0u8; FRAME_LEN];
        frame[0] = self.temperature_c;
        frame[1..3].copy_from_slice(&self.voltage_cv.to_be_bytes());
        frame[3..5].copy_from_slice(&self.current_ca.to_be_bytes());
        frame[5..7].copy_from_slice(&self.consumption_mah.to_be_bytes());
        frame[7..9].copy_from_slice(&self.erpm_hundreds.to_be_bytes());
        frame[9] = crc8(&frame[..9]);
        frame
    }

    /// Electrical RPM
    pub fn erpm(&self) -> u32 {
        self.erpm_hundreds as u32 * 100
    }

    /// Mechanical RPM for a motor with `poles` magnet poles
    pub fn rpm(&self, poles: u8) -> Result<u32, TelemetryError> {
        if poles == 0 || poles % 2 != 0 {
            return Err(TelemetryError::InvalidPoles);
        }
        // One mechanical turn is poles/2 electrical turns
        Ok(self.erpm() * 2 / poles as u32)
    }
}

/// Collects bytes into telemetry frames
///
/// The owner calls [`FrameAssembler::reset`] when the line goes idle, so a
/// truncated answer never bleeds into the next ESC's frame.
#[derive(Debug, Clone, Default)]
pub struct FrameAssembler {
    buffer: [u8; FRAME_LEN],
    len: usize,
}

impl FrameAssembler {
    pub const fn new() -> Self {
        Self {
            buffer: [0; FRAME_LEN],
            len: 0,
        }
    }

    /// Discard any partial frame
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Bytes collected towards the current frame
    pub fn pending(&self) -> usize {
        self.len
    }

    /// Add one byte
    ///
    /// Returns the decode result once ten bytes have been collected.
    pub fn push(&mut self, byte: u8) -> Option<Result<KissTelemetry, TelemetryError>> {
        self.buffer[self.len] = byte;
        self.len += 1;
        if self.len < FRAME_LEN {
            return None;
        }
        self.len = 0;
        Some(KissTelemetry::parse(&self.buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hover() -> KissTelemetry {
        KissTelemetry {
            temperature_c: 41,
            voltage_cv: 1620,
            current_ca: 850,
            consumption_mah: 312,
            erpm_hundreds: 400,
        }
    }

    #[test]
    fn test_parse_fields() {
        let frame = hover().encode();
        assert_eq!(frame[0], 41);
        assert_eq!(&frame[1..3], &[0x06, 0x54]); // 1620 big-endian

        let parsed = KissTelemetry::parse(&frame).unwrap();
        assert_eq!(parsed, hover());
        assert_eq!(parsed.erpm(), 40_000);
    }

    #[test]
    fn test_parse_bad_crc() {
        let mut frame = hover().encode();
        frame[9] ^= 0x01;
        assert_eq!(
            KissTelemetry::parse(&frame),
            Err(TelemetryError::CrcMismatch)
        );
    }

    #[test]
    fn test_mechanical_rpm() {
        let t = hover();
        assert_eq!(t.rpm(14), Ok(5714));
        assert_eq!(t.rpm(2), Ok(40_000));
        assert_eq!(t.rpm(0), Err(TelemetryError::InvalidPoles));
        assert_eq!(t.rpm(7), Err(TelemetryError::InvalidPoles));
    }

    #[test]
    fn test_assembler_emits_every_ten_bytes() {
        let mut assembler = FrameAssembler::new();
        let frame = hover().encode();

        for &byte in &frame[..9] {
            assert!(assembler.push(byte).is_none());
        }
        assert_eq!(assembler.pending(), 9);
        assert_eq!(assembler.push(frame[9]), Some(Ok(hover())));
        assert_eq!(assembler.pending(), 0);
    }

    #[test]
    fn test_assembler_reset_drops_partial() {
        let mut assembler = FrameAssembler::new();
        let frame = hover().encode();

        assembler.push(0xFF);
        assembler.push(0xFF);
        assembler.reset();

        let mut result = None;
        for &byte in &frame {
            result = assembler.push(byte);
        }
        assert_eq!(result, Some(Ok(hover())));
    }

    proptest! {
        #[test]
        fn prop_single_bit_flip_detected(bit in 0usize..(FRAME_LEN * 8)) {
            let mut frame = hover().encode();
            frame[bit / 8] ^= 1 << (bit % 8);
            prop_assert_eq!(KissTelemetry::parse(&frame), Err(TelemetryError::CrcMismatch));
        }
    }
}
