//! Checksums shared by the link, the ESC telemetry decoder and the
//! persisted parameter record

/// CRC-8, polynomial 0x07, MSB first, initial value 0
///
/// Used by both the link frames and KISS ESC telemetry.
pub fn crc8(data: &[u8]) -> u8 {
    crc8_update(0, data)
}

/// Continue a CRC-8 over more data
pub fn crc8_update(mut crc: u8, data: &[u8]) -> u8 {
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x07
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Initial CRC-32 register value
pub const CRC32_INIT: u32 = 0xFFFF_FFFF;

/// Continue a CRC-32 (IEEE, reflected) over more data
///
/// Start from [`CRC32_INIT`] and invert the final register.
pub fn crc32_update(mut crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
