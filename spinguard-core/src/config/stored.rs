//! Persisted parameter values
//!
//! Runtime parameter edits are written to flash as a [`StoredParams`] record
//! and laid over the embedded defaults on the next boot.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::params::{ParamId, ParamSource, ParamTable, PARAM_COUNT};
use crate::crc::{crc32_update, CRC32_INIT};

/// Magic number to identify stored parameters
pub const STORED_PARAMS_MAGIC: u32 = 0x5350_524D; // "SPRM"

/// Current stored parameter format version
pub const STORED_PARAMS_VERSION: u8 = 1;

/// Flash record of parameter values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StoredParams {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    /// Values in wire-index order; `None` was never set
    pub values: [Option<u32>; PARAM_COUNT],
    /// CRC32 over magic, version and values
    pub crc: u32,
}

impl StoredParams {
    /// Snapshot a table, with the CRC filled in
    pub fn from_table(table: &ParamTable) -> Self {
        let mut stored = Self {
            magic: STORED_PARAMS_MAGIC,
            version: STORED_PARAMS_VERSION,
            values: ParamId::ALL.map(|id| table.get(id)),
            crc: 0,
        };
        stored.crc = stored.calculate_crc();
        stored
    }

    /// Magic, version and CRC all check out
    pub fn is_valid(&self) -> bool {
        self.magic == STORED_PARAMS_MAGIC
            && self.version == STORED_PARAMS_VERSION
            && self.crc == self.calculate_crc()
    }

    /// Lay stored values over `table`
    ///
    /// Values outside the current range are skipped and keep the table's
    /// value. Returns the number of values applied.
    pub fn apply_to(&self, table: &mut ParamTable) -> usize {
        ParamId::ALL
            .iter()
            .zip(self.values.iter())
            .filter_map(|(&id, value)| value.map(|v| (id, v)))
            .filter(|&(id, value)| table.set(id, value).is_ok())
            .count()
    }

    /// CRC32 (IEEE) of everything except the crc field
    pub fn calculate_crc(&self) -> u32 {
        let mut crc = CRC32_INIT;
        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version]);
        for value in &self.values {
            match value {
                Some(v) => {
                    crc = crc32_update(crc, &[1]);
                    crc = crc32_update(crc, &v.to_le_bytes());
                }
                None => crc = crc32_update(crc, &[0]),
            }
        }
        !crc
    }
}
