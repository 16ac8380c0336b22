//! Flash storage abstractions
//!
//! Persistent key-value storage implemented by chip-specific HALs on top of
//! their flash memory.

/// Storage keys
///
/// The storage implementation handles wear leveling and data integrity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// Runtime-tuned check parameters (postcard `StoredParams`)
    CheckParams = 0,
}

/// Largest value stored under any key
pub const MAX_VALUE_LEN: usize = 64;

impl StorageKey {
    /// Largest value accepted for this key
    ///
    /// A postcard `StoredParams` record is at most 41 bytes.
    pub const fn max_value_len(self) -> usize {
        match self {
            StorageKey::CheckParams => 64,
        }
    }

    /// Get the key as a byte value
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create a key from a byte value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StorageKey::CheckParams),
            _ => None,
        }
    }
}

/// Errors from flash storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Flash operation failed
    Flash,
    /// Storage operation failed
    Storage,
    /// Key not found
    NotFound,
    /// Buffer too small for the data
    BufferTooSmall,
}

/// Flash storage trait
///
/// Wear-leveled key-value storage. A write replaces any earlier value for
/// the same key.
pub trait FlashStorage {
    /// Read a value by key into `buffer`
    ///
    /// Returns the number of bytes read.
    fn read(
        &mut self,
        key: StorageKey,
        buffer: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, FlashError>>;

    /// Write a value by key
    fn write(
        &mut self,
        key: StorageKey,
        data: &[u8],
    ) -> impl core::future::Future<Output = Result<(), FlashError>>;

    /// Erase all stored data
    fn erase_all(&mut self) -> impl core::future::Future<Output = Result<(), FlashError>>;
}

#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        buffer[0] = self.as_u8();
        Ok(1)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        match StorageKey::from_u8(buffer[0]) {
            Some(key) => Ok((key, 1)),
            None => Err(sequential_storage::map::SerializationError::InvalidFormat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_byte_values() {
        assert_eq!(StorageKey::CheckParams.as_u8(), 0);
        assert_eq!(StorageKey::from_u8(0), Some(StorageKey::CheckParams));
        assert_eq!(StorageKey::from_u8(1), None);
    }

    #[test]
    fn test_value_limits_within_global_max() {
        let keys = [StorageKey::CheckParams];
        for key in keys {
            assert!(key.max_value_len() <= MAX_VALUE_LEN);
            assert_eq!(StorageKey::from_u8(key.as_u8()), Some(key));
        }
    }
}
