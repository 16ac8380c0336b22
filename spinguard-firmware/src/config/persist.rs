//! Parameter persistence
//!
//! Loads and saves runtime-tuned parameters to flash storage.

use defmt::*;

use spinguard_core::config::{ParamTable, StoredParams};
use spinguard_hal_rp2040::flash::{FlashError, FlashStorage, StorageKey};
use spinguard_hal_rp2040::FlashStorageTrait;

/// Maximum serialized parameter record size
const MAX_STORED_SIZE: usize = StorageKey::CheckParams.max_value_len();

/// Parameter persistence errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PersistError {
    /// Flash operation failed
    Flash(FlashError),
    /// Deserialization failed
    Deserialize,
    /// Serialization failed
    Serialize,
    /// Magic, version or CRC mismatch
    InvalidFormat,
}

impl From<FlashError> for PersistError {
    fn from(e: FlashError) -> Self {
        PersistError::Flash(e)
    }
}

/// Lay stored parameters over `defaults`
///
/// Falls back to the defaults unchanged if nothing valid is stored.
pub async fn load_params(storage: &mut FlashStorage<'_>, defaults: ParamTable) -> ParamTable {
    let mut table = defaults;
    match load_inner(storage).await {
        Ok(stored) => {
            let applied = stored.apply_to(&mut table);
            info!("Loaded {} stored parameter(s) from flash", applied);
        }
        Err(PersistError::Flash(FlashError::NotFound)) => {
            debug!("No stored parameters, using vehicle.toml defaults");
        }
        Err(e) => {
            warn!("Failed to load stored parameters: {:?}, using defaults", e);
        }
    }
    table
}

async fn load_inner(storage: &mut FlashStorage<'_>) -> Result<StoredParams, PersistError> {
    let mut buffer = [0u8; MAX_STORED_SIZE];
    let len = storage.read(StorageKey::CheckParams, &mut buffer).await?;

    let stored: StoredParams =
        postcard::from_bytes(&buffer[..len]).map_err(|_| PersistError::Deserialize)?;

    if !stored.is_valid() {
        return Err(PersistError::InvalidFormat);
    }

    Ok(stored)
}

/// Save the live parameter table
pub async fn save_params(
    storage: &mut FlashStorage<'_>,
    table: &ParamTable,
) -> Result<(), PersistError> {
    let stored = StoredParams::from_table(table);

    let mut buffer = [0u8; MAX_STORED_SIZE];
    let bytes = postcard::to_slice(&stored, &mut buffer).map_err(|_| PersistError::Serialize)?;

    debug!("Saving {} bytes of parameters to flash", bytes.len());

    storage.write(StorageKey::CheckParams, bytes).await?;
    Ok(())
}

/// Forget all stored parameters
pub async fn clear_params(storage: &mut FlashStorage<'_>) -> Result<(), PersistError> {
    storage.erase_all().await?;
    Ok(())
}
