//! Parameter flash store for RP2040
//!
//! The top four erase sectors of the 2 MB flash hold a sequential-storage
//! map. There is one record per [`StorageKey`]; writing a key appends a
//! new item and the map compacts old ones as sectors fill.

use core::ops::Range;

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use sequential_storage::cache::PagePointerCache;
use sequential_storage::map;
use sequential_storage::Error as StorageError;

pub use spinguard_hal::flash::{FlashError, StorageKey, MAX_VALUE_LEN};

/// Flash size of the Pico
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Sectors reserved for parameters
pub const PARAM_SECTORS: usize = 4;

/// Start of the parameter partition (flash offset)
pub const PARAM_PARTITION_START: u32 = (FLASH_SIZE - PARAM_SECTORS * ERASE_SIZE) as u32;

/// Parameter partition range (flash offsets)
pub const PARAM_RANGE: Range<u32> = PARAM_PARTITION_START..FLASH_SIZE as u32;

/// Key byte plus the largest value, word aligned
const ITEM_BUFFER_LEN: usize = (1 + MAX_VALUE_LEN).next_multiple_of(4);

/// RP2040 parameter store
pub struct Rp2040FlashStorage<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
    /// Remembers where the map's open pages are between calls
    cache: PagePointerCache<PARAM_SECTORS>,
}

impl<'d> Rp2040FlashStorage<'d> {
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
            cache: PagePointerCache::new(),
        }
    }
}

fn map_error<E>(e: StorageError<E>) -> FlashError {
    match e {
        StorageError::Storage { .. } => FlashError::Flash,
        _ => FlashError::Storage,
    }
}

impl spinguard_hal::FlashStorage for Rp2040FlashStorage<'_> {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let mut item = [0u8; ITEM_BUFFER_LEN];

        let value = map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            PARAM_RANGE,
            &mut self.cache,
            &mut item,
            &key,
        )
        .await
        .map_err(map_error)?
        .ok_or(FlashError::NotFound)?;

        let dest = buffer
            .get_mut(..value.len())
            .ok_or(FlashError::BufferTooSmall)?;
        dest.copy_from_slice(value);
        Ok(value.len())
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        if data.len() > key.max_value_len() {
            return Err(FlashError::BufferTooSmall);
        }

        let mut item = [0u8; ITEM_BUFFER_LEN];
        map::store_item(
            &mut self.flash,
            PARAM_RANGE,
            &mut self.cache,
            &mut item,
            &key,
            &data,
        )
        .await
        .map_err(map_error)
    }

    async fn erase_all(&mut self) -> Result<(), FlashError> {
        let result = sequential_storage::erase_all(&mut self.flash, PARAM_RANGE).await;
        // Page pointers are meaningless after an erase
        self.cache = PagePointerCache::new();
        result.map_err(map_error)
    }
}

/// Flash storage used by the firmware
pub type FlashStorage<'d> = Rp2040FlashStorage<'d>;
