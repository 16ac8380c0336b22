//! RP2040-specific HAL for the spin check monitor firmware
//!
//! Implements the shared `spinguard-hal` traits for the RP2040:
//!
//! - Flash storage driver (implements `spinguard_hal::FlashStorage`)

#![no_std]

pub mod flash;

pub use spinguard_hal::{FlashError, FlashStorage as FlashStorageTrait, StorageKey};
