//! Spin check hardware abstraction layer
//!
//! Traits implemented by chip-specific HALs so the firmware's persistence
//! code does not depend on a particular flash driver.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  spinguard-firmware                     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  spinguard-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  spinguard-hal-rp2040                   │
//! └─────────────────────────────────────────┘
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod flash;

pub use flash::{FlashError, FlashStorage, StorageKey, MAX_VALUE_LEN};
