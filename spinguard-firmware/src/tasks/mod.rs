//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod esc_telemetry;
pub mod link_rx;
pub mod link_tx;
pub mod param_store;
pub mod rpm_check;

pub use esc_telemetry::esc_telemetry_task;
pub use link_rx::link_rx_task;
pub use link_tx::link_tx_task;
pub use param_store::param_store_task;
pub use rpm_check::rpm_check_task;
