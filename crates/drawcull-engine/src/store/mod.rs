//! Instance store.
//!
//! A dense, fixed-capacity array of per-element attributes resident in device
//! memory. Element identity is the index into the array; it is never reassigned.
//! Only the number of elements considered per frame (the active count) varies.

mod instance;
mod buffer;

pub use instance::InstanceData;
pub use buffer::{clamp_active_count, InstanceStore};
