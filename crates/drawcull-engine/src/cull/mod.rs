//! Visibility culling and draw-command generation.
//!
//! One algorithm, two output strategies:
//! - `CullMode::MicroBatch` emits one indirect command per visible element
//! - `CullMode::CompactedInstance` emits a compacted id list plus one shared command
//!
//! Both reserve output slots from a single atomic counter. `GpuCuller` runs the
//! algorithm on the device; `host` holds the reference implementation used to
//! check it.

mod command;
mod gpu;
pub mod host;
mod mode;
mod slots;
mod visibility;

pub use command::{DrawCommand, QUAD_INDEX_COUNT};
pub use gpu::{CullOutcome, GpuCuller, CULL_WORKGROUP_SIZE};
pub use mode::CullMode;
pub use slots::SlotCounter;
pub use visibility::is_visible;
