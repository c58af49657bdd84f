//! Time subsystem.
//!
//! - one `FrameClock` per render loop; call `tick()` once per presented frame
//! - `StatsWindow` turns frame times into periodic frame-rate reports

mod frame_clock;
mod stats;

pub use frame_clock::{FrameClock, FrameTime};
pub use stats::{FrameRate, StatsWindow};
