//! drawcull engine crate.
//!
//! GPU-driven 2D visibility culling with two draw-command strategies, plus the
//! platform and GPU runtime pieces needed to show the result in a window.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod store;
pub mod cull;
pub mod render;
pub mod engine;

pub use engine::{DrawCullEngine, EngineConfig, FrameInput};
