//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue (windowed or headless)
//! - creating & configuring the Surface (swapchain)
//! - acquiring frames and providing encoders/views for rendering
//! - blocking buffer readback

mod adapter;
mod compute;
mod gpu;
mod init;
mod readback;
mod surface;

pub use compute::ComputeDevice;
pub use gpu::{Gpu, GpuFrame};
pub use init::GpuInit;
pub use readback::{map_read_blocking, read_buffer};
pub use surface::SurfaceErrorAction;
