//! GPU rendering of culled elements.
//!
//! Convention:
//! - element positions and sizes are in projection space, not pixels
//! - the vertex shader resolves each draw instance back to its element
//! - renderers own their pipelines; shared buffers come from `store` and `cull`

mod common;
mod ctx;
mod instances;

pub use ctx::{RenderCtx, RenderTarget};
pub use instances::InstanceRenderer;
