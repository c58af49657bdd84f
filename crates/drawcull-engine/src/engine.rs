//! Per-frame orchestration: cull on the device, then draw what survived.

use anyhow::Result;

use crate::coords::{ColorRgba, Mat4};
use crate::cull::host::cull_with_mode;
use crate::cull::{CullMode, CullOutcome, GpuCuller};
use crate::render::{InstanceRenderer, RenderCtx, RenderTarget};
use crate::store::{InstanceData, InstanceStore};

/// Engine construction parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of elements in the store. Fixed for the engine's lifetime.
    pub capacity: u32,
    pub clear_color: ColorRgba,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity: 1_000_000,
            clear_color: ColorRgba::gray(0.1),
        }
    }
}

/// What the control layer selects for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameInput {
    pub mode: CullMode,
    /// Requested active count; clamped to capacity.
    pub active_count: u32,
    pub projection: Mat4,
}

impl FrameInput {
    /// Frame over the default `[-1, 1]` view.
    pub fn new(mode: CullMode, active_count: u32) -> Self {
        Self {
            mode,
            active_count,
            projection: Mat4::unit_view(),
        }
    }
}

/// Owns the instance store, the culler and the renderer for one device.
pub struct DrawCullEngine {
    store: InstanceStore,
    culler: GpuCuller,
    renderer: InstanceRenderer,
    clear_color: ColorRgba,
}

impl DrawCullEngine {
    /// Uploads `instances` and builds every buffer and pipeline.
    ///
    /// `instances.len()` must equal `config.capacity`.
    pub fn new(
        device: &wgpu::Device,
        config: &EngineConfig,
        instances: Vec<InstanceData>,
    ) -> Result<Self> {
        anyhow::ensure!(
            instances.len() == config.capacity as usize,
            "expected {} instances, got {}",
            config.capacity,
            instances.len()
        );

        let store = InstanceStore::new(device, instances)?;
        let culler = GpuCuller::new(device, &store)?;
        let renderer = InstanceRenderer::new(device, &store, &culler);

        log::info!("engine ready: capacity {}", store.capacity());

        Ok(Self {
            store,
            culler,
            renderer,
            clear_color: config.clear_color,
        })
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.store.capacity()
    }

    #[inline]
    pub fn store(&self) -> &InstanceStore {
        &self.store
    }

    #[inline]
    pub fn culler(&self) -> &GpuCuller {
        &self.culler
    }

    /// Culls in its own submission, blocks on the counter, then records the
    /// clear and the draw into `target`.
    ///
    /// The caller submits `target.encoder`; it lands after the culling work on
    /// the same queue, so the indirect arguments are complete when drawn.
    pub fn run_frame(
        &mut self,
        rctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        input: &FrameInput,
    ) -> Result<CullOutcome> {
        let outcome = self.culler.dispatch(
            rctx.device,
            rctx.queue,
            input.mode,
            input.active_count,
            &input.projection,
        )?;

        target.clear(self.clear_color.into());
        self.renderer
            .render(rctx, target, &self.culler, &outcome, &input.projection);

        Ok(outcome)
    }

    /// Visible count from running `mode` over the host copy of the store.
    pub fn host_visible_count(&self, mode: CullMode, active: u32, projection: &Mat4) -> u32 {
        let active = self.store.clamp_active(active);
        cull_with_mode(self.store.host_data(), mode, active, projection)
    }
}
