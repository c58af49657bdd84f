use anyhow::{Context, Result};

use super::{adapter, GpuInit};

/// Headless device + queue (no surface).
///
/// Used by tests and tools that only dispatch compute work or render offscreen.
pub struct ComputeDevice {
    adapter_info: wgpu::AdapterInfo,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl ComputeDevice {
    /// Requests an adapter without a compatible surface.
    ///
    /// Only `required_features`, `required_limits` and `force_fallback_adapter`
    /// are read from `init`; the surface options are ignored.
    pub async fn new(init: &GpuInit) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: init.force_fallback_adapter,
            })
            .await
            .context("failed to find a GPU adapter for headless use")?;

        let (device, queue) = adapter::open_device(
            &adapter,
            init.required_features,
            init.required_limits.clone(),
            "drawcull headless device",
        )
        .await?;

        Ok(Self {
            adapter_info: adapter.get_info(),
            device,
            queue,
        })
    }

    /// Blocking convenience around [`ComputeDevice::new`].
    pub fn new_blocking(init: &GpuInit) -> Result<Self> {
        pollster::block_on(Self::new(init))
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
