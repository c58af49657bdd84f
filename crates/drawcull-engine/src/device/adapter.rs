use anyhow::{Context, Result};

/// Creates the logical device, failing early when the adapter lacks a required feature.
pub(crate) async fn open_device(
    adapter: &wgpu::Adapter,
    required_features: wgpu::Features,
    required_limits: wgpu::Limits,
    label: &str,
) -> Result<(wgpu::Device, wgpu::Queue)> {
    let info = adapter.get_info();
    anyhow::ensure!(
        adapter.features().contains(required_features),
        "adapter {} ({:?}) does not support required features {:?}",
        info.name,
        info.backend,
        required_features,
    );

    log::info!("using adapter {} ({:?}, {:?})", info.name, info.backend, info.device_type);

    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some(label),
            required_features,
            required_limits,
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")
}
