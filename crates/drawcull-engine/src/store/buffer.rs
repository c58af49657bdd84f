use anyhow::Result;
use wgpu::util::DeviceExt;

use super::InstanceData;

/// Device-resident element array with a fixed capacity.
///
/// The buffer is uploaded once at construction and never written again; culling
/// and rendering bind it read-only. A host copy is kept for reference checks.
pub struct InstanceStore {
    buffer: wgpu::Buffer,
    host: Vec<InstanceData>,
}

impl InstanceStore {
    /// Uploads `instances`; their count becomes the store capacity.
    pub fn new(device: &wgpu::Device, instances: Vec<InstanceData>) -> Result<Self> {
        anyhow::ensure!(!instances.is_empty(), "instance store needs at least one element");
        anyhow::ensure!(
            u32::try_from(instances.len()).is_ok(),
            "instance store capacity {} exceeds u32 range",
            instances.len()
        );

        let size = instances.len() as u64 * InstanceData::STRIDE;
        let max_binding = device.limits().max_storage_buffer_binding_size as u64;
        anyhow::ensure!(
            size <= max_binding,
            "instance buffer of {size} bytes exceeds max storage binding size {max_binding}"
        );

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("drawcull instance buffer"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        log::info!(
            "instance store: {} elements ({:.1} MiB)",
            instances.len(),
            size as f64 / (1024.0 * 1024.0)
        );

        Ok(Self {
            buffer,
            host: instances,
        })
    }

    /// Number of elements the store holds; the upper bound for any active count.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.host.len() as u32
    }

    /// Clamps a requested active count to the store capacity.
    #[inline]
    pub fn clamp_active(&self, requested: u32) -> u32 {
        clamp_active_count(requested, self.capacity())
    }

    #[inline]
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Host copy of the uploaded elements.
    #[inline]
    pub fn host_data(&self) -> &[InstanceData] {
        &self.host
    }
}

/// Active counts never exceed capacity; dispatches are sized from the result.
#[inline]
pub fn clamp_active_count(requested: u32, capacity: u32) -> u32 {
    requested.min(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_counts_within_capacity() {
        assert_eq!(clamp_active_count(0, 10), 0);
        assert_eq!(clamp_active_count(7, 10), 7);
        assert_eq!(clamp_active_count(10, 10), 10);
        assert_eq!(clamp_active_count(u32::MAX, 10), 10);
    }
}
