use std::num::NonZeroU64;

use anyhow::Result;
use bytemuck::{Pod, Zeroable};

use crate::coords::Mat4;
use crate::device::{map_read_blocking, read_buffer};
use crate::store::{InstanceData, InstanceStore};

use super::{CullMode, DrawCommand};

/// Invocations per workgroup for both culling entry points.
pub const CULL_WORKGROUP_SIZE: u32 = 256;

const COUNTER_SIZE: u64 = std::mem::size_of::<u32>() as u64;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CullParams {
    projection: Mat4,
    active_count: u32,
    _pad: [u32; 3],
}

const _: () = assert!(std::mem::size_of::<CullParams>() == 80);

/// Result of one culling dispatch, after the counter readback.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CullOutcome {
    pub mode: CullMode,
    /// Active count after clamping to capacity.
    pub active_count: u32,
    pub visible_count: u32,
}

impl CullOutcome {
    /// Native draws the renderer issues for this outcome.
    #[inline]
    pub fn draw_submissions(&self) -> u32 {
        self.mode.draw_submissions(self.visible_count)
    }
}

/// Device-side visibility culling over an [`InstanceStore`].
///
/// Owns the counter, both strategies' output buffers and the three compute
/// pipelines. Every buffer is allocated at store capacity up front; a frame
/// only rewrites the params uniform and resets the counter.
///
/// Encoding order within a frame:
/// 1. `encode_counter_reset`
/// 2. `encode_cull` (compacted mode adds the shared-command reset pass before
///    and the counter copy after)
/// 3. `encode_counter_readback`, then `read_visible_count` once submitted
pub struct GpuCuller {
    capacity: u32,

    params_ubo: wgpu::Buffer,
    counter: wgpu::Buffer,
    counter_staging: wgpu::Buffer,

    micro_commands: wgpu::Buffer,
    shared_command: wgpu::Buffer,
    visible_ids: wgpu::Buffer,

    micro_bind_group: wgpu::BindGroup,
    compacted_bind_group: wgpu::BindGroup,

    reset_pipeline: wgpu::ComputePipeline,
    micro_pipeline: wgpu::ComputePipeline,
    compacted_pipeline: wgpu::ComputePipeline,
}

impl GpuCuller {
    pub fn new(device: &wgpu::Device, store: &InstanceStore) -> Result<Self> {
        let capacity = store.capacity();
        let limits = device.limits();

        let commands_size = capacity as u64 * DrawCommand::SIZE;
        let ids_size = capacity as u64 * COUNTER_SIZE;
        let max_binding = limits.max_storage_buffer_binding_size as u64;
        anyhow::ensure!(
            commands_size <= max_binding,
            "command buffer of {commands_size} bytes exceeds max storage binding size {max_binding}"
        );

        let groups = capacity.div_ceil(CULL_WORKGROUP_SIZE);
        anyhow::ensure!(
            groups <= limits.max_compute_workgroups_per_dimension,
            "capacity {capacity} needs {groups} workgroups, device allows {}",
            limits.max_compute_workgroups_per_dimension
        );

        let params_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("drawcull cull params ubo"),
            size: std::mem::size_of::<CullParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let counter = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("drawcull visible counter"),
            size: COUNTER_SIZE,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let counter_staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("drawcull visible counter staging"),
            size: COUNTER_SIZE,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let micro_commands = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("drawcull micro-batch commands"),
            size: commands_size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::INDIRECT
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let shared_command = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("drawcull shared command"),
            size: DrawCommand::SIZE,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::INDIRECT
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let visible_ids = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("drawcull visible ids"),
            size: ids_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("drawcull cull shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/cull.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("drawcull cull bgl"),
            entries: &[
                storage_entry(0, true, NonZeroU64::new(InstanceData::STRIDE)),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(std::mem::size_of::<CullParams>() as u64),
                    },
                    count: None,
                },
                storage_entry(2, false, NonZeroU64::new(COUNTER_SIZE)),
                storage_entry(3, false, NonZeroU64::new(DrawCommand::SIZE)),
                storage_entry(4, false, NonZeroU64::new(COUNTER_SIZE)),
            ],
        });

        let make_bind_group = |label: &str, commands: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: store.buffer().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: params_ubo.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: counter.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: commands.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: visible_ids.as_entire_binding(),
                    },
                ],
            })
        };

        let micro_bind_group = make_bind_group("drawcull cull micro-batch bind group", &micro_commands);
        let compacted_bind_group =
            make_bind_group("drawcull cull compacted bind group", &shared_command);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("drawcull cull pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let make_pipeline = |entry: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(entry),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some(entry),
                compilation_options: Default::default(),
                cache: None,
            })
        };

        let reset_pipeline = make_pipeline("reset_shared_command");
        let micro_pipeline = make_pipeline("cull_micro_batch");
        let compacted_pipeline = make_pipeline("cull_compacted");

        log::debug!(
            "cull pipelines built: capacity {capacity}, commands {commands_size} B, ids {ids_size} B"
        );

        Ok(Self {
            capacity,
            params_ubo,
            counter,
            counter_staging,
            micro_commands,
            shared_command,
            visible_ids,
            micro_bind_group,
            compacted_bind_group,
            reset_pipeline,
            micro_pipeline,
            compacted_pipeline,
        })
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Uploads the projection and active count for the next dispatch.
    ///
    /// `active` must already be clamped to capacity.
    pub fn write_params(&self, queue: &wgpu::Queue, projection: &Mat4, active: u32) {
        let params = CullParams {
            projection: *projection,
            active_count: active,
            _pad: [0; 3],
        };
        queue.write_buffer(&self.params_ubo, 0, bytemuck::bytes_of(&params));
    }

    /// Zeroes the visible counter. Must precede `encode_cull` in the same frame.
    pub fn encode_counter_reset(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.clear_buffer(&self.counter, 0, None);
    }

    /// Records the culling work for `mode` over `0..active`.
    ///
    /// Compute passes are ordered by wgpu, so the shared-command reset pass
    /// completes before the first increment and every increment is visible to
    /// the counter copy and to later indirect draws.
    pub fn encode_cull(&self, encoder: &mut wgpu::CommandEncoder, mode: CullMode, active: u32) {
        let groups = active.min(self.capacity).div_ceil(CULL_WORKGROUP_SIZE);

        match mode {
            CullMode::MicroBatch => {
                run_pass(
                    encoder,
                    "drawcull cull micro-batch pass",
                    &self.micro_pipeline,
                    &self.micro_bind_group,
                    groups,
                );
            }
            CullMode::CompactedInstance => {
                run_pass(
                    encoder,
                    "drawcull shared command reset pass",
                    &self.reset_pipeline,
                    &self.compacted_bind_group,
                    1,
                );
                run_pass(
                    encoder,
                    "drawcull cull compacted pass",
                    &self.compacted_pipeline,
                    &self.compacted_bind_group,
                    groups,
                );

                encoder.copy_buffer_to_buffer(
                    &self.counter,
                    0,
                    &self.shared_command,
                    DrawCommand::INSTANCE_COUNT_OFFSET,
                    COUNTER_SIZE,
                );
            }
        }
    }

    /// Copies the counter into the persistent staging buffer.
    pub fn encode_counter_readback(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_buffer_to_buffer(&self.counter, 0, &self.counter_staging, 0, COUNTER_SIZE);
    }

    /// Blocks until the staged counter is available and returns it.
    ///
    /// Call after submitting the encoder that ran `encode_counter_readback`.
    pub fn read_visible_count(&self, device: &wgpu::Device) -> Result<u32> {
        let bytes = map_read_blocking(device, &self.counter_staging, COUNTER_SIZE)?;
        Ok(bytemuck::pod_read_unaligned(&bytes))
    }

    /// Runs one full culling frame in its own submission and reads the count back.
    pub fn dispatch(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mode: CullMode,
        active: u32,
        projection: &Mat4,
    ) -> Result<CullOutcome> {
        let active = active.min(self.capacity);
        self.write_params(queue, projection, active);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("drawcull cull encoder"),
        });
        self.encode_counter_reset(&mut encoder);
        self.encode_cull(&mut encoder, mode, active);
        self.encode_counter_readback(&mut encoder);
        queue.submit(std::iter::once(encoder.finish()));

        let visible_count = self.read_visible_count(device)?;
        log::trace!("cull {mode}: {visible_count}/{active} visible");

        Ok(CullOutcome {
            mode,
            active_count: active,
            visible_count,
        })
    }

    // ── debug readbacks ───────────────────────────────────────────────────

    /// Current counter value, read through a temporary staging buffer.
    pub fn read_counter(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<u32> {
        let bytes = read_buffer(device, queue, &self.counter, 0, COUNTER_SIZE)?;
        Ok(bytemuck::pod_read_unaligned(&bytes))
    }

    /// The first `visible` micro-batch commands.
    pub fn read_valid_commands(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        visible: u32,
    ) -> Result<Vec<DrawCommand>> {
        let n = visible.min(self.capacity) as u64;
        let bytes = read_buffer(device, queue, &self.micro_commands, 0, n * DrawCommand::SIZE)?;
        Ok(bytes
            .chunks_exact(DrawCommand::SIZE as usize)
            .map(bytemuck::pod_read_unaligned::<DrawCommand>)
            .collect())
    }

    pub fn read_shared_command(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<DrawCommand> {
        let bytes = read_buffer(device, queue, &self.shared_command, 0, DrawCommand::SIZE)?;
        Ok(bytemuck::pod_read_unaligned(&bytes))
    }

    /// The first `visible` entries of the compacted id list.
    pub fn read_visible_ids(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        visible: u32,
    ) -> Result<Vec<u32>> {
        let n = visible.min(self.capacity) as u64;
        let bytes = read_buffer(device, queue, &self.visible_ids, 0, n * COUNTER_SIZE)?;
        Ok(bytes
            .chunks_exact(COUNTER_SIZE as usize)
            .map(bytemuck::pod_read_unaligned::<u32>)
            .collect())
    }

    // ── buffers consumed by the renderer ──────────────────────────────────

    #[inline]
    pub fn micro_commands(&self) -> &wgpu::Buffer {
        &self.micro_commands
    }

    #[inline]
    pub fn shared_command(&self) -> &wgpu::Buffer {
        &self.shared_command
    }

    #[inline]
    pub fn visible_ids(&self) -> &wgpu::Buffer {
        &self.visible_ids
    }

}

fn run_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    pipeline: &wgpu::ComputePipeline,
    bind_group: &wgpu::BindGroup,
    groups: u32,
) {
    let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some(label),
        timestamp_writes: None,
    });
    cpass.set_pipeline(pipeline);
    cpass.set_bind_group(0, bind_group, &[]);
    if groups > 0 {
        cpass.dispatch_workgroups(groups, 1, 1);
    }
}

fn storage_entry(
    binding: u32,
    read_only: bool,
    min_binding_size: Option<NonZeroU64>,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size,
        },
        count: None,
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::coords::{ColorRgba, Vec2};
    use crate::cull::host::reference_visible;
    use crate::cull::QUAD_INDEX_COUNT;
    use crate::device::{ComputeDevice, GpuInit};

    fn headless() -> Option<ComputeDevice> {
        match ComputeDevice::new_blocking(&GpuInit::default()) {
            Ok(dev) => Some(dev),
            Err(err) => {
                eprintln!("skipping device test: {err:#}");
                None
            }
        }
    }

    fn at(x: f32, y: f32) -> InstanceData {
        InstanceData::new(Vec2::new(x, y), Vec2::splat(0.01), ColorRgba::white())
    }

    fn random_layout(n: usize, seed: u64) -> Vec<InstanceData> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| at(rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5)))
            .collect()
    }

    fn setup(dev: &ComputeDevice, instances: Vec<InstanceData>) -> (InstanceStore, GpuCuller) {
        let store = InstanceStore::new(dev.device(), instances).expect("store");
        let culler = GpuCuller::new(dev.device(), &store).expect("culler");
        (store, culler)
    }

    fn sorted(mut ids: Vec<u32>) -> Vec<u32> {
        ids.sort_unstable();
        ids
    }

    // ── counts ────────────────────────────────────────────────────────────

    #[test]
    fn counter_matches_host_reference_for_many_active_counts() {
        let Some(dev) = headless() else { return };
        let (store, culler) = setup(&dev, random_layout(10_000, 1));
        let proj = Mat4::unit_view();

        for k in [0, 1, 255, 256, 257, 4_097, 9_999, 10_000, 50_000] {
            let expected = reference_visible(store.host_data(), k, &proj).len() as u32;
            for mode in CullMode::ALL {
                let out = culler
                    .dispatch(dev.device(), dev.queue(), mode, k, &proj)
                    .expect("dispatch");
                assert_eq!(out.active_count, k.min(10_000));
                assert_eq!(out.visible_count, expected, "mode {mode}, k {k}");
            }
        }
    }

    #[test]
    fn counter_reset_makes_dispatch_idempotent() {
        let Some(dev) = headless() else { return };
        let (_store, culler) = setup(&dev, random_layout(2_000, 2));
        let proj = Mat4::unit_view();

        let a = culler.dispatch(dev.device(), dev.queue(), CullMode::MicroBatch, 2_000, &proj).expect("a");
        let b = culler.dispatch(dev.device(), dev.queue(), CullMode::MicroBatch, 2_000, &proj).expect("b");
        assert_eq!(a.visible_count, b.visible_count);
    }

    #[test]
    fn skipping_counter_reset_doubles_the_count() {
        let Some(dev) = headless() else { return };
        let (_store, culler) = setup(&dev, random_layout(2_000, 3));
        let proj = Mat4::unit_view();

        let once = culler
            .dispatch(dev.device(), dev.queue(), CullMode::CompactedInstance, 2_000, &proj)
            .expect("dispatch")
            .visible_count;

        let mut encoder = dev.device().create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("unreset cull encoder"),
        });
        culler.encode_cull(&mut encoder, CullMode::CompactedInstance, 2_000);
        dev.queue().submit(std::iter::once(encoder.finish()));

        assert_eq!(culler.read_counter(dev.device(), dev.queue()).expect("counter"), once * 2);
    }

    // ── command contents ──────────────────────────────────────────────────

    #[test]
    fn shared_command_instance_count_equals_counter() {
        let Some(dev) = headless() else { return };
        let (_store, culler) = setup(&dev, random_layout(5_000, 4));

        let out = culler
            .dispatch(dev.device(), dev.queue(), CullMode::CompactedInstance, 5_000, &Mat4::unit_view())
            .expect("dispatch");
        let cmd = culler.read_shared_command(dev.device(), dev.queue()).expect("shared");
        assert_eq!(cmd, DrawCommand::shared(out.visible_count));
        assert_eq!(cmd.instance_count, culler.read_counter(dev.device(), dev.queue()).expect("counter"));
    }

    #[test]
    fn zero_active_gives_empty_micro_batch_and_noop_shared_command() {
        let Some(dev) = headless() else { return };
        let (_store, culler) = setup(&dev, vec![at(0.0, 0.0); 8]);
        let proj = Mat4::unit_view();

        let micro = culler.dispatch(dev.device(), dev.queue(), CullMode::MicroBatch, 0, &proj).expect("micro");
        assert_eq!(micro.visible_count, 0);
        assert_eq!(micro.draw_submissions(), 0);

        let compacted = culler
            .dispatch(dev.device(), dev.queue(), CullMode::CompactedInstance, 0, &proj)
            .expect("compacted");
        assert_eq!(compacted.draw_submissions(), 1);
        let cmd = culler.read_shared_command(dev.device(), dev.queue()).expect("shared");
        assert_eq!(cmd.instance_count, 0);
        assert_eq!(cmd.index_count, QUAD_INDEX_COUNT);
    }

    #[test]
    fn three_visible_elements_in_both_modes() {
        let Some(dev) = headless() else { return };
        let (_store, culler) = setup(&dev, vec![at(0.2, 0.3), at(-0.7, 0.1), at(0.0, -0.9), at(3.0, 3.0)]);
        let proj = Mat4::unit_view();

        let micro = culler.dispatch(dev.device(), dev.queue(), CullMode::MicroBatch, 3, &proj).expect("micro");
        assert_eq!(micro.visible_count, 3);
        let cmds = culler.read_valid_commands(dev.device(), dev.queue(), 3).expect("commands");
        assert!(cmds.iter().all(|c| c.index_count == 6 && c.instance_count == 1 && c.first_index == 0));
        assert_eq!(sorted(cmds.iter().map(|c| c.base_instance).collect()), vec![0, 1, 2]);

        let compacted = culler
            .dispatch(dev.device(), dev.queue(), CullMode::CompactedInstance, 3, &proj)
            .expect("compacted");
        assert_eq!(compacted.visible_count, 3);
        assert_eq!(compacted.draw_submissions(), 1);
        let cmd = culler.read_shared_command(dev.device(), dev.queue()).expect("shared");
        assert_eq!(cmd, DrawCommand::shared(3));
        let ids = culler.read_visible_ids(dev.device(), dev.queue(), 3).expect("ids");
        assert_eq!(sorted(ids), vec![0, 1, 2]);
    }

    #[test]
    fn element_on_clip_boundary_is_visible() {
        let Some(dev) = headless() else { return };
        let (_store, culler) = setup(&dev, vec![at(1.0, 0.0), at(-1.0, -1.0), at(1.0, 1.0001)]);

        let out = culler
            .dispatch(dev.device(), dev.queue(), CullMode::MicroBatch, 3, &Mat4::unit_view())
            .expect("dispatch");
        assert_eq!(out.visible_count, 2);
    }

    #[test]
    fn both_modes_render_the_same_index_set() {
        let Some(dev) = headless() else { return };
        let (store, culler) = setup(&dev, random_layout(8_000, 5));
        let proj = Mat4::unit_view();
        let expected = reference_visible(store.host_data(), 6_000, &proj);

        let micro = culler.dispatch(dev.device(), dev.queue(), CullMode::MicroBatch, 6_000, &proj).expect("micro");
        let micro_ids: Vec<u32> = culler
            .read_valid_commands(dev.device(), dev.queue(), micro.visible_count)
            .expect("commands")
            .iter()
            .map(|c| c.base_instance)
            .collect();

        let compacted = culler
            .dispatch(dev.device(), dev.queue(), CullMode::CompactedInstance, 6_000, &proj)
            .expect("compacted");
        let compacted_ids = culler
            .read_visible_ids(dev.device(), dev.queue(), compacted.visible_count)
            .expect("ids");

        assert_eq!(sorted(micro_ids), expected);
        assert_eq!(sorted(compacted_ids), expected);
    }
}
