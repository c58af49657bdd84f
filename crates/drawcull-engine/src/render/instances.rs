use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::coords::Mat4;
use crate::cull::{CullMode, CullOutcome, GpuCuller};
use crate::render::{RenderCtx, RenderTarget};
use crate::store::{InstanceData, InstanceStore};

use super::common::{QuadVertex, QUAD_INDICES, QUAD_VERTICES};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct RenderParams {
    projection: Mat4,
    mode: u32,
    _pad: [u32; 3],
}

const _: () = assert!(std::mem::size_of::<RenderParams>() == 80);

/// Draws the culled elements of one [`InstanceStore`] as colored quads.
///
/// Reads element attributes straight from the store buffer and draw arguments
/// from the [`GpuCuller`] output. Both are bound at construction; the pipeline
/// is built lazily for whatever target format the first frame uses.
pub struct InstanceRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    params_ubo: wgpu::Buffer,

    quad_vbo: wgpu::Buffer,
    quad_ibo: wgpu::Buffer,
}

impl InstanceRenderer {
    pub fn new(device: &wgpu::Device, store: &InstanceStore, culler: &GpuCuller) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("drawcull instances bgl"),
            entries: &[
                read_only_storage(0, NonZeroU64::new(InstanceData::STRIDE)),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(
                            std::mem::size_of::<RenderParams>() as u64
                        ),
                    },
                    count: None,
                },
                read_only_storage(2, NonZeroU64::new(std::mem::size_of::<u32>() as u64)),
            ],
        });

        let params_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("drawcull instances params ubo"),
            size: std::mem::size_of::<RenderParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("drawcull instances bind group"),
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
                    resource: culler.visible_ids().as_entire_binding(),
                },
            ],
        });

        let quad_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("drawcull quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let quad_ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("drawcull quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            pipeline_format: None,
            pipeline: None,
            bind_group_layout,
            bind_group,
            params_ubo,
            quad_vbo,
            quad_ibo,
        }
    }

    /// Draws the result of `outcome` on top of the target's current contents.
    ///
    /// The culling work for `outcome` must be recorded earlier on the same
    /// queue. Micro-batch issues one multi-draw over the first
    /// `visible_count` commands and nothing when that is zero; compacted
    /// issues exactly one indirect draw.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        culler: &GpuCuller,
        outcome: &CullOutcome,
        projection: &Mat4,
    ) {
        self.ensure_pipeline(ctx);

        let params = RenderParams {
            projection: *projection,
            mode: outcome.mode.shader_id(),
            _pad: [0; 3],
        };
        ctx.queue.write_buffer(&self.params_ubo, 0, bytemuck::bytes_of(&params));

        let Some(pipeline) = self.pipeline.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("drawcull instances pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.quad_vbo.slice(..));
        rpass.set_index_buffer(self.quad_ibo.slice(..), wgpu::IndexFormat::Uint32);

        match outcome.mode {
            CullMode::MicroBatch => {
                if outcome.visible_count > 0 {
                    rpass.multi_draw_indexed_indirect(
                        culler.micro_commands(),
                        0,
                        outcome.visible_count,
                    );
                }
            }
            CullMode::CompactedInstance => {
                rpass.draw_indexed_indirect(culler.shared_command(), 0);
            }
        }
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("drawcull instances shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/instances.wgsl").into()),
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("drawcull instances pipeline layout"),
            bind_group_layouts: &[&self.bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("drawcull instances pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("instances pipeline built for {:?}", ctx.surface_format);

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
    }
}

fn read_only_storage(binding: u32, min_binding_size: Option<NonZeroU64>) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size,
        },
        count: None,
    }
}
