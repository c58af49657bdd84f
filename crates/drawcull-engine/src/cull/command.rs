use bytemuck::{Pod, Zeroable};

/// Indices per quad (two triangles).
pub const QUAD_INDEX_COUNT: u32 = 6;

/// Indexed indirect draw arguments as consumed by `draw_indexed_indirect`.
///
/// Five u32 fields in device order. `base_vertex` is signed on the device; the
/// engine only ever writes zero, so the unsigned field is bit-identical.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Pod, Zeroable)]
pub struct DrawCommand {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: u32,
    pub base_instance: u32,
}

const _: () = assert!(std::mem::size_of::<DrawCommand>() == 20);
const _: () = assert!(
    std::mem::size_of::<DrawCommand>() == std::mem::size_of::<wgpu::util::DrawIndexedIndirectArgs>()
);

impl DrawCommand {
    /// Byte size of one command in an indirect buffer.
    pub const SIZE: u64 = std::mem::size_of::<DrawCommand>() as u64;

    /// Byte offset of `instance_count`; the compacted path copies the counter here.
    pub const INSTANCE_COUNT_OFFSET: u64 = std::mem::offset_of!(DrawCommand, instance_count) as u64;

    /// Micro-batch command: a single instance whose `base_instance` is the element index.
    #[inline]
    pub const fn per_element(element: u32) -> Self {
        Self {
            index_count: QUAD_INDEX_COUNT,
            instance_count: 1,
            first_index: 0,
            base_vertex: 0,
            base_instance: element,
        }
    }

    /// Compacted command covering `instance_count` ids from the visible list.
    #[inline]
    pub const fn shared(instance_count: u32) -> Self {
        Self {
            index_count: QUAD_INDEX_COUNT,
            instance_count,
            first_index: 0,
            base_vertex: 0,
            base_instance: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_order_matches_indirect_layout() {
        let cmd = DrawCommand::per_element(42);
        let words: &[u32] = bytemuck::cast_slice(std::slice::from_ref(&cmd));
        assert_eq!(words, &[6, 1, 0, 0, 42]);
    }

    #[test]
    fn instance_count_lives_at_byte_four() {
        assert_eq!(DrawCommand::INSTANCE_COUNT_OFFSET, 4);
    }

    #[test]
    fn both_representations_draw_one_quad() {
        assert_eq!(DrawCommand::per_element(7).index_count, QUAD_INDEX_COUNT);
        assert_eq!(DrawCommand::shared(0).index_count, QUAD_INDEX_COUNT);
        assert_eq!(DrawCommand::shared(9).instance_count, 9);
    }
}
