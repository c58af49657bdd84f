use bytemuck::{Pod, Zeroable};

use crate::coords::{ColorRgba, Vec2};

/// One renderable element as laid out in the instance storage buffer.
///
/// Matches WGSL `struct Instance { position: vec2<f32>, size: vec2<f32>, color: vec4<f32> }`
/// (32 bytes, no padding).
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// Center of the element in view units.
    pub position: [f32; 2],
    /// Full width/height in view units. Ignored by the visibility test.
    pub size: [f32; 2],
    pub color: [f32; 4],
}

const _: () = assert!(std::mem::size_of::<InstanceData>() == 32);

impl InstanceData {
    #[inline]
    pub fn new(position: Vec2, size: Vec2, color: ColorRgba) -> Self {
        Self {
            position: position.to_array(),
            size: size.to_array(),
            color: color.to_array(),
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::from(self.position)
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::from(self.size)
    }

    /// Stride of one element in the storage buffer.
    pub const STRIDE: u64 = std::mem::size_of::<InstanceData>() as u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_offsets_match_storage_layout() {
        let inst = InstanceData::new(
            Vec2::new(1.0, 2.0),
            Vec2::new(3.0, 4.0),
            ColorRgba::new(5.0, 6.0, 7.0, 8.0),
        );
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&inst));
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn accessors_round_trip_vectors() {
        let inst = InstanceData::new(Vec2::new(-0.5, 0.25), Vec2::splat(0.01), ColorRgba::white());
        assert_eq!(inst.position(), Vec2::new(-0.5, 0.25));
        assert_eq!(inst.size(), Vec2::splat(0.01));
    }
}
