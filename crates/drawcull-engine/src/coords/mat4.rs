use bytemuck::{Pod, Zeroable};

use super::Vec2;

/// Column-major 4x4 matrix.
///
/// Memory layout matches WGSL `mat4x4<f32>`, so the value can be copied into a
/// uniform buffer verbatim.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

/// Homogeneous clip-space position produced by [`Mat4::project_point`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClipPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl ClipPoint {
    /// Inclusive clip test on the X/Y axes: `-w <= x <= w && -w <= y <= w`.
    ///
    /// Depth is not tested; elements are 2D.
    #[inline]
    pub fn is_inside_xy(self) -> bool {
        self.x >= -self.w && self.x <= self.w && self.y >= -self.w && self.y <= self.w
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    #[inline]
    pub const fn from_cols(cols: [[f32; 4]; 4]) -> Self {
        Self { cols }
    }

    /// Right-handed orthographic projection with depth mapped to `[0, 1]`.
    ///
    /// `left..right` and `bottom..top` map to `-1..1` in clip space.
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let rcp_width = 1.0 / (right - left);
        let rcp_height = 1.0 / (top - bottom);
        let r = 1.0 / (near - far);
        Self::from_cols([
            [2.0 * rcp_width, 0.0, 0.0, 0.0],
            [0.0, 2.0 * rcp_height, 0.0, 0.0],
            [0.0, 0.0, r, 0.0],
            [
                -(left + right) * rcp_width,
                -(top + bottom) * rcp_height,
                r * near,
                1.0,
            ],
        ])
    }

    /// Projection used by the engine: the `[-1, 1]` square on both axes.
    pub fn unit_view() -> Self {
        Self::orthographic(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0)
    }

    /// Transforms `(x, y, 0, 1)`.
    ///
    /// Accumulation order matches a column-major `matrix * vector` product in WGSL.
    #[inline]
    pub fn project_point(&self, p: Vec2) -> ClipPoint {
        let [c0, c1, _, c3] = self.cols;
        ClipPoint {
            x: c0[0] * p.x + c1[0] * p.y + c3[0],
            y: c0[1] * p.x + c1[1] * p.y + c3[1],
            z: c0[2] * p.x + c1[2] * p.y + c3[2],
            w: c0[3] * p.x + c1[3] * p.y + c3[3],
        }
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}
