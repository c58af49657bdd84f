use crate::coords::{Mat4, Vec2};

/// Decides whether an element is visible under `projection`.
///
/// The element is treated as a point at `position`: its size is ignored, so a
/// large element whose center lies just outside the view is culled even though
/// part of it would be on screen. Bounds are inclusive (`clip.x == clip.w` is
/// visible). Mirrors `is_visible` in `shaders/cull.wgsl`.
#[inline]
pub fn is_visible(projection: &Mat4, position: Vec2) -> bool {
    projection.project_point(position).is_inside_xy()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_visible() {
        assert!(is_visible(&Mat4::unit_view(), Vec2::zero()));
    }

    #[test]
    fn exact_edges_and_corners_are_visible() {
        let proj = Mat4::unit_view();
        for p in [
            Vec2::new(1.0, 0.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(0.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, -1.0),
        ] {
            assert!(is_visible(&proj, p), "{p:?} should be on the inclusive bound");
        }
    }

    #[test]
    fn just_outside_is_culled() {
        let proj = Mat4::unit_view();
        let eps = f32::EPSILON * 2.0;
        assert!(!is_visible(&proj, Vec2::new(1.0 + eps, 0.0)));
        assert!(!is_visible(&proj, Vec2::new(0.0, -1.0 - eps)));
    }

    #[test]
    fn size_does_not_rescue_an_outside_center() {
        // A center at x = 1.01 is culled regardless of extent.
        assert!(!is_visible(&Mat4::unit_view(), Vec2::new(1.01, 0.0)));
    }

    #[test]
    fn non_unit_view_moves_the_bounds() {
        let proj = Mat4::orthographic(0.0, 100.0, 0.0, 50.0, -1.0, 1.0);
        assert!(is_visible(&proj, Vec2::new(99.0, 49.0)));
        assert!(!is_visible(&proj, Vec2::new(50.0, 60.0)));
        assert!(!is_visible(&proj, Vec2::new(-0.5, 10.0)));
    }
}
