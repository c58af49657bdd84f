use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use drawcull_engine::coords::{ColorRgba, Vec2};
use drawcull_engine::store::InstanceData;

/// Generates `capacity` elements spread over the default view.
///
/// Position in `[-1, 1]`, size in `[0.002, 0.008]`, opaque colors with every
/// channel in `[0.1, 1.0]`. The same seed always yields the same layout.
pub fn random_instances(capacity: u32, seed: u64) -> Vec<InstanceData> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..capacity)
        .map(|_| {
            let position = Vec2::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0));
            let size = Vec2::new(rng.gen_range(0.002..=0.008), rng.gen_range(0.002..=0.008));
            let color = ColorRgba::new(
                rng.gen_range(0.1..=1.0),
                rng.gen_range(0.1..=1.0),
                rng.gen_range(0.1..=1.0),
                1.0,
            );
            InstanceData::new(position, size, color)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_stays_within_configured_ranges() {
        let instances = random_instances(1_000, 9);
        assert_eq!(instances.len(), 1_000);

        for inst in &instances {
            assert!(inst.position.iter().all(|p| (-1.0..=1.0).contains(p)));
            assert!(inst.size.iter().all(|s| (0.002..=0.008).contains(s)));
            assert!(inst.color[..3].iter().all(|c| (0.1..=1.0).contains(c)));
            assert_eq!(inst.color[3], 1.0);
        }
    }

    #[test]
    fn width_and_height_are_drawn_independently() {
        let instances = random_instances(1_000, 9);
        let rectangles = instances.iter().filter(|i| i.size[0] != i.size[1]).count();
        assert!(rectangles > 900, "only {rectangles}/1000 elements are not square");
    }

    #[test]
    fn same_seed_same_layout() {
        assert_eq!(random_instances(64, 5), random_instances(64, 5));
        assert_ne!(random_instances(64, 5), random_instances(64, 6));
    }
}
