//! Host reference implementation of the culling pass.
//!
//! Runs the same algorithm as `shaders/cull.wgsl`, one element at a time, with
//! the output strategy supplied as a [`CullOutput`]. Backs
//! `DrawCullEngine::host_visible_count` and the device tests; never on the
//! per-frame path.

use crate::coords::Mat4;
use crate::store::InstanceData;

use super::{is_visible, CullMode, DrawCommand, SlotCounter};

/// Destination of a culling pass.
pub trait CullOutput {
    /// Runs once before any element is evaluated.
    fn begin(&mut self) {}

    /// Records visible `element` at the reserved `slot`.
    fn emit(&mut self, slot: u32, element: u32);

    /// Runs once after every reservation, with the counter's final value.
    fn finish(&mut self, visible: u32) {
        let _ = visible;
    }
}

/// Per-element command array sized to capacity.
#[derive(Debug, Clone)]
pub struct MicroBatchOutput {
    commands: Vec<DrawCommand>,
}

impl MicroBatchOutput {
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            commands: vec![DrawCommand::default(); capacity as usize],
        }
    }

    /// The first `visible` commands; anything past them is stale.
    pub fn valid_commands(&self, visible: u32) -> &[DrawCommand] {
        &self.commands[..(visible as usize).min(self.commands.len())]
    }
}

impl CullOutput for MicroBatchOutput {
    fn emit(&mut self, slot: u32, element: u32) {
        // Slots past capacity are dropped, like out-of-bounds device writes.
        if let Some(cmd) = self.commands.get_mut(slot as usize) {
            *cmd = DrawCommand::per_element(element);
        }
    }
}

/// Visible-id list plus the single shared command.
#[derive(Debug, Clone)]
pub struct CompactedOutput {
    visible_ids: Vec<u32>,
    command: DrawCommand,
}

impl CompactedOutput {
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            visible_ids: vec![0; capacity as usize],
            command: DrawCommand::shared(0),
        }
    }

    pub fn command(&self) -> DrawCommand {
        self.command
    }

    /// Ids covered by the shared command.
    pub fn visible_ids(&self) -> &[u32] {
        let n = (self.command.instance_count as usize).min(self.visible_ids.len());
        &self.visible_ids[..n]
    }
}

impl CullOutput for CompactedOutput {
    fn begin(&mut self) {
        self.command = DrawCommand::shared(0);
    }

    fn emit(&mut self, slot: u32, element: u32) {
        if let Some(id) = self.visible_ids.get_mut(slot as usize) {
            *id = element;
        }
    }

    fn finish(&mut self, visible: u32) {
        self.command.instance_count = visible;
    }
}

/// Evaluates elements `0..active` and writes every visible one into `out`.
///
/// `counter` is not reset here; callers reset it once per pass. Returns the
/// counter value after the pass.
pub fn cull_into<O: CullOutput>(
    instances: &[InstanceData],
    active: u32,
    projection: &Mat4,
    counter: &SlotCounter,
    out: &mut O,
) -> u32 {
    out.begin();

    for (id, inst) in instances.iter().take(active as usize).enumerate() {
        if is_visible(projection, inst.position()) {
            out.emit(counter.reserve(), id as u32);
        }
    }

    let visible = counter.load();
    out.finish(visible);
    visible
}

/// Runs one full pass of `mode` on the host and returns the visible count.
///
/// Output buffers are sized to `instances.len()`, as on the device.
pub fn cull_with_mode(instances: &[InstanceData], mode: CullMode, active: u32, projection: &Mat4) -> u32 {
    let capacity = instances.len() as u32;
    let counter = SlotCounter::new();

    match mode {
        CullMode::MicroBatch => {
            let mut out = MicroBatchOutput::with_capacity(capacity);
            cull_into(instances, active, projection, &counter, &mut out)
        }
        CullMode::CompactedInstance => {
            let mut out = CompactedOutput::with_capacity(capacity);
            cull_into(instances, active, projection, &counter, &mut out)
        }
    }
}

/// Indices of the visible elements among `0..active`, ascending.
pub fn reference_visible(instances: &[InstanceData], active: u32, projection: &Mat4) -> Vec<u32> {
    instances
        .iter()
        .take(active as usize)
        .enumerate()
        .filter(|(_, inst)| is_visible(projection, inst.position()))
        .map(|(id, _)| id as u32)
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::coords::{ColorRgba, Vec2};
    use crate::cull::QUAD_INDEX_COUNT;

    fn at(x: f32, y: f32) -> InstanceData {
        InstanceData::new(Vec2::new(x, y), Vec2::splat(0.005), ColorRgba::white())
    }

    fn random_layout(n: usize, seed: u64) -> Vec<InstanceData> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| at(rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5)))
            .collect()
    }

    fn run_micro(instances: &[InstanceData], active: u32) -> (u32, MicroBatchOutput) {
        let counter = SlotCounter::new();
        let mut out = MicroBatchOutput::with_capacity(instances.len() as u32);
        let v = cull_into(instances, active, &Mat4::unit_view(), &counter, &mut out);
        (v, out)
    }

    fn run_compacted(instances: &[InstanceData], active: u32) -> (u32, CompactedOutput) {
        let counter = SlotCounter::new();
        let mut out = CompactedOutput::with_capacity(instances.len() as u32);
        let v = cull_into(instances, active, &Mat4::unit_view(), &counter, &mut out);
        (v, out)
    }

    fn sorted(mut ids: Vec<u32>) -> Vec<u32> {
        ids.sort_unstable();
        ids
    }

    // ── empty active set ──────────────────────────────────────────────────

    #[test]
    fn zero_active_yields_no_commands() {
        let instances = vec![at(0.0, 0.0); 4];
        let (v, out) = run_micro(&instances, 0);
        assert_eq!(v, 0);
        assert!(out.valid_commands(v).is_empty());
    }

    #[test]
    fn zero_active_still_produces_noop_shared_command() {
        let instances = vec![at(0.0, 0.0); 4];
        let (v, out) = run_compacted(&instances, 0);
        assert_eq!(v, 0);
        assert_eq!(out.command(), DrawCommand::shared(0));
        assert_eq!(out.command().index_count, QUAD_INDEX_COUNT);
    }

    // ── three visible elements ────────────────────────────────────────────

    #[test]
    fn three_visible_micro_batch_commands() {
        let instances = vec![at(0.1, 0.1), at(-0.5, 0.2), at(0.9, -0.9)];
        let (v, out) = run_micro(&instances, 3);
        assert_eq!(v, 3);

        let cmds = out.valid_commands(v);
        assert!(cmds.iter().all(|c| c.instance_count == 1 && c.index_count == 6));
        let ids = sorted(cmds.iter().map(|c| c.base_instance).collect());
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn three_visible_compacted_command() {
        let instances = vec![at(0.1, 0.1), at(-0.5, 0.2), at(0.9, -0.9)];
        let (v, out) = run_compacted(&instances, 3);
        assert_eq!(v, 3);
        assert_eq!(out.command().instance_count, 3);
        assert_eq!(sorted(out.visible_ids().to_vec()), vec![0, 1, 2]);
    }

    // ── counter semantics ─────────────────────────────────────────────────

    #[test]
    fn boundary_element_counts_as_visible() {
        let instances = vec![at(1.0, 0.0), at(1.5, 0.0)];
        let (v, out) = run_micro(&instances, 2);
        assert_eq!(v, 1);
        assert_eq!(out.valid_commands(v)[0].base_instance, 0);
    }

    #[test]
    fn inactive_tail_is_ignored() {
        let instances = vec![at(0.0, 0.0); 10];
        let (v, _) = run_micro(&instances, 4);
        assert_eq!(v, 4);
    }

    #[test]
    fn unreset_counter_double_counts() {
        let instances = random_layout(500, 7);
        let proj = Mat4::unit_view();
        let counter = SlotCounter::new();
        let mut out = CompactedOutput::with_capacity(500);

        let first = cull_into(&instances, 500, &proj, &counter, &mut out);
        let second = cull_into(&instances, 500, &proj, &counter, &mut out);
        assert_eq!(second, first * 2);

        counter.reset();
        let a = cull_into(&instances, 500, &proj, &counter, &mut out);
        counter.reset();
        let b = cull_into(&instances, 500, &proj, &counter, &mut out);
        assert_eq!(a, first);
        assert_eq!(a, b);
    }

    #[test]
    fn counter_never_exceeds_active_count() {
        let instances = random_layout(2_000, 11);
        for k in [0, 1, 17, 256, 257, 1_999, 2_000] {
            let (v, _) = run_compacted(&instances, k);
            assert!(v <= k);
        }
    }

    // ── reference agreement ───────────────────────────────────────────────

    #[test]
    fn cull_with_mode_counts_match_reference() {
        let instances = random_layout(1_500, 5);
        let proj = Mat4::unit_view();
        for k in [0, 3, 700, 1_500, 9_000] {
            let expected = reference_visible(&instances, k, &proj).len() as u32;
            for mode in CullMode::ALL {
                assert_eq!(cull_with_mode(&instances, mode, k, &proj), expected, "mode {mode}, k {k}");
            }
        }
    }

    #[test]
    fn both_strategies_match_reference_and_each_other() {
        let instances = random_layout(3_000, 42);
        for k in [0, 1, 100, 1_024, 2_999, 3_000] {
            let expected = reference_visible(&instances, k, &Mat4::unit_view());

            let (vm, micro) = run_micro(&instances, k);
            let (vc, compacted) = run_compacted(&instances, k);
            assert_eq!(vm as usize, expected.len());
            assert_eq!(vc as usize, expected.len());

            let micro_ids = sorted(micro.valid_commands(vm).iter().map(|c| c.base_instance).collect());
            let compacted_ids = sorted(compacted.visible_ids().to_vec());
            assert_eq!(micro_ids, expected);
            assert_eq!(compacted_ids, expected);
        }
    }
}
