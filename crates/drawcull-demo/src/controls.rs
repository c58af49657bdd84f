use drawcull_engine::cull::CullMode;
use drawcull_engine::input::{InputEvent, InputFrame, Key, KeyState};

/// Step for the Left/Right count keys.
const COUNT_STEP: u32 = 1_000;

/// Keyboard-driven frame selection: strategy and active count.
///
/// - `1` / `2` select micro-batch / compacted, `Tab` or `M` toggles
/// - Up/Down double/halve the count, Right/Left add/remove 1000
/// - `Escape` exits
///
/// The count always stays within `[1, capacity]`.
#[derive(Debug, Clone)]
pub struct Controls {
    mode: CullMode,
    count: u32,
    capacity: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ControlFlow {
    Continue,
    Exit,
}

impl Controls {
    pub fn new(mode: CullMode, count: u32, capacity: u32) -> Self {
        let capacity = capacity.max(1);
        Self {
            mode,
            count: count.clamp(1, capacity),
            capacity,
        }
    }

    #[inline]
    pub fn mode(&self) -> CullMode {
        self.mode
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Applies this frame's key presses in arrival order.
    pub fn apply(&mut self, frame: &InputFrame) -> ControlFlow {
        for ev in &frame.events {
            let InputEvent::Key {
                key,
                state: KeyState::Pressed,
                repeat,
                ..
            } = ev
            else {
                continue;
            };

            if self.handle_key(*key, *repeat) == ControlFlow::Exit {
                return ControlFlow::Exit;
            }
        }
        ControlFlow::Continue
    }

    /// Count keys honor auto-repeat; mode keys only act on the first press.
    pub fn handle_key(&mut self, key: Key, repeat: bool) -> ControlFlow {
        let before = (self.mode, self.count);

        match key {
            Key::Escape => return ControlFlow::Exit,

            Key::Digit1 if !repeat => self.mode = CullMode::MicroBatch,
            Key::Digit2 if !repeat => self.mode = CullMode::CompactedInstance,
            Key::Tab | Key::M if !repeat => self.mode = self.mode.toggled(),

            Key::ArrowUp => self.set_count(self.count.saturating_mul(2)),
            Key::ArrowDown => self.set_count(self.count / 2),
            Key::ArrowRight => self.set_count(self.count.saturating_add(COUNT_STEP)),
            Key::ArrowLeft => self.set_count(self.count.saturating_sub(COUNT_STEP)),

            _ => {}
        }

        if before != (self.mode, self.count) {
            log::debug!("controls: {} / {} elements", self.mode, self.count);
        }
        ControlFlow::Continue
    }

    fn set_count(&mut self, count: u32) {
        self.count = count.clamp(1, self.capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawcull_engine::input::Modifiers;

    fn press(key: Key, repeat: bool) -> InputEvent {
        InputEvent::Key {
            key,
            state: KeyState::Pressed,
            modifiers: Modifiers::default(),
            repeat,
        }
    }

    // ── mode ──────────────────────────────────────────────────────────────

    #[test]
    fn digit_keys_select_mode_and_tab_toggles() {
        let mut c = Controls::new(CullMode::MicroBatch, 10, 100);

        c.handle_key(Key::Digit2, false);
        assert_eq!(c.mode(), CullMode::CompactedInstance);
        c.handle_key(Key::Digit2, false);
        assert_eq!(c.mode(), CullMode::CompactedInstance);

        c.handle_key(Key::Tab, false);
        assert_eq!(c.mode(), CullMode::MicroBatch);
        c.handle_key(Key::Tab, true);
        assert_eq!(c.mode(), CullMode::MicroBatch);
    }

    // ── count ─────────────────────────────────────────────────────────────

    #[test]
    fn count_stays_within_one_and_capacity() {
        let mut c = Controls::new(CullMode::MicroBatch, 600, 1_500);

        c.handle_key(Key::ArrowUp, false);
        assert_eq!(c.count(), 1_200);
        c.handle_key(Key::ArrowUp, true);
        assert_eq!(c.count(), 1_500);
        c.handle_key(Key::ArrowRight, false);
        assert_eq!(c.count(), 1_500);

        c.handle_key(Key::ArrowLeft, false);
        assert_eq!(c.count(), 500);
        c.handle_key(Key::ArrowLeft, false);
        assert_eq!(c.count(), 1);
        c.handle_key(Key::ArrowDown, false);
        assert_eq!(c.count(), 1);
    }

    #[test]
    fn initial_count_is_clamped() {
        assert_eq!(Controls::new(CullMode::MicroBatch, 0, 10).count(), 1);
        assert_eq!(Controls::new(CullMode::MicroBatch, 50, 10).count(), 10);
    }

    // ── frame application ─────────────────────────────────────────────────

    #[test]
    fn escape_stops_processing_the_frame() {
        let mut c = Controls::new(CullMode::MicroBatch, 10, 100);
        let mut frame = InputFrame::default();
        frame.push_event(press(Key::Escape, false));
        frame.push_event(press(Key::Digit2, false));

        assert_eq!(c.apply(&frame), ControlFlow::Exit);
        assert_eq!(c.mode(), CullMode::MicroBatch);
    }

    #[test]
    fn events_apply_in_arrival_order() {
        let mut c = Controls::new(CullMode::MicroBatch, 10, 100);
        let mut frame = InputFrame::default();
        frame.push_event(press(Key::ArrowUp, false));
        frame.push_event(press(Key::ArrowUp, true));
        frame.push_event(press(Key::M, false));

        assert_eq!(c.apply(&frame), ControlFlow::Continue);
        assert_eq!(c.count(), 40);
        assert_eq!(c.mode(), CullMode::CompactedInstance);
    }
}
