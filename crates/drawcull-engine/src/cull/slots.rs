use std::sync::atomic::{AtomicU32, Ordering};

/// Shared cursor handing out unique, increasing output slots.
///
/// Host mirror of the device `atomic<u32>` counter: fetch-and-add returns the
/// previous value, so concurrent reservers never receive the same slot.
#[derive(Debug, Default)]
pub struct SlotCounter(AtomicU32);

impl SlotCounter {
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    /// Resets the cursor to zero. Must happen before the first reservation of a pass.
    #[inline]
    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }

    /// Reserves the next slot and returns its index.
    #[inline]
    pub fn reserve(&self) -> u32 {
        // A single RMW location is totally ordered; uniqueness needs no stronger ordering.
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of slots reserved since the last reset.
    #[inline]
    pub fn load(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservations_are_sequential_from_zero() {
        let c = SlotCounter::new();
        assert_eq!(c.reserve(), 0);
        assert_eq!(c.reserve(), 1);
        assert_eq!(c.load(), 2);
        c.reset();
        assert_eq!(c.reserve(), 0);
    }

    #[test]
    fn concurrent_reservations_are_unique() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 5_000;

        let counter = SlotCounter::new();
        let mut slots: Vec<u32> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| s.spawn(|| (0..PER_THREAD).map(|_| counter.reserve()).collect::<Vec<_>>()))
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().expect("reserver thread panicked"))
                .collect()
        });

        slots.sort_unstable();
        let expected: Vec<u32> = (0..(THREADS * PER_THREAD) as u32).collect();
        assert_eq!(slots, expected);
        assert_eq!(counter.load(), (THREADS * PER_THREAD) as u32);
    }
}
