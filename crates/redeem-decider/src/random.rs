//! Injected randomness.

use std::collections::VecDeque;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniform random draws.
///
/// Implementations must be shareable across tasks; the engine holds one
/// behind an `Arc` and calls it from concurrent redemptions.
pub trait RandomSource: Send + Sync {
    /// A uniform draw in `[0, 1)`.
    fn unit(&self) -> f64;

    /// A uniform index in `0..len`. `len` is never zero.
    fn index(&self, len: usize) -> usize;
}

/// Production source backed by the thread-local generator.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }

    fn index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Reproducible source seeded from a `u64`, for simulations.
#[derive(Debug)]
pub struct SeededSource {
    rng: Mutex<StdRng>,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededSource {
    fn unit(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen::<f64>(),
            Err(poisoned) => poisoned.into_inner().gen::<f64>(),
        }
    }

    fn index(&self, len: usize) -> usize {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0..len),
            Err(poisoned) => poisoned.into_inner().gen_range(0..len),
        }
    }
}

/// Scripted source that replays fixed draws.
///
/// Unit draws and index draws are queued separately. Once the unit queue
/// runs dry the last unit is repeated (`0.0` if none was scripted). Once
/// the index queue runs dry indices keep counting upward from the last one
/// handed out, so an unscripted display never repeats the same reel forever.
#[derive(Debug, Default)]
pub struct SequenceSource {
    units: Mutex<UnitScript>,
    indices: Mutex<IndexScript>,
}

#[derive(Debug, Default)]
struct UnitScript {
    queue: VecDeque<f64>,
    last: f64,
}

impl UnitScript {
    fn next(&mut self) -> f64 {
        if let Some(value) = self.queue.pop_front() {
            self.last = value;
        }
        self.last
    }
}

#[derive(Debug, Default)]
struct IndexScript {
    queue: VecDeque<usize>,
    next_free: usize,
}

impl IndexScript {
    fn next(&mut self) -> usize {
        let value = self.queue.pop_front().unwrap_or(self.next_free);
        self.next_free = value.wrapping_add(1);
        value
    }
}

impl SequenceSource {
    pub fn new(
        units: impl IntoIterator<Item = f64>,
        indices: impl IntoIterator<Item = usize>,
    ) -> Self {
        Self {
            units: Mutex::new(UnitScript {
                queue: units.into_iter().collect(),
                last: 0.0,
            }),
            indices: Mutex::new(IndexScript {
                queue: indices.into_iter().collect(),
                next_free: 0,
            }),
        }
    }

    /// Number of scripted unit draws not yet consumed.
    pub fn pending_units(&self) -> usize {
        self.units.lock().map(|s| s.queue.len()).unwrap_or(0)
    }
}

impl RandomSource for SequenceSource {
    fn unit(&self) -> f64 {
        match self.units.lock() {
            Ok(mut script) => script.next(),
            Err(poisoned) => poisoned.into_inner().next(),
        }
    }

    fn index(&self, len: usize) -> usize {
        let raw = match self.indices.lock() {
            Ok(mut script) => script.next(),
            Err(poisoned) => poisoned.into_inner().next(),
        };
        raw % len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_random_stays_in_range() {
        let source = ThreadRandom;
        for _ in 0..1_000 {
            let u = source.unit();
            assert!((0.0..1.0).contains(&u));
            assert!(source.index(5) < 5);
        }
    }

    #[test]
    fn seeded_source_is_reproducible() {
        let a = SeededSource::new(7);
        let b = SeededSource::new(7);
        for _ in 0..32 {
            assert_eq!(a.unit().to_bits(), b.unit().to_bits());
            assert_eq!(a.index(10), b.index(10));
        }
    }

    #[test]
    fn sequence_source_replays_then_repeats() {
        let source = SequenceSource::new([0.5, 0.9], [1, 7]);
        assert_eq!(source.unit(), 0.5);
        assert_eq!(source.pending_units(), 1);
        assert_eq!(source.unit(), 0.9);
        assert_eq!(source.unit(), 0.9);
        assert_eq!(source.index(5), 1);
        // 7 wraps into range, then the script counts upward from it.
        assert_eq!(source.index(5), 2);
        assert_eq!(source.index(5), 3);
        assert_eq!(source.index(5), 4);
    }

    #[test]
    fn empty_sequence_defaults_to_zero() {
        let source = SequenceSource::default();
        assert_eq!(source.unit(), 0.0);
        assert_eq!(source.index(3), 0);
        assert_eq!(source.index(3), 1);
    }
}
