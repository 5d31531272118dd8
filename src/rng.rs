use std::collections::HashMap;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::geo::Coordinate;
use crate::scenario::Envelope;

/// Owns the master generator and one derived stream per system name, so a
/// system's draws do not shift when another system changes how much it
/// consumes.
pub struct RngManager {
    master: ChaCha8Rng,
    streams: HashMap<String, ChaCha8Rng>,
}

impl RngManager {
    /// `None` seeds from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let master = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            master,
            streams: HashMap::new(),
        }
    }

    pub fn stream(&mut self, name: &str) -> SystemRng<'_> {
        let master = &mut self.master;
        let entry = self
            .streams
            .entry(name.to_string())
            .or_insert_with(|| ChaCha8Rng::seed_from_u64(master.next_u64()));
        SystemRng { inner: entry }
    }
}

pub struct SystemRng<'a> {
    inner: &'a mut ChaCha8Rng,
}

impl<'a> RngCore for SystemRng<'a> {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// Draws used by spawning and movement.
pub trait SimRngExt {
    /// True with probability `p`, clamped into `[0, 1]`.
    fn chance(&mut self, p: f64) -> bool;
    fn point_in(&mut self, envelope: &Envelope) -> Coordinate;
    /// Uniform in `[min, max]`; returns `min` when the range is empty or
    /// its width is not finite.
    fn real_in(&mut self, min: f64, max: f64) -> f64;
    /// Uniform in `[min, max]` inclusive; returns `min` when the range is empty.
    fn int_in(&mut self, min: u32, max: u32) -> u32;
    /// Two distinct indices below `len`, or `None` if `len < 2`.
    fn pick_two_distinct(&mut self, len: usize) -> Option<(usize, usize)>;
}

impl<R: Rng> SimRngExt for R {
    fn chance(&mut self, p: f64) -> bool {
        if p.is_nan() {
            return false;
        }
        self.gen_bool(p.clamp(0.0, 1.0))
    }

    fn point_in(&mut self, envelope: &Envelope) -> Coordinate {
        Coordinate::new(
            self.real_in(envelope.min_x, envelope.max_x),
            self.real_in(envelope.min_y, envelope.max_y),
        )
    }

    fn real_in(&mut self, min: f64, max: f64) -> f64 {
        if max <= min || !(max - min).is_finite() {
            min
        } else {
            self.gen_range(min..=max)
        }
    }

    fn int_in(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            min
        } else {
            self.gen_range(min..=max)
        }
    }

    fn pick_two_distinct(&mut self, len: usize) -> Option<(usize, usize)> {
        if len < 2 {
            return None;
        }
        let first = self.gen_range(0..len);
        let mut second = self.gen_range(0..len - 1);
        if second >= first {
            second += 1;
        }
        Some((first, second))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream_values() {
        let mut a = RngManager::new(Some(42));
        let mut b = RngManager::new(Some(42));
        let x: f64 = a.stream("population").gen();
        let y: f64 = b.stream("population").gen();
        assert_eq!(x, y);
    }

    #[test]
    fn named_streams_are_reproducible_and_distinct() {
        let mut a = RngManager::new(Some(7));
        let first: u64 = a.stream("movement").gen();
        let _: u64 = a.stream("movement").gen();
        let mut b = RngManager::new(Some(7));
        let again: u64 = b.stream("movement").gen();
        assert_eq!(first, again);
        let other: u64 = b.stream("population").gen();
        assert_ne!(first, other);
    }

    #[test]
    fn points_stay_inside_envelope() {
        let envelope = Envelope {
            min_x: -10.0,
            max_x: 10.0,
            min_y: 5.0,
            max_y: 6.0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..500 {
            let p = rng.point_in(&envelope);
            assert!(envelope.contains(&p));
        }
    }

    #[test]
    fn distinct_pair_never_repeats_an_index() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        assert_eq!(rng.pick_two_distinct(1), None);
        for _ in 0..200 {
            let (a, b) = rng.pick_two_distinct(3).unwrap();
            assert_ne!(a, b);
            assert!(a < 3 && b < 3);
        }
    }

    #[test]
    fn degenerate_ranges_return_lower_bound() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(rng.real_in(4.0, 4.0), 4.0);
        assert_eq!(rng.int_in(9, 3), 9);
        assert!(!rng.chance(0.0));
        assert!(rng.chance(1.5));
        assert!(!rng.chance(f64::NAN));
    }

    #[test]
    fn unbounded_ranges_do_not_panic() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert_eq!(rng.real_in(1.0, f64::INFINITY), 1.0);
        assert_eq!(rng.real_in(-1.0e308, 1.0e308), -1.0e308);
        assert!(rng.real_in(f64::NAN, 2.0).is_nan());
    }
}
