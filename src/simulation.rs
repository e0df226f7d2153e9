// Bounded random walks backing every simulated series

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Entropy-seeded unless a seed is given (tests pin one for reproducible runs).
pub fn new_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// A value that moves by a uniform delta in `[-step/2, step/2)` each tick, clamped to `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundedWalk {
    value: f64,
    min: f64,
    max: f64,
    step: f64,
}

impl BoundedWalk {
    pub fn new(initial: f64, min: f64, max: f64, step: f64) -> Self {
        debug_assert!(min <= max, "walk range inverted: {min} > {max}");
        Self {
            value: initial.clamp(min, max),
            min,
            max,
            step,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        let delta = (rng.r#gen::<f64>() - 0.5) * self.step;
        self.value = (self.value + delta).clamp(self.min, self.max);
        self.value
    }
}

/// Integer walk: adds a delta drawn from `[-spread, spread)` and clamps.
pub fn step_clamped_i64<R: Rng + ?Sized>(
    rng: &mut R,
    value: i64,
    spread: i64,
    min: i64,
    max: i64,
) -> i64 {
    (value + rng.gen_range(-spread..spread)).clamp(min, max)
}

/// Random "last update" label like "0.3s ago", always under half a second.
pub fn last_update_label<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{:.1}s ago", rng.gen_range(0.0..0.5))
}
