/// Deterministic draw source — reproducible samples keyed by seed, path and time.
///
/// The base sample for an expansion site comes from a ChaCha8 stream seeded
/// with a seahash of `(seed, path)`. Both are platform independent, so the
/// same arguments give the same draw on every machine. Time rotates the
/// base sample around the unit interval: as `t` sweeps `[0, 1)` each site
/// visits every alternative once, dwelling in proportion to its weight.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Draw source bound to one seed and one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawSource {
    seed: u64,
    t: f64,
}

impl DrawSource {
    pub fn new(seed: u64, t: f64) -> Self {
        Self {
            seed,
            t: wrap_unit(t),
        }
    }

    /// Draw for the expansion site at `path`.
    pub fn at(&self, path: &[u32]) -> f64 {
        rotate(base_draw(self.seed, path), self.t)
    }
}

/// A sample in `[0, 1)`; a pure function of its arguments.
pub fn draw(seed: u64, path: &[u32], t: f64) -> f64 {
    DrawSource::new(seed, t).at(path)
}

fn base_draw(seed: u64, path: &[u32]) -> f64 {
    let mut key = Vec::with_capacity(8 + path.len() * 4);
    key.extend_from_slice(&seed.to_le_bytes());
    for step in path {
        key.extend_from_slice(&step.to_le_bytes());
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seahash::hash(&key));
    rng.gen::<f64>()
}

/// Map any `t` into `[0, 1)`. Non-finite values map to 0.
fn wrap_unit(t: f64) -> f64 {
    if !t.is_finite() {
        return 0.0;
    }
    let r = t.rem_euclid(1.0);
    if r >= 1.0 {
        0.0
    } else {
        r
    }
}

fn rotate(base: f64, t: f64) -> f64 {
    let v = base + t;
    if v >= 1.0 {
        v - 1.0
    } else {
        v
    }
}

/// Pick the index whose cumulative weight interval contains `draw`.
///
/// Intervals follow declaration order and are left-inclusive,
/// right-exclusive, so zero-weight entries are never chosen and a draw of
/// 0 selects the first positive weight. Returns `None` when no weight is
/// positive.
pub fn select_weighted<I>(weights: I, draw: f64) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
    I::IntoIter: Clone,
{
    let weights = weights.into_iter();
    let total: f64 = weights.clone().filter(|w| *w > 0.0).sum();
    if !(total > 0.0) {
        return None;
    }

    let target = draw * total;
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (i, w) in weights.enumerate() {
        if !(w > 0.0) {
            continue;
        }
        cumulative += w;
        last_positive = Some(i);
        if target < cumulative {
            return Some(i);
        }
    }
    // Rounding can leave `target` on the final boundary.
    last_positive
}
