use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

/// ABO/Rh blood groups, drawn uniformly.
pub const BLOOD_TYPES: &[&str] = &["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

/// Draw a count in `min..=max`, then that many distinct items (capped at the
/// pool size) in sampled order. Always consumes the count draw, even for an
/// empty pool.
pub fn sample_between<'a, T>(pool: &'a [T], min: usize, max: usize, rng: &mut dyn RngCore) -> Vec<&'a T> {
    let count = rng.random_range(min..=max);
    pool.choose_multiple(rng, count.min(pool.len())).collect()
}

/// Uniform draw from a non-empty table, or `fallback` when it is empty.
pub fn choose_or<'a>(pool: &[&'a str], fallback: &'a str, rng: &mut dyn RngCore) -> &'a str {
    pool.choose(rng).copied().unwrap_or(fallback)
}
