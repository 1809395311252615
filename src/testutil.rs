//! Helpers shared by unit tests and the `tests/` integration suite.

use chrono::NaiveDate;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::model::{Gender, Patient};

// ---------------------------------------------------------------------------
// Scripted and counting generators
// ---------------------------------------------------------------------------

/// Convert a unit draw in `[0, 1)` into the raw `u64` that makes
/// `rng.random::<f64>()` return it. Range sampling maps the same word to
/// roughly `floor(unit * n)`, so one script drives both kinds of draw.
pub fn unit_bits(unit: f64) -> u64 {
    let clamped = unit.clamp(0.0, 1.0 - f64::EPSILON);
    ((clamped * (1u64 << 53) as f64) as u64) << 11
}

/// An `RngCore` that replays a fixed script of unit draws, then repeats a
/// fallback value forever. Lets tests force each decision point.
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    script: Vec<u64>,
    fallback: u64,
    pos: usize,
}

impl ScriptedRng {
    pub fn new(units: &[f64], fallback: f64) -> Self {
        Self {
            script: units.iter().copied().map(unit_bits).collect(),
            fallback: unit_bits(fallback),
            pos: 0,
        }
    }

    /// Every draw returns `unit`.
    pub fn constant(unit: f64) -> Self {
        Self::new(&[], unit)
    }

    /// Number of 64-bit words handed out so far.
    pub fn consumed(&self) -> usize {
        self.pos
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let value = self.script.get(self.pos).copied().unwrap_or(self.fallback);
        self.pos += 1;
        value
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

/// Seeded generator that counts how many words were drawn from it.
#[derive(Debug, Clone)]
pub struct CountingRng {
    inner: SmallRng,
    draws: usize,
}

impl CountingRng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }

    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl RngCore for CountingRng {
    fn next_u32(&mut self) -> u32 {
        self.draws += 1;
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws += 1;
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws += 1;
        self.inner.fill_bytes(dest);
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A fixed patient with two medications and no smoking history.
pub fn sample_patient() -> Patient {
    Patient {
        id: "12345678Z".to_string(),
        first_name: "Lucía".to_string(),
        last_name: "García".to_string(),
        full_name: "Lucía García Molina".to_string(),
        gender: Gender::Female,
        date_of_birth: NaiveDate::from_ymd_opt(1970, 5, 17).unwrap(),
        age: 55,
        address: "Calle Mayor 12, Madrid".to_string(),
        city: "Madrid".to_string(),
        conditions: vec!["diabetes tipo 2".to_string(), "asma".to_string()],
        icd10_codes: vec!["E11".to_string(), "J45".to_string()],
        medications: vec!["metformina".to_string(), "omeprazol".to_string()],
        smoking: false,
        blood_type: "A+".to_string(),
        occupation: "profesor".to_string(),
        emergency_contact: "Pablo García Ortiz".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn scripted_units_round_trip_through_random_f64() {
        let mut rng = ScriptedRng::new(&[0.0, 0.25, 0.75], 0.5);
        let draws: Vec<f64> = (0..4).map(|_| rng.random::<f64>()).collect();
        assert_eq!(draws, vec![0.0, 0.25, 0.75, 0.5]);
        assert_eq!(rng.consumed(), 4);
    }

    #[test]
    fn scripted_units_drive_range_choices() {
        let mut rng = ScriptedRng::new(&[0.0, 0.5, 0.9], 0.0);
        assert_eq!(rng.random_range(0..5usize), 0);
        assert_eq!(rng.random_range(0..5usize), 2);
        assert_eq!(rng.random_range(0..5usize), 4);
    }

    #[test]
    fn counting_rng_counts_f64_draws() {
        let mut rng = CountingRng::seeded(1);
        for _ in 0..7 {
            let _: f64 = rng.random();
        }
        assert_eq!(rng.draws(), 7);
    }
}
