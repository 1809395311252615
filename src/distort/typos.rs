use rand::{Rng, RngCore};

/// Rushed-typing noise for digitally sourced text.
///
/// Whitespace is copied through without a draw. Every other character draws
/// once; on a typo a second draw picks between dropping it and typing it
/// twice.
pub fn apply_typos(text: &str, rng: &mut dyn RngCore, rate: f64) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_whitespace() {
            out.push(c);
            continue;
        }
        if rng.random::<f64>() < rate {
            if rng.random::<f64>() < 0.5 {
                continue;
            }
            out.push(c);
        }
        out.push(c);
    }
    out
}
