use rand::{Rng, RngCore};

use super::index::RuleIndex;
use super::rules::ConfusionRule;

/// Per-character rates for full-text OCR noise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcrRates {
    pub char_error: f64,
    pub space_drop: f64,
    pub space_insert: f64,
}

/// Transform clean text into OCR-plausible text in a single left-to-right
/// pass.
///
/// Draw order per character is fixed: one space draw (drop for spaces, insert
/// for everything else), one char-error draw, and, when a rule group matches,
/// one weighted pick. An empty index with both space rates at zero returns
/// the input without touching `rng`.
pub fn apply_ocr_noise(text: &str, rng: &mut dyn RngCore, index: &RuleIndex, rates: OcrRates) -> String {
    if index.is_empty() && rates.space_drop == 0.0 && rates.space_insert == 0.0 {
        return text.to_string();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if c == ' ' {
            if rng.random::<f64>() < rates.space_drop {
                i += 1;
                continue;
            }
        } else if rng.random::<f64>() < rates.space_insert {
            out.push(' ');
        }

        if rng.random::<f64>() < rates.char_error {
            if let Some(m) = index.lookup(&chars, i) {
                let rule = pick_weighted(m.candidates, rng);
                out.push_str(&rule.target);
                i += m.len;
                continue;
            }
        }

        out.push(c);
        i += 1;
    }
    out
}

/// Cumulative-weight roulette over a non-empty candidate group, one draw.
fn pick_weighted<'a>(candidates: &'a [ConfusionRule], rng: &mut dyn RngCore) -> &'a ConfusionRule {
    let total: f64 = candidates.iter().map(|r| r.weight).sum();
    let pick = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for rule in candidates {
        cumulative += rule.weight;
        if pick <= cumulative {
            return rule;
        }
    }
    &candidates[candidates.len() - 1]
}
