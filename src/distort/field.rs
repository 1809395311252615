use std::collections::HashMap;

use rand::seq::index;
use rand::{Rng, RngCore};
use serde_json::Value;

use super::rules::ConfusionRule;
use crate::locale::SourceType;
use crate::model::Record;

/// Fields never touched by field-level OCR noise.
const NOISE_EXEMPT_FIELDS: &[&str] = &["doc_type", "lab_results"];

/// Single-character substitution table for structured field values.
///
/// Built once per rule set from single-character, non-digit sources; the
/// first rule for a source character wins. Multi-character and digit rules
/// only apply to full-text OCR noise.
#[derive(Debug, Clone, Default)]
pub struct FieldCharMap {
    map: HashMap<char, String>,
}

impl FieldCharMap {
    pub fn from_rules(rules: &[ConfusionRule]) -> Self {
        let mut map = HashMap::new();
        for rule in rules {
            let mut chars = rule.source.chars();
            let (Some(c), None) = (chars.next(), chars.next()) else {
                continue;
            };
            if c.is_numeric() {
                continue;
            }
            map.entry(c).or_insert_with(|| rule.target.clone());
        }
        Self { map }
    }

    pub fn get(&self, c: char) -> Option<&str> {
        self.map.get(&c).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Cheap OCR noise for parsed field values. Non-strings pass through without
/// draws; strings consume exactly one draw per character whether or not the
/// character has a substitution.
pub fn apply_field_noise(value: &Value, rng: &mut dyn RngCore, char_map: &FieldCharMap, error_rate: f64) -> Value {
    match value {
        Value::String(s) => Value::String(noise_text(s, rng, char_map, error_rate)),
        other => other.clone(),
    }
}

fn noise_text(text: &str, rng: &mut dyn RngCore, char_map: &FieldCharMap, error_rate: f64) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if rng.random::<f64>() < error_rate {
            match char_map.get(c) {
                Some(replacement) => out.push_str(replacement),
                None => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Clinical-code-like tokens: alphabetic first character, at least three
/// characters.
pub fn looks_like_code(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic()) && token.chars().count() >= 3
}

/// With probability `rate`, swap two distinct digit positions of a code-like
/// token. Tokens that don't look like codes are returned without a draw;
/// tokens with fewer than two digits come back unchanged after the gate draw.
pub fn swap_code_digits(token: &str, rng: &mut dyn RngCore, rate: f64) -> String {
    if !looks_like_code(token) || rng.random::<f64>() >= rate {
        return token.to_string();
    }
    let mut chars: Vec<char> = token.chars().collect();
    let digits: Vec<usize> = chars
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_numeric())
        .map(|(i, _)| i)
        .collect();
    if digits.len() >= 2 {
        let picked = index::sample(rng, digits.len(), 2);
        chars.swap(digits[picked.index(0)], digits[picked.index(1)]);
    }
    chars.into_iter().collect()
}

/// Rates used by [`distort_fields`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldNoiseRates {
    pub char_error: f64,
    pub digit_swap: f64,
}

/// Field-level distortion of one record, in place.
///
/// OCR-sourced records get per-character noise on every string longer than
/// two characters and on string elements of list fields. Every record then
/// gets the digit-swap pass over list fields.
pub fn distort_fields(
    record: &mut Record,
    source: SourceType,
    rng: &mut dyn RngCore,
    char_map: &FieldCharMap,
    rates: FieldNoiseRates,
) {
    if source == SourceType::Ocr {
        for (key, value) in record.iter_mut() {
            if NOISE_EXEMPT_FIELDS.contains(&key.as_str()) {
                continue;
            }
            match value {
                Value::String(s) if s.chars().count() > 2 => {
                    *s = noise_text(s, rng, char_map, rates.char_error);
                }
                Value::Array(items) => {
                    for item in items.iter_mut() {
                        if let Value::String(s) = item {
                            *s = noise_text(s, rng, char_map, rates.char_error);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    for value in record.values_mut() {
        if let Value::Array(items) = value {
            for item in items.iter_mut() {
                if let Value::String(s) = item {
                    *s = swap_code_digits(s, rng, rates.digit_swap);
                }
            }
        }
    }
}
