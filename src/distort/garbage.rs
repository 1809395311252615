use rand::{Rng, RngCore};
use serde_json::{Number, Value};

use crate::locale::{Concept, ConceptLookup};
use crate::model::{Record, is_blank, is_integer};

/// Ways a record can be mangled beyond character-level noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GarbageStrategy {
    /// Age recorded as 0.
    ZeroAge,
    /// One random non-empty field blanked.
    EmptyField,
    /// Address replaced with the locale's generic placeholder.
    GenericLocation,
    /// Integer stored as a string, or a digit string stored as an integer.
    WrongType,
    /// Free-text/notes field blanked.
    EmptyText,
}

impl GarbageStrategy {
    pub const ALL: [GarbageStrategy; 5] = [
        GarbageStrategy::ZeroAge,
        GarbageStrategy::EmptyField,
        GarbageStrategy::GenericLocation,
        GarbageStrategy::WrongType,
        GarbageStrategy::EmptyText,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GarbageStrategy::ZeroAge => "zero_age",
            GarbageStrategy::EmptyField => "empty_field",
            GarbageStrategy::GenericLocation => "generic_location",
            GarbageStrategy::WrongType => "wrong_type",
            GarbageStrategy::EmptyText => "empty_text",
        }
    }
}

/// Locale inputs for garbage injection.
pub struct GarbageContext<'a> {
    pub concepts: &'a dyn ConceptLookup,
    pub generic_location: &'a str,
}

/// What a triggered injection did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GarbageOutcome {
    pub strategy: GarbageStrategy,
    /// The corrupted field, or `None` when no field matched the strategy.
    pub field: Option<String>,
}

/// Gate draw, then a uniform strategy draw; corrupts at most one field.
///
/// Returns `None` when the gate does not fire. The key set of the record is
/// never changed.
pub fn inject_garbage(
    record: &mut Record,
    rng: &mut dyn RngCore,
    ctx: &GarbageContext<'_>,
    rate: f64,
) -> Option<GarbageOutcome> {
    if rng.random::<f64>() > rate {
        return None;
    }
    let strategy = GarbageStrategy::ALL[rng.random_range(0..GarbageStrategy::ALL.len())];
    let field = apply_garbage(record, strategy, rng, ctx);
    Some(GarbageOutcome { strategy, field })
}

/// Apply one strategy. Fields are scanned in insertion order and only the
/// first match is corrupted; `EmptyField` alone draws, to pick its target.
pub fn apply_garbage(
    record: &mut Record,
    strategy: GarbageStrategy,
    rng: &mut dyn RngCore,
    ctx: &GarbageContext<'_>,
) -> Option<String> {
    match strategy {
        GarbageStrategy::ZeroAge => {
            let key = first_concept_field(record, ctx, Concept::Age)?;
            record.insert(key.clone(), Value::from(0));
            Some(key)
        }
        GarbageStrategy::EmptyField => {
            let candidates: Vec<String> = record
                .iter()
                .filter(|(k, v)| k.as_str() != "doc_type" && !is_blank(v))
                .map(|(k, _)| k.clone())
                .collect();
            if candidates.is_empty() {
                return None;
            }
            let key = candidates[rng.random_range(0..candidates.len())].clone();
            record.insert(key.clone(), Value::from(""));
            Some(key)
        }
        GarbageStrategy::GenericLocation => {
            let key = first_concept_field(record, ctx, Concept::Address)?;
            record.insert(key.clone(), Value::from(ctx.generic_location));
            Some(key)
        }
        GarbageStrategy::WrongType => {
            for (key, value) in record.iter_mut() {
                if key == "doc_type" {
                    continue;
                }
                if is_integer(value) {
                    *value = Value::String(value.to_string());
                    return Some(key.clone());
                }
                if let Some(n) = value.as_str().and_then(parse_digits) {
                    *value = Value::Number(n);
                    return Some(key.clone());
                }
            }
            None
        }
        GarbageStrategy::EmptyText => {
            let key = first_concept_field(record, ctx, Concept::FreeText)?;
            record.insert(key.clone(), Value::from(""));
            Some(key)
        }
    }
}

/// First field that the locale maps to `concept`, or whose name hints at it.
fn first_concept_field(record: &Record, ctx: &GarbageContext<'_>, concept: Concept) -> Option<String> {
    record
        .keys()
        .find(|key| ctx.concepts.is_concept_field(key, concept) || name_hints(key, concept))
        .cloned()
}

fn name_hints(key: &str, concept: Concept) -> bool {
    let lower = key.to_lowercase();
    match concept {
        Concept::Age => lower.contains("age"),
        Concept::Address => lower.contains("address"),
        Concept::FreeText => lower.contains("text") || lower.contains("notes"),
        _ => false,
    }
}

/// Strings made only of ASCII digits that fit an integer.
fn parse_digits(s: &str) -> Option<Number> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse::<u64>().ok().map(Number::from)
}
