use rand::{Rng, RngCore};
use serde::Serialize;
use serde_json::Value;

use crate::locale::{Concept, ConceptLookup, ContradictionTemplates};
use crate::model::{Patient, Record};

/// Fake age deltas applied for age contradictions.
pub const AGE_CONTRADICTION_OFFSETS: [i64; 5] = [-10, -5, 5, 10, 15];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContradictionKind {
    Smoking,
    Age,
    Medication,
}

impl ContradictionKind {
    pub const ALL: [ContradictionKind; 3] = [
        ContradictionKind::Smoking,
        ContradictionKind::Age,
        ContradictionKind::Medication,
    ];
}

/// Instruction for the narrative stage to assert something the structured
/// record does not say. `structured_value` echoes the true value for audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContradictionDirective {
    pub kind: ContradictionKind,
    pub structured_value: Value,
    pub narrative_instruction: String,
}

/// Locale tables the picker reads.
pub struct ContradictionInputs<'a> {
    pub templates: &'a ContradictionTemplates,
    /// Full medication vocabulary of the locale, in declaration order.
    pub medications: &'a [&'static str],
    pub concepts: &'a dyn ConceptLookup,
}

/// Decide once per record whether the narrative should contradict it.
///
/// One gate draw, one kind draw, then at most one value draw. A gate that
/// fires can still yield `None` when the chosen kind has nothing to
/// contradict (no integer age field, no medication left to invent).
pub fn pick_contradiction(
    patient: &Patient,
    record: &Record,
    rng: &mut dyn RngCore,
    inputs: &ContradictionInputs<'_>,
    rate: f64,
) -> Option<ContradictionDirective> {
    if rng.random::<f64>() > rate {
        return None;
    }
    let kind = ContradictionKind::ALL[rng.random_range(0..ContradictionKind::ALL.len())];
    let templates = inputs.templates;

    match kind {
        ContradictionKind::Smoking => {
            let instruction = if patient.smoking {
                templates.smoking_no
            } else {
                templates.smoking_yes
            };
            Some(ContradictionDirective {
                kind,
                structured_value: Value::Bool(patient.smoking),
                narrative_instruction: instruction.to_string(),
            })
        }
        ContradictionKind::Age => {
            let real_age = record_age(record, inputs.concepts)?;
            let offset = AGE_CONTRADICTION_OFFSETS[rng.random_range(0..AGE_CONTRADICTION_OFFSETS.len())];
            let mut fake_age = real_age + offset;
            if fake_age < 0 {
                fake_age = real_age + 10;
            }
            Some(ContradictionDirective {
                kind,
                structured_value: Value::from(real_age),
                narrative_instruction: templates.age.replace("{age}", &fake_age.to_string()),
            })
        }
        ContradictionKind::Medication => {
            let extra: Vec<&str> = inputs
                .medications
                .iter()
                .copied()
                .filter(|m| !patient.medications.iter().any(|pm| pm == m))
                .collect();
            if extra.is_empty() {
                return None;
            }
            let med = extra[rng.random_range(0..extra.len())];
            Some(ContradictionDirective {
                kind,
                structured_value: Value::from(patient.medications.clone()),
                narrative_instruction: templates.medication.replace("{med}", med),
            })
        }
    }
}

/// Integer value of the first age-concept field; `None` if the first such
/// field holds anything else (e.g. an age range string).
fn record_age(record: &Record, concepts: &dyn ConceptLookup) -> Option<i64> {
    let (_, value) = record
        .iter()
        .find(|(key, _)| concepts.is_concept_field(key, Concept::Age))?;
    if value.is_boolean() {
        return None;
    }
    value.as_i64()
}
