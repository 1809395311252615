//! Seeded corruption of clean records and narratives.
//!
//! Every function here is total and deterministic in its `rng` argument. The
//! document phase drives them in a fixed order per record: contradiction
//! choice, field noise, garbage injection. Narrative noise runs later, once
//! the text exists.

pub mod contradiction;
pub mod field;
pub mod garbage;
pub mod index;
pub mod ocr;
pub mod rules;
pub mod typos;

pub use contradiction::{
    AGE_CONTRADICTION_OFFSETS, ContradictionDirective, ContradictionInputs, ContradictionKind,
    pick_contradiction,
};
pub use field::{FieldCharMap, FieldNoiseRates, apply_field_noise, distort_fields, looks_like_code, swap_code_digits};
pub use garbage::{GarbageContext, GarbageOutcome, GarbageStrategy, apply_garbage, inject_garbage};
pub use index::{Match, RuleIndex};
pub use ocr::{OcrRates, apply_ocr_noise};
pub use rules::{ConfusionRule, load_rules};
pub use typos::apply_typos;

use rand::RngCore;

use crate::config::DistortionRates;
use crate::locale::{Locale, SourceType};
use crate::model::{Patient, Record};

/// What the per-record pipeline decided.
#[derive(Debug, Clone, Default)]
pub struct RecordDistortion {
    pub contradiction: Option<ContradictionDirective>,
    pub garbage: Option<GarbageOutcome>,
}

/// Binds a loaded locale to a set of rates.
#[derive(Clone, Copy)]
pub struct Distorter<'a> {
    locale: &'a Locale,
    rates: DistortionRates,
}

impl<'a> Distorter<'a> {
    pub fn new(locale: &'a Locale, rates: DistortionRates) -> Self {
        Self { locale, rates }
    }

    pub fn rates(&self) -> DistortionRates {
        self.rates
    }

    /// Run the structured-record stages in order. The contradiction is chosen
    /// against the clean record, before any field is touched.
    pub fn distort_record(
        &self,
        patient: &Patient,
        record: &mut Record,
        source: SourceType,
        rng: &mut dyn RngCore,
    ) -> RecordDistortion {
        let data = self.locale.data();

        let inputs = ContradictionInputs {
            templates: &data.contradiction_templates,
            medications: data.medications,
            concepts: self.locale.concepts(),
        };
        let contradiction = pick_contradiction(patient, record, rng, &inputs, self.rates.contradiction_rate);

        distort_fields(
            record,
            source,
            rng,
            self.locale.field_map(),
            FieldNoiseRates {
                char_error: self.rates.ocr_field_error_rate,
                digit_swap: self.rates.code_digit_swap_rate,
            },
        );

        let ctx = GarbageContext {
            concepts: self.locale.concepts(),
            generic_location: data.generic_location,
        };
        let garbage = inject_garbage(record, rng, &ctx, self.rates.garbage_rate);

        RecordDistortion { contradiction, garbage }
    }

    /// OCR noise for scanned sources, typos for digital ones.
    pub fn distort_narrative(&self, text: &str, source: SourceType, rng: &mut dyn RngCore) -> String {
        match source {
            SourceType::Ocr => apply_ocr_noise(
                text,
                rng,
                self.locale.rule_index(),
                OcrRates {
                    char_error: self.rates.ocr_char_error_rate,
                    space_drop: self.rates.ocr_space_drop_rate,
                    space_insert: self.rates.ocr_space_insert_rate,
                },
            ),
            SourceType::Digital => apply_typos(text, rng, self.rates.digital_typo_rate),
        }
    }
}
