//! Locale bundles: static data tables, facility schemas, OCR rule sets and
//! the per-locale capabilities (names, national IDs, prompts).
//!
//! A [`Locale`] is loaded once per run. Loading validates the confusion rules
//! and derives the tables the distortion pipeline reuses for every record.

pub mod ar_eg;
pub mod es_ar;
pub mod es_es;
pub mod he_il;
pub mod scripts;

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::distort::{ConfusionRule, ContradictionDirective, FieldCharMap, RuleIndex, load_rules};
use crate::error::LocaleError;
use crate::model::{Gender, Patient, PersonName};

// ---------------------------------------------------------------------------
// Schema vocabulary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Discharge,
    Lab,
    Visit,
    Referral,
}

impl DocType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocType::Discharge => "discharge",
            DocType::Lab => "lab",
            DocType::Visit => "visit",
            DocType::Referral => "referral",
        }
    }
}

/// How a facility's documents of a given type reach the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Scanned paper: OCR noise on fields and text.
    Ocr,
    /// Typed directly: typo noise on text only.
    Digital,
}

/// Storage type of the patient ID at a facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdType {
    String,
    Int,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeFormat {
    /// Integer years.
    Years,
    /// Bucketed range string such as "30-40".
    Range,
}

/// Abstract semantic field, mapped to a concrete field name per facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Concept {
    PatientId,
    PatientName,
    Age,
    Gender,
    Date,
    Facility,
    Address,
    Smoking,
    BloodType,
    Occupation,
    Conditions,
    Medications,
    Icd10,
    FreeText,
    Department,
    Diagnosis,
    ReferralTo,
    ReferralReason,
    Urgency,
    LabTestName,
    LabValue,
    LabUnit,
    LabReference,
    LabFlag,
}

/// A simulated institution with its own field naming and conventions.
#[derive(Debug)]
pub struct Facility {
    pub id: &'static str,
    pub name: &'static str,
    pub doc_types: &'static [DocType],
    /// Document types that arrive scanned; everything else is digital.
    pub ocr_doc_types: &'static [DocType],
    pub id_type: IdType,
    pub age_format: AgeFormat,
    /// strftime pattern for document dates.
    pub date_format: &'static str,
    pub fields: &'static [(Concept, &'static str)],
    /// Prose style hint for narrative generation.
    pub style: &'static str,
}

impl Facility {
    pub fn field(&self, concept: Concept) -> Option<&'static str> {
        self.fields.iter().find(|(c, _)| *c == concept).map(|(_, name)| *name)
    }

    pub fn source(&self, doc_type: DocType) -> SourceType {
        if self.ocr_doc_types.contains(&doc_type) {
            SourceType::Ocr
        } else {
            SourceType::Digital
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LabTest {
    pub name: &'static str,
    pub unit: &'static str,
    pub normal: (f64, f64),
    pub abnormal: (f64, f64),
    /// Values carry one decimal place instead of being whole numbers.
    pub decimal: bool,
}

impl LabTest {
    pub const fn whole(name: &'static str, unit: &'static str, normal: (f64, f64), abnormal: (f64, f64)) -> Self {
        Self { name, unit, normal, abnormal, decimal: false }
    }

    pub const fn decimal(name: &'static str, unit: &'static str, normal: (f64, f64), abnormal: (f64, f64)) -> Self {
        Self { name, unit, normal, abnormal, decimal: true }
    }

    /// Reference range as printed on the report, e.g. "70-100" or "4.0-5.6".
    pub fn reference(&self) -> String {
        if self.decimal {
            format!("{:.1}-{:.1}", self.normal.0, self.normal.1)
        } else {
            format!("{}-{}", self.normal.0 as i64, self.normal.1 as i64)
        }
    }
}

/// Narrative snippets that contradict structured data. `age` contains an
/// `{age}` placeholder and `medication` a `{med}` placeholder.
#[derive(Debug, Clone, Copy)]
pub struct ContradictionTemplates {
    pub smoking_yes: &'static str,
    pub smoking_no: &'static str,
    pub age: &'static str,
    pub medication: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct FallbackStrings {
    pub no_conditions: &'static str,
    pub no_medications: &'static str,
    pub no_diagnosis: &'static str,
    pub referral_default: &'static str,
}

/// Static, read-only tables for one locale.
#[derive(Debug)]
pub struct LocaleData {
    pub code: &'static str,
    pub language: &'static str,
    pub country: &'static str,
    pub cities: &'static [&'static str],
    pub streets: &'static [&'static str],
    pub occupations: &'static [&'static str],
    pub conditions: &'static [&'static str],
    pub medications: &'static [&'static str],
    pub departments: &'static [&'static str],
    pub lab_tests: &'static [LabTest],
    /// Condition -> ICD-10 code.
    pub icd10_codes: &'static [(&'static str, &'static str)],
    pub facilities: &'static [Facility],
    /// Look-alike glyph groups, expanded to pairwise rules ahead of `ocr_rules`.
    pub ocr_groups: &'static [(&'static [&'static str], f64)],
    pub ocr_rules: &'static [(&'static str, &'static str, f64)],
    pub system_prompt: &'static str,
    pub doc_type_contexts: &'static [(DocType, &'static str)],
    pub medical_abbreviations: &'static str,
    pub contradiction_templates: ContradictionTemplates,
    pub fallback: FallbackStrings,
    /// Placeholder used when garbage injection wipes an address.
    pub generic_location: &'static str,
    pub urgency_values: &'static [&'static str],
}

impl LocaleData {
    pub fn facility(&self, id: &str) -> Option<&'static Facility> {
        let facilities: &'static [Facility] = self.facilities;
        facilities.iter().find(|f| f.id == id)
    }

    pub fn icd10_for(&self, condition: &str) -> Option<&'static str> {
        self.icd10_codes.iter().find(|(c, _)| *c == condition).map(|(_, code)| *code)
    }

    pub fn doc_type_context(&self, doc_type: DocType) -> &'static str {
        self.doc_type_contexts
            .iter()
            .find(|(dt, _)| *dt == doc_type)
            .map(|(_, ctx)| *ctx)
            .unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Patient details available when the national ID is generated. Some ID
/// schemes encode parts of the holder's identity.
#[derive(Debug, Clone, Copy)]
pub struct PatientSketch<'a> {
    pub name: &'a PersonName,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub city: &'a str,
}

/// Per-locale behaviour: one implementation per locale.
pub trait LocaleProvider: Send + Sync {
    fn data(&self) -> &'static LocaleData;

    fn generate_name(&self, gender: Gender, rng: &mut dyn RngCore) -> PersonName;

    fn emergency_contact_name(&self, rng: &mut dyn RngCore) -> String;

    fn generate_id(&self, sketch: &PatientSketch<'_>, rng: &mut dyn RngCore) -> String;

    fn format_address(&self, street: &str, number: u32, city: &str) -> String {
        format!("{street} {number}, {city}")
    }

    /// User prompt for the narrative model.
    fn format_prompt(
        &self,
        patient: &Patient,
        facility: &Facility,
        doc_type: DocType,
        contradiction: Option<&ContradictionDirective>,
    ) -> String;
}

/// Answers "is this field name the locale's field for `concept`?".
pub trait ConceptLookup {
    fn is_concept_field(&self, field: &str, concept: Concept) -> bool;
}

/// Union of concrete field names per concept across a locale's facilities.
#[derive(Debug, Clone, Default)]
pub struct ConceptFields {
    by_concept: HashMap<Concept, HashSet<&'static str>>,
}

impl ConceptFields {
    pub fn from_facilities(facilities: &'static [Facility]) -> Self {
        let mut by_concept: HashMap<Concept, HashSet<&'static str>> = HashMap::new();
        for facility in facilities {
            for &(concept, name) in facility.fields {
                by_concept.entry(concept).or_default().insert(name);
            }
        }
        Self { by_concept }
    }

    pub fn names(&self, concept: Concept) -> impl Iterator<Item = &'static str> + '_ {
        self.by_concept.get(&concept).into_iter().flatten().copied()
    }
}

impl ConceptLookup for ConceptFields {
    fn is_concept_field(&self, field: &str, concept: Concept) -> bool {
        self.by_concept
            .get(&concept)
            .is_some_and(|names| names.contains(field))
    }
}

// ---------------------------------------------------------------------------
// Loaded bundle
// ---------------------------------------------------------------------------

/// A loaded locale: provider plus the validated rule set and the tables
/// derived from it, built once and shared by every record.
pub struct Locale {
    provider: Box<dyn LocaleProvider>,
    rules: Vec<ConfusionRule>,
    rule_index: RuleIndex,
    field_map: FieldCharMap,
    concepts: ConceptFields,
}

impl Locale {
    pub fn from_provider(provider: Box<dyn LocaleProvider>) -> Result<Self, LocaleError> {
        let data = provider.data();
        let mut table = scripts::expand_groups(data.ocr_groups);
        table.extend_from_slice(data.ocr_rules);
        let rules = load_rules(&table)?;
        let rule_index = RuleIndex::build(&rules);
        let field_map = FieldCharMap::from_rules(&rules);
        let concepts = ConceptFields::from_facilities(data.facilities);
        tracing::debug!(
            locale = data.code,
            rules = rules.len(),
            field_map = field_map.len(),
            "locale loaded"
        );
        Ok(Self {
            provider,
            rules,
            rule_index,
            field_map,
            concepts,
        })
    }

    pub fn code(&self) -> &'static str {
        self.data().code
    }

    pub fn data(&self) -> &'static LocaleData {
        self.provider.data()
    }

    pub fn provider(&self) -> &dyn LocaleProvider {
        self.provider.as_ref()
    }

    pub fn rules(&self) -> &[ConfusionRule] {
        &self.rules
    }

    pub fn rule_index(&self) -> &RuleIndex {
        &self.rule_index
    }

    pub fn field_map(&self) -> &FieldCharMap {
        &self.field_map
    }

    pub fn concepts(&self) -> &ConceptFields {
        &self.concepts
    }
}

type ProviderCtor = fn() -> Box<dyn LocaleProvider>;

fn egypt() -> Box<dyn LocaleProvider> {
    Box::new(ar_eg::Egypt)
}

fn argentina() -> Box<dyn LocaleProvider> {
    Box::new(es_ar::Argentina)
}

fn spain() -> Box<dyn LocaleProvider> {
    Box::new(es_es::Spain)
}

fn israel() -> Box<dyn LocaleProvider> {
    Box::new(he_il::Israel)
}

const REGISTRY: &[(&str, ProviderCtor)] = &[
    ("ar_EG", egypt),
    ("es_AR", argentina),
    ("es_ES", spain),
    ("he_IL", israel),
];

/// Registered locale codes, sorted.
pub fn available_locales() -> Vec<&'static str> {
    let mut codes: Vec<&'static str> = REGISTRY.iter().map(|(code, _)| *code).collect();
    codes.sort_unstable();
    codes
}

pub fn load_locale(code: &str) -> Result<Locale, LocaleError> {
    let ctor = REGISTRY
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, ctor)| *ctor)
        .ok_or_else(|| LocaleError::UnknownLocale {
            code: code.to_string(),
            available: available_locales().join(", "),
        })?;
    Locale::from_provider(ctor())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [Concept; 5] = [
        Concept::PatientId,
        Concept::PatientName,
        Concept::Age,
        Concept::Date,
        Concept::FreeText,
    ];

    #[test]
    fn unknown_locale_errors() {
        let err = load_locale("xx_XX").err().unwrap();
        assert!(matches!(err, LocaleError::UnknownLocale { .. }));
        assert!(err.to_string().contains("es_ES, he_IL"));
    }

    #[test]
    fn registry_lists_every_locale() {
        assert_eq!(available_locales(), vec!["ar_EG", "es_AR", "es_ES", "he_IL"]);
    }

    #[test]
    fn arabic_rules_expand_dot_groups_first() {
        let locale = load_locale("ar_EG").unwrap();
        let groups = scripts::expand_groups(scripts::ARABIC_GROUPS);
        assert_eq!(locale.rules().len(), groups.len() + scripts::ARABIC.len());
        assert_eq!(locale.rules()[0], ConfusionRule::new("ب", "ت", 1.0).unwrap());
        assert_eq!(locale.field_map().get('ب'), Some("ت"));
        assert_eq!(locale.field_map().get('\u{064E}'), Some(""));

        let latin = load_locale("es_AR").unwrap();
        assert_eq!(latin.rules().len(), scripts::LATIN.len());
    }

    #[test]
    fn every_registered_locale_loads_and_is_complete() {
        for code in available_locales() {
            let locale = load_locale(code).unwrap();
            let data = locale.data();
            assert_eq!(locale.code(), code);
            assert!(!data.cities.is_empty());
            assert!(!data.streets.is_empty());
            assert!(!data.occupations.is_empty());
            assert!(!data.conditions.is_empty());
            assert!(!data.medications.is_empty());
            assert!(!data.departments.is_empty());
            assert!(!data.lab_tests.is_empty());
            assert!(!data.icd10_codes.is_empty());
            assert!(!data.facilities.is_empty());
            assert!(!data.urgency_values.is_empty());
            assert!(!data.system_prompt.is_empty());
            assert!(!data.generic_location.is_empty());
            assert!(!locale.rules().is_empty());
            assert!(!locale.rule_index().is_empty());
        }
    }

    #[test]
    fn facilities_cover_required_concepts_and_doc_contexts() {
        for code in available_locales() {
            let locale = load_locale(code).unwrap();
            let data = locale.data();
            for facility in data.facilities {
                assert!(data.facility(facility.id).is_some());
                for concept in REQUIRED {
                    assert!(
                        facility.field(concept).is_some(),
                        "{code}/{} missing {concept:?}",
                        facility.id
                    );
                }
                for &dt in facility.doc_types {
                    assert!(!data.doc_type_context(dt).is_empty(), "{code}: no context for {dt:?}");
                }
                for &dt in facility.ocr_doc_types {
                    assert!(facility.doc_types.contains(&dt));
                }
            }
        }
    }

    #[test]
    fn every_condition_has_icd10_code() {
        for code in available_locales() {
            let data = load_locale(code).unwrap().data();
            for condition in data.conditions {
                assert!(data.icd10_for(condition).is_some(), "{code}: {condition}");
            }
        }
    }

    #[test]
    fn templates_have_placeholders() {
        for code in available_locales() {
            let t = load_locale(code).unwrap().data().contradiction_templates;
            assert!(t.age.contains("{age}"));
            assert!(t.medication.contains("{med}"));
        }
    }

    #[test]
    fn concept_fields_union_across_facilities() {
        let locale = load_locale("he_IL").unwrap();
        let concepts = locale.concepts();
        assert!(concepts.is_concept_field("patient_age", Concept::Age));
        assert!(concepts.is_concept_field("גיל", Concept::Age));
        assert!(!concepts.is_concept_field("patient_age", Concept::Address));
        assert!(concepts.names(Concept::FreeText).count() >= 2);
    }

    #[test]
    fn lab_reference_formats() {
        let whole = LabTest::whole("glucosa", "mg/dL", (70.0, 100.0), (101.0, 400.0));
        let dec = LabTest::decimal("HbA1c", "%", (4.0, 5.6), (5.7, 14.0));
        assert_eq!(whole.reference(), "70-100");
        assert_eq!(dec.reference(), "4.0-5.6");
    }

    #[test]
    fn facility_source_defaults_to_digital() {
        let data = load_locale("es_ES").unwrap().data();
        for facility in data.facilities {
            for &dt in facility.doc_types {
                let expected = if facility.ocr_doc_types.contains(&dt) { SourceType::Ocr } else { SourceType::Digital };
                assert_eq!(facility.source(dt), expected);
            }
        }
    }
}
