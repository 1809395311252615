use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ConfigError;

/// Configuration for a full generation run.
///
/// Every section has defaults, so a TOML file only needs to name the values it
/// overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub num_patients: usize,
    /// Patient pool seed. The document phase uses `seed + 1`.
    pub seed: u64,
    pub locale: String,
    pub output_dir: PathBuf,
    /// Overwrite existing `.ndjson` files in `output_dir`.
    pub force: bool,
    /// Fill free-text fields with a placeholder instead of calling the LLM.
    pub skip_freetext: bool,
    pub population: PopulationConfig,
    pub documents: DocumentConfig,
    pub distortion: DistortionRates,
    pub narrative: NarrativeConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_patients: 500,
            seed: 42,
            locale: "he_IL".to_string(),
            output_dir: PathBuf::from("output"),
            force: false,
            skip_freetext: false,
            population: PopulationConfig::default(),
            documents: DocumentConfig::default(),
            distortion: DistortionRates::default(),
            narrative: NarrativeConfig::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GeneratorConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject rates outside `[0, 1]` and inverted ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.distortion;
        let rates = [
            ("distortion.garbage_rate", d.garbage_rate),
            ("distortion.contradiction_rate", d.contradiction_rate),
            ("distortion.ocr_char_error_rate", d.ocr_char_error_rate),
            ("distortion.ocr_field_error_rate", d.ocr_field_error_rate),
            ("distortion.ocr_space_drop_rate", d.ocr_space_drop_rate),
            ("distortion.ocr_space_insert_rate", d.ocr_space_insert_rate),
            ("distortion.digital_typo_rate", d.digital_typo_rate),
            ("distortion.code_digit_swap_rate", d.code_digit_swap_rate),
            ("population.smoking_prevalence", self.population.smoking_prevalence),
            ("documents.lab_abnormal_rate", self.documents.lab_abnormal_rate),
        ];
        for (name, rate) in rates {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::Invalid {
                    reason: format!("{name} must be within [0, 1], got {rate}"),
                });
            }
        }

        let doc = &self.documents;
        let ranges = [
            ("documents.facilities_per_patient", doc.min_facilities_per_patient, doc.max_facilities_per_patient),
            ("documents.docs_per_visit", doc.min_docs_per_visit, doc.max_docs_per_visit),
            ("documents.lab_tests_per_doc", doc.min_lab_tests_per_doc, doc.max_lab_tests_per_doc),
        ];
        for (name, min, max) in ranges {
            if min > max {
                return Err(ConfigError::Invalid {
                    reason: format!("{name}: min {min} exceeds max {max}"),
                });
            }
        }
        if doc.date_start > doc.date_end {
            return Err(ConfigError::Invalid {
                reason: "documents.date_start is after documents.date_end".to_string(),
            });
        }
        if doc.age_range_bucket == 0 {
            return Err(ConfigError::Invalid {
                reason: "documents.age_range_bucket must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Ground-truth patient pool settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Earliest possible date of birth.
    pub dob_start: NaiveDate,
    /// Spread of birth dates after `dob_start`, in days.
    pub dob_range_days: u32,
    pub max_conditions: usize,
    pub max_medications: usize,
    pub max_house_number: u32,
    pub smoking_prevalence: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            dob_start: NaiveDate::from_ymd_opt(1940, 1, 1).unwrap_or_default(),
            dob_range_days: 28_000,
            max_conditions: 5,
            max_medications: 6,
            max_house_number: 120,
            smoking_prevalence: 0.25,
        }
    }
}

/// Document assembly settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub min_facilities_per_patient: usize,
    pub max_facilities_per_patient: usize,
    pub min_docs_per_visit: usize,
    pub max_docs_per_visit: usize,
    pub min_lab_tests_per_doc: usize,
    pub max_lab_tests_per_doc: usize,
    pub lab_abnormal_rate: f64,
    /// Width of age buckets for facilities that record an age range ("30-40").
    pub age_range_bucket: u32,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            date_start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            date_end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or_default(),
            min_facilities_per_patient: 2,
            max_facilities_per_patient: 4,
            min_docs_per_visit: 1,
            max_docs_per_visit: 2,
            min_lab_tests_per_doc: 3,
            max_lab_tests_per_doc: 8,
            lab_abnormal_rate: 0.3,
            age_range_bucket: 10,
        }
    }
}

/// Rates driving the distortion pipeline.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DistortionRates {
    /// Fraction of records that get one garbage field.
    pub garbage_rate: f64,
    /// Fraction of records whose narrative contradicts structured data.
    pub contradiction_rate: f64,
    /// Per character, in OCR-sourced narrative text.
    pub ocr_char_error_rate: f64,
    /// Per character, in OCR-sourced structured fields. Half the text rate.
    pub ocr_field_error_rate: f64,
    pub ocr_space_drop_rate: f64,
    pub ocr_space_insert_rate: f64,
    /// Per character, in digitally sourced narrative text.
    pub digital_typo_rate: f64,
    /// Per code-like token in list fields.
    pub code_digit_swap_rate: f64,
}

impl Default for DistortionRates {
    fn default() -> Self {
        Self {
            garbage_rate: 0.06,
            contradiction_rate: 0.18,
            ocr_char_error_rate: 0.03,
            ocr_field_error_rate: 0.015,
            ocr_space_drop_rate: 0.02,
            ocr_space_insert_rate: 0.008,
            digital_typo_rate: 0.005,
            code_digit_swap_rate: 0.05,
        }
    }
}

/// Settings for the OpenAI-compatible narrative endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    pub api_base: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub timeout_secs: u64,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:11434/v1".to_string(),
            model: "llama4:maverick".to_string(),
            api_key: None,
            temperature: 0.8,
            max_tokens: 800,
            max_attempts: 3,
            backoff_base_ms: 1000,
            timeout_secs: 120,
        }
    }
}

impl NarrativeConfig {
    /// Fill unset endpoint values from `LLM_API_BASE`, `LLM_MODEL` and the
    /// first non-empty of `LLM_API_KEY`, `OPENAI_API_KEY` and
    /// `MOONSHOT_API_KEY`.
    pub fn apply_env(&mut self) {
        if let Ok(base) = std::env::var("LLM_API_BASE") {
            self.api_base = base;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            self.model = model;
        }
        let configured = self.api_key.take();
        self.api_key = first_key(
            std::iter::once(configured).chain(API_KEY_VARS.iter().map(|var| std::env::var(var).ok())),
        );
    }
}

/// Environment variables consulted for the API key, in priority order.
pub const API_KEY_VARS: &[&str] = &["LLM_API_KEY", "OPENAI_API_KEY", "MOONSHOT_API_KEY"];

/// First present, non-empty key. An exported but empty variable does not
/// shadow the ones after it.
fn first_key(candidates: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    candidates.into_iter().flatten().find(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = GeneratorConfig::default();
        assert_eq!(config.num_patients, 500);
        assert_eq!(config.seed, 42);
        assert_eq!(config.locale, "he_IL");
        assert!((config.distortion.garbage_rate - 0.06).abs() < f64::EPSILON);
        assert!((config.distortion.ocr_field_error_rate - 0.015).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let raw = r#"
            num_patients = 12
            locale = "es_ES"

            [distortion]
            garbage_rate = 0.5
        "#;
        let config: GeneratorConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.num_patients, 12);
        assert_eq!(config.locale, "es_ES");
        assert!((config.distortion.garbage_rate - 0.5).abs() < f64::EPSILON);
        assert!((config.distortion.contradiction_rate - 0.18).abs() < f64::EPSILON);
        assert_eq!(config.documents.max_docs_per_visit, 2);
    }

    #[test]
    fn rejects_rate_out_of_range() {
        let mut config = GeneratorConfig::default();
        config.distortion.ocr_char_error_rate = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ocr_char_error_rate"));
    }

    #[test]
    fn rejects_inverted_range() {
        let mut config = GeneratorConfig::default();
        config.documents.min_docs_per_visit = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_toml_file_reads_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("medsynth.toml");
        std::fs::write(&path, "seed = 7\n[documents]\ndate_start = \"2024-01-01\"\n").unwrap();
        let config = GeneratorConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.documents.date_start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        std::fs::write(&path, "[distortion]\ngarbage_rate = -0.1\n").unwrap();
        assert!(matches!(
            GeneratorConfig::from_toml_file(&path),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn api_key_skips_empty_values() {
        fn key(values: &[Option<&str>]) -> Option<String> {
            first_key(values.iter().map(|v| v.map(String::from)))
        }
        assert_eq!(key(&[None, Some(""), Some("sk-openai"), Some("sk-moon")]), Some("sk-openai".into()));
        assert_eq!(key(&[Some(""), None, Some(""), Some("sk-moon")]), Some("sk-moon".into()));
        assert_eq!(key(&[Some("cli"), Some("sk-llm")]), Some("cli".into()));
        assert_eq!(key(&[None, Some(""), None, Some("")]), None);
    }
}
