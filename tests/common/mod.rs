#![allow(dead_code)]

use std::path::Path;

use medsynth::config::DistortionRates;
use medsynth::{GeneratorConfig, Record};

/// Small skip-freetext run writing into `dir`.
pub fn quick_config(dir: &Path, locale: &str, patients: usize) -> GeneratorConfig {
    GeneratorConfig {
        num_patients: patients,
        seed: 42,
        locale: locale.to_string(),
        output_dir: dir.to_path_buf(),
        skip_freetext: true,
        ..GeneratorConfig::default()
    }
}

/// Every noise source switched off.
pub fn no_noise() -> DistortionRates {
    DistortionRates {
        garbage_rate: 0.0,
        contradiction_rate: 0.0,
        ocr_char_error_rate: 0.0,
        ocr_field_error_rate: 0.0,
        ocr_space_drop_rate: 0.0,
        ocr_space_insert_rate: 0.0,
        digital_typo_rate: 0.0,
        code_digit_swap_rate: 0.0,
    }
}

pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

pub fn read_records(path: &Path) -> Vec<Record> {
    read_lines(path)
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

/// Index names (file stems) of every `.ndjson` file in `dir`, sorted.
pub fn index_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "ndjson"))
        .map(|path| path.file_stem().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
