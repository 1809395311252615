//! Facility-specific structured records.
//!
//! The same patient concept lands under a different field name, type and
//! convention at each facility. Concepts a facility does not record are left
//! out entirely.

use chrono::NaiveDate;
use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};
use serde_json::{Map, Number, Value, json};

use crate::config::DocumentConfig;
use crate::generate::DEFAULT_TEXT_FIELD;
use crate::locale::{AgeFormat, Concept, DocType, Facility, IdType, LabTest, LocaleData};
use crate::model::{Patient, Record};

use super::tables::choose_or;

/// Output index for a facility and document type.
pub fn index_name(facility_id: &str, doc_type: DocType) -> String {
    format!("medical_{facility_id}_{}", doc_type.as_str())
}

/// Every index a locale can produce, in facility declaration order.
pub fn all_index_names(data: &LocaleData) -> Vec<String> {
    data.facilities
        .iter()
        .flat_map(|f| f.doc_types.iter().map(|&dt| index_name(f.id, dt)))
        .collect()
}

/// Search-engine mapping for one index: the type of every field the facility
/// records for this document type, wrapped as `{"mappings": {"properties": ...}}`.
///
/// IDs follow the facility's storage type and bucketed ages are keywords.
/// The free-text field is always mapped, under its default name when the
/// facility has none.
pub fn index_mapping(facility: &Facility, doc_type: DocType) -> Value {
    let mut props = Map::new();
    let mut set = |concept: Concept, mapping: Value| {
        let field = match concept {
            Concept::FreeText => Some(facility.field(concept).unwrap_or(DEFAULT_TEXT_FIELD)),
            _ => facility.field(concept),
        };
        if let Some(field) = field {
            props.insert(field.to_string(), mapping);
        }
    };
    let keyword = || json!({"type": "keyword"});
    let text = || json!({"type": "text"});
    let searchable_text = || json!({"type": "text", "fields": {"keyword": {"type": "keyword"}}});

    let id_type = match facility.id_type {
        IdType::Int => "long",
        IdType::Float => "float",
        IdType::String => "keyword",
    };
    set(Concept::PatientId, json!({"type": id_type}));
    set(Concept::PatientName, searchable_text());
    set(Concept::Facility, keyword());
    set(Concept::Date, keyword());
    set(Concept::Address, text());
    let age_type = match facility.age_format {
        AgeFormat::Range => "keyword",
        AgeFormat::Years => "integer",
    };
    set(Concept::Age, json!({"type": age_type}));
    set(Concept::Gender, keyword());
    set(Concept::Smoking, json!({"type": "boolean"}));
    set(Concept::BloodType, keyword());
    set(Concept::Occupation, keyword());
    set(Concept::Conditions, keyword());
    set(Concept::Medications, keyword());
    set(Concept::Icd10, keyword());
    set(Concept::FreeText, text());
    set(Concept::Department, keyword());
    set(Concept::Diagnosis, searchable_text());

    match doc_type {
        DocType::Lab => {
            let key = |concept, default: &'static str| facility.field(concept).unwrap_or(default).to_string();
            let mut entry = Map::new();
            entry.insert(key(Concept::LabTestName, "test_name"), keyword());
            entry.insert(key(Concept::LabValue, "result"), json!({"type": "float"}));
            entry.insert(key(Concept::LabUnit, "units"), keyword());
            entry.insert(key(Concept::LabReference, "ref_range"), keyword());
            entry.insert(key(Concept::LabFlag, "flag"), keyword());
            props.insert(
                "lab_results".to_string(),
                json!({"type": "nested", "properties": entry}),
            );
        }
        DocType::Referral => {
            set(Concept::ReferralTo, keyword());
            set(Concept::ReferralReason, text());
            set(Concept::Urgency, keyword());
        }
        DocType::Discharge | DocType::Visit => {}
    }
    props.insert("doc_type".to_string(), keyword());

    json!({"mappings": {"properties": props}})
}

/// `(index name, mapping)` for every index a locale can produce.
pub fn all_index_mappings(data: &LocaleData) -> Vec<(String, Value)> {
    data.facilities
        .iter()
        .flat_map(|f| f.doc_types.iter().map(|&dt| (index_name(f.id, dt), index_mapping(f, dt))))
        .collect()
}

/// Build the clean record for one document.
///
/// Draws only for doc-type-specific fields: department and diagnosis for
/// discharges and visits, the lab panel, or the referral target, reason and
/// urgency. `doc_type` is always the last key.
pub fn build_structured_fields(
    patient: &Patient,
    facility: &Facility,
    doc_type: DocType,
    doc_date: NaiveDate,
    rng: &mut dyn RngCore,
    data: &LocaleData,
    documents: &DocumentConfig,
) -> Record {
    let mut record = Record::new();
    let mut set = |concept: Concept, value: Value| {
        if let Some(field) = facility.field(concept) {
            record.insert(field.to_string(), value);
        }
    };

    set(Concept::PatientId, id_value(&patient.id, facility.id_type));
    set(Concept::PatientName, Value::from(patient.full_name.as_str()));
    set(
        Concept::Age,
        age_value(patient.age_on(doc_date), facility.age_format, documents.age_range_bucket),
    );
    set(Concept::Gender, Value::from(patient.gender.as_str()));
    set(Concept::Date, Value::from(doc_date.format(facility.date_format).to_string()));
    set(Concept::Facility, Value::from(facility.name));
    set(Concept::Address, Value::from(patient.address.as_str()));

    set(Concept::Smoking, Value::Bool(patient.smoking));
    set(Concept::BloodType, Value::from(patient.blood_type.as_str()));
    set(Concept::Occupation, Value::from(patient.occupation.as_str()));
    set(Concept::Conditions, string_list(&patient.conditions));
    set(Concept::Medications, string_list(&patient.medications));
    set(Concept::Icd10, string_list(&patient.icd10_codes));

    match doc_type {
        DocType::Discharge | DocType::Visit => {
            let department = choose_or(data.departments, "", rng);
            set(Concept::Department, Value::from(department));
            let diagnosis = pick_condition(patient, data.fallback.no_diagnosis, rng);
            set(Concept::Diagnosis, Value::from(diagnosis));
        }
        DocType::Lab => {
            let results = lab_results(facility, data.lab_tests, rng, documents);
            record.insert("lab_results".to_string(), Value::Array(results));
        }
        DocType::Referral => {
            let target = choose_or(data.departments, "", rng);
            set(Concept::ReferralTo, Value::from(target));
            let reason = pick_condition(patient, data.fallback.referral_default, rng);
            set(Concept::ReferralReason, Value::from(reason));
            let urgency = choose_or(data.urgency_values, "", rng);
            set(Concept::Urgency, Value::from(urgency));
        }
    }

    record.insert("doc_type".to_string(), Value::from(doc_type.as_str()));
    record
}

fn id_value(id: &str, id_type: IdType) -> Value {
    let numeric = id.parse::<i64>().ok();
    match (id_type, numeric) {
        (IdType::Int, Some(n)) => Value::from(n),
        (IdType::Float, Some(n)) => Number::from_f64(n as f64).map_or_else(|| Value::from(id), Value::Number),
        _ => Value::from(id),
    }
}

/// Integer years, or a bucket label such as "50-60".
fn age_value(age: i64, format: AgeFormat, bucket: u32) -> Value {
    match format {
        AgeFormat::Years => Value::from(age),
        AgeFormat::Range => {
            let bucket = i64::from(bucket.max(1));
            let low = age.div_euclid(bucket) * bucket;
            Value::from(format!("{low}-{}", low + bucket))
        }
    }
}

fn string_list(items: &[String]) -> Value {
    Value::Array(items.iter().map(|s| Value::from(s.as_str())).collect())
}

/// One of the patient's conditions, or the fallback without drawing.
fn pick_condition(patient: &Patient, fallback: &str, rng: &mut dyn RngCore) -> String {
    patient
        .conditions
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

fn lab_results(facility: &Facility, tests: &[LabTest], rng: &mut dyn RngCore, documents: &DocumentConfig) -> Vec<Value> {
    let key = |concept, default: &'static str| facility.field(concept).unwrap_or(default).to_string();
    let name_key = key(Concept::LabTestName, "test_name");
    let value_key = key(Concept::LabValue, "result");
    let unit_key = key(Concept::LabUnit, "units");
    let reference_key = key(Concept::LabReference, "ref_range");
    let flag_key = key(Concept::LabFlag, "flag");

    let count = rng.random_range(documents.min_lab_tests_per_doc..=documents.max_lab_tests_per_doc);
    let panel: Vec<&LabTest> = tests.choose_multiple(rng, count.min(tests.len())).collect();

    panel
        .into_iter()
        .map(|test| {
            let abnormal = rng.random::<f64>() < documents.lab_abnormal_rate;
            let (low, high) = if abnormal { test.abnormal } else { test.normal };
            let value = if test.decimal {
                let raw = low + (high - low) * rng.random::<f64>();
                Value::from((raw * 10.0).round() / 10.0)
            } else {
                Value::from(rng.random_range(low as i64..=high as i64))
            };

            let mut entry = Map::new();
            entry.insert(name_key.clone(), Value::from(test.name));
            entry.insert(value_key.clone(), value);
            entry.insert(unit_key.clone(), Value::from(test.unit));
            entry.insert(reference_key.clone(), Value::from(test.reference()));
            entry.insert(flag_key.clone(), Value::from(if abnormal { "H" } else { "N" }));
            Value::Object(entry)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::load_locale;
    use crate::testutil::{CountingRng, ScriptedRng, sample_patient};
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn index_names() {
        assert_eq!(index_name("reina", DocType::Lab), "medical_reina_lab");
        let data = load_locale("es_ES").unwrap().data();
        let all = all_index_names(data);
        assert_eq!(all.len(), 10);
        assert_eq!(all[0], "medical_reina_discharge");
        assert!(all.contains(&"medical_iberia_lab".to_string()));
    }

    #[test]
    fn visit_record_follows_facility_schema() {
        let locale = load_locale("es_ES").unwrap();
        let data = locale.data();
        let facility = data.facility("reina").unwrap();
        let patient = sample_patient();
        let mut rng = ScriptedRng::constant(0.0);
        let rec = build_structured_fields(&patient, facility, DocType::Visit, date(), &mut rng, data, &DocumentConfig::default());

        let keys: Vec<&str> = rec.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "dni",
                "nombre_completo",
                "edad",
                "sexo",
                "fecha",
                "centro",
                "domicilio",
                "fumador",
                "grupo_sanguineo",
                "antecedentes",
                "tratamiento_habitual",
                "codigos_cie10",
                "servicio",
                "diagnostico_principal",
                "doc_type",
            ]
        );
        assert_eq!(rec["dni"], json!("12345678Z"));
        assert_eq!(rec["edad"], json!(53));
        assert_eq!(rec["fecha"], json!("09/03/2024"));
        assert_eq!(rec["servicio"], json!("medicina interna"));
        assert_eq!(rec["diagnostico_principal"], json!("diabetes tipo 2"));
        assert_eq!(rec["doc_type"], json!("visit"));
        assert_eq!(rng.consumed(), 2);
    }

    #[test]
    fn absent_concepts_are_omitted() {
        let locale = load_locale("es_ES").unwrap();
        let data = locale.data();
        let facility = data.facility("iberia").unwrap();
        let mut rng = CountingRng::seeded(4);
        let rec = build_structured_fields(&sample_patient(), facility, DocType::Lab, date(), &mut rng, data, &DocumentConfig::default());
        assert!(!rec.contains_key("domicilio"));
        assert!(!rec.contains_key("direccion"));
        assert_eq!(rec["rango_edad"], json!("50-60"));
        assert_eq!(rec["fecha_muestra"], json!("2024-03-09"));
    }

    #[test]
    fn lab_panel_uses_facility_keys_and_bounds() {
        let locale = load_locale("es_ES").unwrap();
        let data = locale.data();
        let facility = data.facility("iberia").unwrap();
        let documents = DocumentConfig::default();
        let mut rng = CountingRng::seeded(9);
        for _ in 0..50 {
            let rec = build_structured_fields(&sample_patient(), facility, DocType::Lab, date(), &mut rng, data, &documents);
            let results = rec["lab_results"].as_array().unwrap();
            assert!((documents.min_lab_tests_per_doc..=documents.max_lab_tests_per_doc).contains(&results.len()));
            for entry in results {
                let obj = entry.as_object().unwrap();
                let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
                assert_eq!(keys, vec!["analito", "valor", "unidades", "rango_normal", "marca"]);
                let test = data.lab_tests.iter().find(|t| obj["analito"] == json!(t.name)).unwrap();
                let value = obj["valor"].as_f64().unwrap();
                let (low, high) = if obj["marca"] == json!("H") { test.abnormal } else { test.normal };
                assert!(value >= low - 0.05 && value <= high + 0.05, "{} = {value}", test.name);
                assert_eq!(obj["rango_normal"], json!(test.reference()));
            }
        }
    }

    #[test]
    fn lab_keys_default_when_unmapped() {
        let locale = load_locale("he_IL").unwrap();
        let data = locale.data();
        let facility = data.facility("alon").unwrap();
        let mut rng = CountingRng::seeded(2);
        let rec = build_structured_fields(&sample_patient(), facility, DocType::Lab, date(), &mut rng, data, &DocumentConfig::default());
        let first = rec["lab_results"][0].as_object().unwrap();
        let keys: Vec<&str> = first.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["test_name", "result", "units", "ref_range", "flag"]);
    }

    #[test]
    fn id_storage_types() {
        assert_eq!(id_value("012345678", IdType::Int), json!(12345678));
        assert_eq!(id_value("123456782", IdType::Float), json!(123456782.0));
        assert_eq!(id_value("123456782", IdType::String), json!("123456782"));
        assert_eq!(id_value("12345678Z", IdType::Int), json!("12345678Z"));
    }

    #[test]
    fn age_buckets() {
        assert_eq!(age_value(37, AgeFormat::Range, 10), json!("30-40"));
        assert_eq!(age_value(40, AgeFormat::Range, 10), json!("40-50"));
        assert_eq!(age_value(37, AgeFormat::Years, 10), json!(37));
    }

    #[test]
    fn referral_without_conditions_uses_fallback() {
        let locale = load_locale("es_ES").unwrap();
        let data = locale.data();
        let facility = data.facility("atencion").unwrap();
        let mut patient = sample_patient();
        patient.conditions.clear();
        let mut rng = ScriptedRng::constant(0.0);
        let rec = build_structured_fields(&patient, facility, DocType::Referral, date(), &mut rng, data, &DocumentConfig::default());
        assert_eq!(rec["motivo_consulta"], json!("estudio"));
        assert_eq!(rec["destino"], json!("medicina interna"));
        assert_eq!(rec["prioridad"], json!("ordinaria"));
        assert_eq!(rng.consumed(), 2);
    }

    #[test]
    fn int_id_lab_mapping() {
        let locale = load_locale("he_IL").unwrap();
        let facility = locale.data().facility("alon").unwrap();
        let mapping = index_mapping(facility, DocType::Lab);
        let props = &mapping["mappings"]["properties"];

        assert_eq!(props["patient_id"], json!({"type": "long"}));
        assert_eq!(props["patient_age"], json!({"type": "integer"}));
        assert_eq!(props["smoker"], json!({"type": "boolean"}));
        assert_eq!(props["patient_name"]["fields"]["keyword"], json!({"type": "keyword"}));
        assert_eq!(
            props["lab_results"],
            json!({
                "type": "nested",
                "properties": {
                    "test_name": {"type": "keyword"},
                    "result": {"type": "float"},
                    "units": {"type": "keyword"},
                    "ref_range": {"type": "keyword"},
                    "flag": {"type": "keyword"},
                }
            })
        );
        assert!(props.get("referred_to").is_none());
        assert_eq!(props.as_object().unwrap().keys().last().map(String::as_str), Some("doc_type"));
    }

    #[test]
    fn range_age_visit_mapping() {
        let locale = load_locale("he_IL").unwrap();
        let facility = locale.data().facility("shaked").unwrap();
        let props = index_mapping(facility, DocType::Visit)["mappings"]["properties"].clone();

        assert_eq!(props["age_group"], json!({"type": "keyword"}));
        assert_eq!(props["tz"], json!({"type": "keyword"}));
        assert!(props.get("lab_results").is_none());

        let ofek = locale.data().facility("ofek").unwrap();
        let props = index_mapping(ofek, DocType::Lab)["mappings"]["properties"].clone();
        assert_eq!(props["ID"], json!({"type": "float"}));
        assert_eq!(props["lab_results"]["properties"]["Value"], json!({"type": "float"}));
    }

    #[test]
    fn every_record_field_is_mapped() {
        for code in crate::locale::available_locales() {
            let locale = load_locale(code).unwrap();
            let data = locale.data();
            let mappings = all_index_mappings(data);
            assert_eq!(mappings.len(), all_index_names(data).len());

            let mut rng = CountingRng::seeded(2);
            for facility in data.facilities {
                for &doc_type in facility.doc_types {
                    let mapping = index_mapping(facility, doc_type);
                    let props = mapping["mappings"]["properties"].as_object().unwrap();
                    let rec = build_structured_fields(&sample_patient(), facility, doc_type, date(), &mut rng, data, &DocumentConfig::default());
                    for key in rec.keys() {
                        assert!(props.contains_key(key), "{code} {}: {key} unmapped", facility.id);
                    }
                    let text = facility.field(Concept::FreeText).unwrap_or(DEFAULT_TEXT_FIELD);
                    assert!(props.contains_key(text));
                }
            }
        }
    }
}
