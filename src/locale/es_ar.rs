//! Argentina: Rioplatense Spanish tables, CUIL identifiers, Latin OCR rules.

use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

use super::{
    AgeFormat, Concept, ContradictionTemplates, DocType, Facility, FallbackStrings, IdType, LabTest,
    LocaleData, LocaleProvider, PatientSketch, scripts,
};
use crate::distort::ContradictionDirective;
use crate::model::{Gender, Patient, PersonName};

const MALE_FIRST_NAMES: &[&str] = &[
    "Juan", "Martín", "Santiago", "Mateo", "Nicolás", "Agustín", "Tomás", "Lautaro", "Facundo",
    "Gonzalo", "Sebastián", "Federico", "Lucas", "Ignacio", "Joaquín", "Franco", "Maximiliano",
    "Rodrigo", "Ezequiel", "Patricio", "Diego", "Hernán", "Damián", "Leandro",
];

const FEMALE_FIRST_NAMES: &[&str] = &[
    "Sofía", "Valentina", "Camila", "Lucía", "Martina", "Agustina", "Florencia", "Milagros",
    "Rocío", "Celeste", "Julieta", "Carolina", "Micaela", "Candela", "Pilar", "Romina", "Victoria",
    "Belén", "Antonella", "Sol", "Aldana", "Macarena", "Josefina", "Abril",
];

const PATERNAL_SURNAMES: &[&str] = &[
    "González", "Rodríguez", "García", "Fernández", "López", "Martínez", "Pérez", "Gómez",
    "Sánchez", "Romero", "Díaz", "Torres", "Álvarez", "Ruiz", "Ramírez", "Flores", "Acosta",
    "Benítez", "Medina", "Herrera", "Suárez", "Aguirre", "Ríos", "Castro",
];

const MATERNAL_SURNAMES: &[&str] = &[
    "Morales", "Gutiérrez", "Rojas", "Cabrera", "Molina", "Ortiz", "Silva", "Pereyra", "Giménez",
    "Domínguez", "Figueroa", "Córdoba", "Lucero", "Ojeda", "Muñoz", "Paz", "Peralta", "Ferreyra",
    "Bustos", "Ledesma", "Godoy", "Villalba", "Sosa", "Quiroga",
];

/// Share of names that carry the maternal surname too.
const MATERNAL_SURNAME_RATE: f64 = 0.3;

const CUIL_WEIGHTS: [u32; 10] = [5, 4, 3, 2, 7, 6, 5, 4, 3, 2];
const DNI_RANGE: std::ops::RangeInclusive<u32> = 5_000_000..=95_000_000;

static FACILITIES: [Facility; 4] = [
    Facility {
        id: "plata",
        name: "Hospital Provincial de La Plata",
        doc_types: &[DocType::Discharge, DocType::Lab, DocType::Visit, DocType::Referral],
        ocr_doc_types: &[],
        id_type: IdType::String,
        age_format: AgeFormat::Years,
        date_format: "%d/%m/%Y",
        fields: &[
            (Concept::PatientId, "cuil"),
            (Concept::PatientName, "apellido_y_nombre"),
            (Concept::Age, "edad"),
            (Concept::Gender, "sexo"),
            (Concept::Date, "fecha"),
            (Concept::Facility, "institucion"),
            (Concept::Address, "domicilio"),
            (Concept::Smoking, "tabaquista"),
            (Concept::BloodType, "grupo_y_factor"),
            (Concept::Conditions, "antecedentes_patologicos"),
            (Concept::Medications, "medicacion_habitual"),
            (Concept::Icd10, "cie10"),
            (Concept::FreeText, "epicrisis"),
            (Concept::Department, "servicio"),
            (Concept::Diagnosis, "diagnostico"),
            (Concept::ReferralTo, "interconsulta_a"),
            (Concept::ReferralReason, "motivo_interconsulta"),
            (Concept::Urgency, "prioridad"),
            (Concept::LabTestName, "determinacion"),
            (Concept::LabValue, "resultado"),
            (Concept::LabUnit, "unidad"),
            (Concept::LabReference, "valor_referencia"),
            (Concept::LabFlag, "alerta"),
        ],
        style: "Estilo detallado y profesional. Informes extensos con estructura clara: antecedentes, evolución, resumen y recomendaciones al alta.",
    },
    Facility {
        id: "san_martin",
        name: "Sanatorio San Martín",
        doc_types: &[DocType::Discharge, DocType::Visit, DocType::Referral],
        ocr_doc_types: &[DocType::Discharge, DocType::Visit],
        id_type: IdType::String,
        age_format: AgeFormat::Years,
        date_format: "%d-%m-%Y",
        fields: &[
            (Concept::PatientId, "nro_cuil"),
            (Concept::PatientName, "paciente"),
            (Concept::Age, "edad_paciente"),
            (Concept::Gender, "genero"),
            (Concept::Date, "fecha_atencion"),
            (Concept::Facility, "sanatorio"),
            (Concept::Address, "direccion"),
            (Concept::Smoking, "fuma"),
            (Concept::Conditions, "antecedentes"),
            (Concept::Medications, "medicacion"),
            (Concept::FreeText, "evolucion"),
            (Concept::Department, "sector"),
            (Concept::Diagnosis, "diagnostico_presuntivo"),
            (Concept::ReferralTo, "derivado_a"),
            (Concept::ReferralReason, "motivo_derivacion"),
            (Concept::Urgency, "urgencia"),
        ],
        style: "Estilo medio. Uso de abreviaturas médicas habituales (HTA, DBT, FA). Estructura semi-formal con párrafos breves.",
    },
    Facility {
        id: "austral",
        name: "Laboratorio Austral",
        doc_types: &[DocType::Lab],
        ocr_doc_types: &[DocType::Lab],
        id_type: IdType::String,
        age_format: AgeFormat::Range,
        date_format: "%Y-%m-%d",
        fields: &[
            (Concept::PatientId, "id_paciente"),
            (Concept::PatientName, "nombre"),
            (Concept::Age, "franja_etaria"),
            (Concept::Gender, "sexo"),
            (Concept::Date, "fecha_extraccion"),
            (Concept::Facility, "sede"),
            (Concept::FreeText, "observaciones"),
            (Concept::LabTestName, "analisis"),
            (Concept::LabValue, "valor"),
            (Concept::LabUnit, "unidades"),
            (Concept::LabReference, "rango"),
            (Concept::LabFlag, "marca"),
        ],
        style: "Estilo muy conciso. Solo notas breves para resultados de laboratorio. 1-2 oraciones.",
    },
    Facility {
        id: "caps",
        name: "CAPS Barrio Norte",
        doc_types: &[DocType::Visit, DocType::Referral],
        ocr_doc_types: &[],
        id_type: IdType::String,
        age_format: AgeFormat::Years,
        date_format: "%d/%m/%y",
        fields: &[
            (Concept::PatientId, "documento"),
            (Concept::PatientName, "nombre_paciente"),
            (Concept::Age, "anios"),
            (Concept::Gender, "sexo"),
            (Concept::Date, "fecha_consulta"),
            (Concept::Facility, "centro"),
            (Concept::Address, "barrio_domicilio"),
            (Concept::Smoking, "tabaco"),
            (Concept::Occupation, "ocupacion"),
            (Concept::Conditions, "problemas"),
            (Concept::Medications, "medicamentos"),
            (Concept::FreeText, "nota"),
            (Concept::Department, "consultorio"),
            (Concept::Diagnosis, "impresion_diagnostica"),
            (Concept::ReferralTo, "derivacion"),
            (Concept::ReferralReason, "motivo"),
            (Concept::Urgency, "prioridad"),
        ],
        style: "Estilo corto y directo. Registro clínico mínimo. Muchas abreviaturas. Sin estructura uniforme.",
    },
];

static LAB_TESTS: [LabTest; 16] = [
    LabTest::whole("glucosa", "mg/dL", (70.0, 100.0), (101.0, 400.0)),
    LabTest::decimal("hemoglobina", "g/dL", (12.0, 17.5), (6.0, 11.9)),
    LabTest::decimal("HbA1c", "%", (4.0, 5.6), (5.7, 14.0)),
    LabTest::decimal("creatinina", "mg/dL", (0.7, 1.3), (1.4, 8.0)),
    LabTest::whole("colesterol total", "mg/dL", (0.0, 200.0), (201.0, 350.0)),
    LabTest::whole("LDL", "mg/dL", (0.0, 100.0), (101.0, 250.0)),
    LabTest::whole("HDL", "mg/dL", (40.0, 100.0), (10.0, 39.0)),
    LabTest::whole("triglicéridos", "mg/dL", (0.0, 150.0), (151.0, 500.0)),
    LabTest::decimal("TSH", "mIU/L", (0.4, 4.0), (0.01, 0.39)),
    LabTest::whole("sodio", "mEq/L", (136.0, 145.0), (120.0, 135.0)),
    LabTest::decimal("potasio", "mEq/L", (3.5, 5.0), (2.5, 3.4)),
    LabTest::decimal("WBC", "K/uL", (4.5, 11.0), (1.0, 4.4)),
    LabTest::whole("PLT", "K/uL", (150.0, 400.0), (50.0, 149.0)),
    LabTest::whole("ALT", "U/L", (7.0, 56.0), (57.0, 500.0)),
    LabTest::whole("AST", "U/L", (10.0, 40.0), (41.0, 400.0)),
    LabTest::whole("GFR", "mL/min", (90.0, 120.0), (15.0, 89.0)),
];

static DATA: LocaleData = LocaleData {
    code: "es_AR",
    language: "Spanish",
    country: "Argentina",
    cities: &[
        "Buenos Aires", "Córdoba", "Rosario", "Mendoza", "Tucumán", "La Plata", "Mar del Plata",
        "Salta", "Santa Fe", "San Juan", "Resistencia", "Corrientes", "Posadas", "Neuquén", "Formosa",
        "San Luis", "Santiago del Estero", "Paraná", "Bahía Blanca", "Río Gallegos",
    ],
    streets: &[
        "Avenida 9 de Julio", "Avenida Corrientes", "Calle Florida", "Avenida Santa Fe",
        "Calle Rivadavia", "Avenida de Mayo", "Avenida Libertador", "Calle San Martín",
        "Calle Belgrano", "Avenida Independencia", "Calle Lavalle", "Avenida Callao",
        "Calle Sarmiento", "Avenida Córdoba",
    ],
    occupations: &[
        "ingeniero", "médico", "docente", "abogado", "enfermero", "colectivero", "albañil",
        "empleado público", "policía", "comerciante", "contador", "farmacéutico", "técnico",
        "programador", "militar", "jubilado", "estudiante", "periodista", "chef", "trabajador rural",
    ],
    conditions: &[
        "diabetes tipo 2", "hipertensión arterial", "enfermedad coronaria", "EPOC", "asma",
        "insuficiencia renal crónica", "artritis", "obesidad", "depresión", "demencia",
        "osteoporosis", "anemia", "ACV", "insuficiencia cardíaca", "fibrilación auricular",
        "dislipidemia", "gota", "esteatosis hepática",
    ],
    medications: &[
        "metformina", "insulina", "aspirina", "amlodipino", "atorvastatina", "omeprazol", "ramipril",
        "metoprolol", "simvastatina", "losartán", "clopidogrel", "warfarina", "paroxetina",
        "diclofenaco", "ibuprofeno", "gabapentina", "alendronato", "levotiroxina",
        "hidroclorotiazida",
    ],
    departments: &[
        "clínica médica", "cardiología", "neurología", "cirugía general", "traumatología",
        "neumonología", "urología", "gastroenterología", "nefrología", "endocrinología",
        "oncología", "geriatría", "guardia", "terapia intensiva",
    ],
    lab_tests: &LAB_TESTS,
    icd10_codes: &[
        ("diabetes tipo 2", "E11"),
        ("hipertensión arterial", "I10"),
        ("enfermedad coronaria", "I25"),
        ("EPOC", "J44"),
        ("asma", "J45"),
        ("insuficiencia renal crónica", "N18"),
        ("artritis", "M19"),
        ("obesidad", "E66"),
        ("depresión", "F32"),
        ("demencia", "F03"),
        ("osteoporosis", "M81"),
        ("anemia", "D64"),
        ("ACV", "I63"),
        ("insuficiencia cardíaca", "I50"),
        ("fibrilación auricular", "I48"),
        ("dislipidemia", "E78"),
        ("gota", "M10"),
        ("esteatosis hepática", "K76"),
    ],
    facilities: &FACILITIES,
    ocr_groups: &[],
    ocr_rules: scripts::LATIN,
    system_prompt: "Sos un médico argentino que escribe informes clínicos. Escribí en español rioplatense. No agregues explicaciones, solo el informe médico.",
    doc_type_contexts: &[
        (DocType::Discharge, "Epicrisis de internación. Incluye: motivo de internación, evolución, tratamientos, recomendaciones al alta."),
        (DocType::Lab, "Notas sobre resultados de laboratorio. Muy breve, interpretación clínica de los resultados."),
        (DocType::Visit, "Resumen de consulta ambulatoria. Motivo de consulta, examen físico, impresión diagnóstica, plan."),
        (DocType::Referral, "Interconsulta o derivación para evaluación/tratamiento. Antecedentes, motivo de derivación, urgencia."),
    ],
    medical_abbreviations: "HTA (hipertensión), DBT (diabetes), EPOC, IAM (infarto), IC (insuficiencia cardíaca), FA (fibrilación auricular), IRC (insuficiencia renal), TC (tomografía)",
    contradiction_templates: ContradictionTemplates {
        smoking_yes: "fumador de 20 años",
        smoking_no: "no fumador, niega tabaquismo",
        age: "paciente de {age} años",
        medication: "medicado con {med}",
    },
    fallback: FallbackStrings {
        no_conditions: "sin antecedentes patológicos de relevancia",
        no_medications: "sin medicación habitual",
        no_diagnosis: "sin diagnóstico",
        referral_default: "evaluación",
    },
    generic_location: "Argentina",
    urgency_values: &["programada", "preferente", "urgente"],
};

/// The es_AR locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argentina;

impl LocaleProvider for Argentina {
    fn data(&self) -> &'static LocaleData {
        &DATA
    }

    /// First name and paternal surname; some names add the maternal surname,
    /// which then becomes part of `last_name`.
    fn generate_name(&self, gender: Gender, rng: &mut dyn RngCore) -> PersonName {
        let firsts = match gender {
            Gender::Male => MALE_FIRST_NAMES,
            Gender::Female => FEMALE_FIRST_NAMES,
        };
        let first = firsts.choose(rng).copied().unwrap_or_default();
        let paternal = PATERNAL_SURNAMES.choose(rng).copied().unwrap_or_default();
        let last_name = if rng.random::<f64>() < MATERNAL_SURNAME_RATE {
            let maternal = MATERNAL_SURNAMES.choose(rng).copied().unwrap_or_default();
            format!("{paternal} {maternal}")
        } else {
            paternal.to_string()
        };
        PersonName {
            first_name: first.to_string(),
            full_name: format!("{first} {last_name}"),
            last_name,
        }
    }

    fn emergency_contact_name(&self, rng: &mut dyn RngCore) -> String {
        let idx = rng.random_range(0..MALE_FIRST_NAMES.len() + FEMALE_FIRST_NAMES.len());
        let first = MALE_FIRST_NAMES
            .iter()
            .chain(FEMALE_FIRST_NAMES)
            .nth(idx)
            .copied()
            .unwrap_or_default();
        let paternal = PATERNAL_SURNAMES.choose(rng).copied().unwrap_or_default();
        format!("{first} {paternal}")
    }

    /// CUIL: sex prefix, eight-digit DNI and the mod-11 check digit.
    fn generate_id(&self, sketch: &PatientSketch<'_>, rng: &mut dyn RngCore) -> String {
        let prefix = match sketch.gender {
            Gender::Male => 20,
            Gender::Female => 27,
        };
        let dni: u32 = rng.random_range(DNI_RANGE);
        cuil(prefix, dni)
    }

    fn format_prompt(
        &self,
        patient: &Patient,
        facility: &Facility,
        doc_type: DocType,
        contradiction: Option<&ContradictionDirective>,
    ) -> String {
        let fallback = &DATA.fallback;
        let conditions = if patient.conditions.is_empty() {
            fallback.no_conditions.to_string()
        } else {
            patient.conditions.join(", ")
        };
        let medications = if patient.medications.is_empty() {
            fallback.no_medications.to_string()
        } else {
            patient.medications.join(", ")
        };
        let sex = match patient.gender {
            Gender::Male => "masculino",
            Gender::Female => "femenino",
        };

        let mut prompt = format!(
            "Escribí un texto clínico médico en español rioplatense para un documento de tipo: {}\n\nDatos del paciente:\n- Nombre: {}\n- Edad: {}\n- Sexo: {sex}\n- Antecedentes: {conditions}\n- Medicación: {medications}\n- Tabaquismo: {}\n\nEstilo del centro: {}\n\nInstrucciones:\n- Escribí 1-3 párrafos únicamente\n- Usá abreviaturas médicas habituales: {}\n- Agregá errores ortográficos leves (1-2) como un médico que escribe rápido\n- No agregues títulos ni formato especial, solo texto corrido",
            DATA.doc_type_context(doc_type),
            patient.full_name,
            patient.age,
            if patient.smoking { "sí" } else { "no" },
            facility.style,
            DATA.medical_abbreviations,
        );
        if let Some(directive) = contradiction {
            prompt.push_str(&format!(
                "\n\nImportante: en el texto, mencioná claramente que {}. Tiene que parecer natural como parte del informe médico.",
                directive.narrative_instruction
            ));
        }
        prompt.push_str(
            "\n- Si es pertinente, mencioná detalles adicionales que no aparecen en los datos estructurados (ej.: estado civil, alergias, detalles de anamnesis)",
        );
        prompt
    }
}

fn cuil_check(prefix: u32, dni: u32) -> u32 {
    let digits = format!("{prefix:02}{dni:08}");
    let total: u32 = digits
        .chars()
        .filter_map(|c| c.to_digit(10))
        .zip(CUIL_WEIGHTS)
        .map(|(d, w)| d * w)
        .sum();
    match total % 11 {
        0 => 0,
        1 if prefix == 20 => 9,
        1 => 4,
        rem => 11 - rem,
    }
}

fn cuil(prefix: u32, dni: u32) -> String {
    format!("{prefix:02}-{dni:08}-{}", cuil_check(prefix, dni))
}

/// `XX-DDDDDDDD-C` with a known sex prefix and a matching check digit.
pub fn is_valid_cuil(id: &str) -> bool {
    let parts: Vec<&str> = id.split('-').collect();
    let [prefix, dni, check] = parts[..] else {
        return false;
    };
    let all_digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(prefix, 2) || !all_digits(dni, 8) || !all_digits(check, 1) {
        return false;
    }
    let (Ok(prefix), Ok(dni), Ok(check)) = (prefix.parse::<u32>(), dni.parse::<u32>(), check.parse::<u32>()) else {
        return false;
    };
    matches!(prefix, 20 | 23 | 27) && cuil_check(prefix, dni) == check
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distort::ContradictionKind;
    use crate::testutil::{CountingRng, ScriptedRng, sample_patient};
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn cuil_check_digits() {
        // 2*5+0*4+1*3+2*2+3*7+4*6+5*5+6*4+7*3+8*2 = 148, 148 % 11 = 5
        assert_eq!(cuil(20, 12_345_678), "20-12345678-6");
        assert_eq!(cuil(27, 5_000_000), format!("27-05000000-{}", cuil_check(27, 5_000_000)));
        assert!(is_valid_cuil("20-12345678-6"));
        assert!(!is_valid_cuil("20-12345678-7"));
        assert!(!is_valid_cuil("21-12345678-6"));
        assert!(!is_valid_cuil("2012345678-6"));
        assert!(!is_valid_cuil("20-1234567-6"));
    }

    #[test]
    fn remainder_one_depends_on_prefix() {
        let dni = (DNI_RANGE)
            .find(|&dni| {
                let digits = format!("20{dni:08}");
                let total: u32 = digits.chars().filter_map(|c| c.to_digit(10)).zip(CUIL_WEIGHTS).map(|(d, w)| d * w).sum();
                total % 11 == 1
            })
            .unwrap();
        assert_eq!(cuil_check(20, dni), 9);
    }

    #[test]
    fn generated_ids_are_cuils_for_the_patient_sex() {
        let name = PersonName {
            first_name: "Sol".into(),
            last_name: "Paz".into(),
            full_name: "Sol Paz".into(),
        };
        let mut rng = CountingRng::seeded(12);
        for (gender, prefix) in [(Gender::Male, "20-"), (Gender::Female, "27-")] {
            let sketch = PatientSketch {
                name: &name,
                gender,
                date_of_birth: NaiveDate::from_ymd_opt(1988, 4, 2).unwrap(),
                city: "Rosario",
            };
            for _ in 0..50 {
                let id = Argentina.generate_id(&sketch, &mut rng);
                assert!(is_valid_cuil(&id), "{id}");
                assert!(id.starts_with(prefix), "{id}");
                let dni: u32 = id[3..11].parse().unwrap();
                assert!(DNI_RANGE.contains(&dni));
            }
        }
    }

    #[test]
    fn maternal_surname_is_occasional() {
        let mut rng = ScriptedRng::new(&[0.0, 0.0, 0.1, 0.0], 0.0);
        let name = Argentina.generate_name(Gender::Male, &mut rng);
        assert_eq!(name.last_name, "González Morales");
        assert_eq!(name.full_name, "Juan González Morales");
        assert_eq!(rng.consumed(), 4);

        let mut rng = ScriptedRng::new(&[0.0, 0.0, 0.5], 0.0);
        let name = Argentina.generate_name(Gender::Female, &mut rng);
        assert_eq!(name.first_name, "Sofía");
        assert_eq!(name.last_name, "González");
        assert_eq!(name.full_name, "Sofía González");
        assert_eq!(rng.consumed(), 3);
    }

    #[test]
    fn emergency_contact_has_one_surname() {
        let mut rng = ScriptedRng::new(&[0.99, 0.0], 0.0);
        assert_eq!(Argentina.emergency_contact_name(&mut rng), "Abril González");
    }

    #[test]
    fn prompt_uses_voseo() {
        let patient = sample_patient();
        let facility = DATA.facility("caps").unwrap();
        let plain = Argentina.format_prompt(&patient, facility, DocType::Referral, None);
        assert!(plain.starts_with("Escribí un texto clínico"));
        assert!(plain.contains("Interconsulta o derivación"));
        assert!(plain.contains("Sexo: femenino"));
        assert!(!plain.contains("Importante:"));

        let directive = ContradictionDirective {
            kind: ContradictionKind::Medication,
            structured_value: json!(["metformina"]),
            narrative_instruction: "medicado con insulina".into(),
        };
        let with = Argentina.format_prompt(&patient, facility, DocType::Referral, Some(&directive));
        assert!(with.contains("Importante: en el texto, mencioná claramente que medicado con insulina."));
    }
}
