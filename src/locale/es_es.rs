//! Spain: Spanish-language tables, DNI identifiers, Latin OCR rules.

use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

use super::{
    AgeFormat, Concept, ContradictionTemplates, DocType, Facility, FallbackStrings, IdType, LabTest,
    LocaleData, LocaleProvider, PatientSketch, scripts,
};
use crate::distort::ContradictionDirective;
use crate::model::{Gender, Patient, PersonName};

const MALE_FIRST_NAMES: &[&str] = &[
    "Carlos", "Miguel", "José", "Antonio", "Francisco", "David", "Juan", "Manuel", "Pedro", "Javier",
    "Daniel", "Rafael", "Fernando", "Alejandro", "Pablo", "Sergio", "Andrés", "Marcos", "Álvaro",
    "Adrián", "Diego", "Raúl", "Óscar", "Jorge",
];

const FEMALE_FIRST_NAMES: &[&str] = &[
    "María", "Carmen", "Ana", "Isabel", "Laura", "Lucía", "Marta", "Elena", "Cristina", "Sara",
    "Paula", "Andrea", "Pilar", "Rosa", "Teresa", "Sofía", "Beatriz", "Raquel", "Inés", "Nuria",
    "Silvia", "Alba", "Eva", "Patricia",
];

const PATERNAL_SURNAMES: &[&str] = &[
    "García", "Rodríguez", "Martínez", "López", "González", "Hernández", "Pérez", "Sánchez",
    "Romero", "Torres", "Díaz", "Ruiz", "Moreno", "Jiménez", "Álvarez", "Muñoz", "Domínguez",
    "Vázquez", "Castro", "Ortega", "Ramos", "Marín", "Iglesias", "Navarro",
];

const MATERNAL_SURNAMES: &[&str] = &[
    "Fernández", "Gutiérrez", "Serrano", "Blanco", "Molina", "Morales", "Suárez", "Ortiz",
    "Delgado", "Rubio", "Medina", "Herrero", "Caballero", "Calvo", "León", "Prieto", "Reyes",
    "Fuentes", "Aguilar", "Gil", "Pascual", "Carrasco", "Guerrero", "Santos",
];

const DNI_LETTERS: &[u8; 23] = b"TRWAGMYFPDXBNJZSQVHLCKE";

const LAB_FIELDS: [(Concept, &str); 5] = [
    (Concept::LabTestName, "prueba"),
    (Concept::LabValue, "resultado"),
    (Concept::LabUnit, "unidad"),
    (Concept::LabReference, "valores_referencia"),
    (Concept::LabFlag, "indicador"),
];

static FACILITIES: [Facility; 4] = [
    Facility {
        id: "reina",
        name: "Hospital Universitario Reina Victoria",
        doc_types: &[DocType::Discharge, DocType::Lab, DocType::Visit, DocType::Referral],
        ocr_doc_types: &[],
        id_type: IdType::String,
        age_format: AgeFormat::Years,
        date_format: "%d/%m/%Y",
        fields: &[
            (Concept::PatientId, "dni"),
            (Concept::PatientName, "nombre_completo"),
            (Concept::Age, "edad"),
            (Concept::Gender, "sexo"),
            (Concept::Date, "fecha"),
            (Concept::Facility, "centro"),
            (Concept::Address, "domicilio"),
            (Concept::Smoking, "fumador"),
            (Concept::BloodType, "grupo_sanguineo"),
            (Concept::Conditions, "antecedentes"),
            (Concept::Medications, "tratamiento_habitual"),
            (Concept::Icd10, "codigos_cie10"),
            (Concept::FreeText, "informe_clinico"),
            (Concept::Department, "servicio"),
            (Concept::Diagnosis, "diagnostico_principal"),
            (Concept::ReferralTo, "derivado_a"),
            (Concept::ReferralReason, "motivo_derivacion"),
            (Concept::Urgency, "prioridad"),
            LAB_FIELDS[0],
            LAB_FIELDS[1],
            LAB_FIELDS[2],
            LAB_FIELDS[3],
            LAB_FIELDS[4],
        ],
        style: "Estilo detallado y profesional. Informes extensos con estructura clara: antecedentes, evolución, resumen y recomendaciones al alta.",
    },
    Facility {
        id: "san_rafael",
        name: "Clínica San Rafael",
        doc_types: &[DocType::Discharge, DocType::Visit, DocType::Referral],
        ocr_doc_types: &[DocType::Discharge, DocType::Visit],
        id_type: IdType::String,
        age_format: AgeFormat::Years,
        date_format: "%d-%m-%Y",
        fields: &[
            (Concept::PatientId, "num_documento"),
            (Concept::PatientName, "paciente"),
            (Concept::Age, "edad_paciente"),
            (Concept::Gender, "genero"),
            (Concept::Date, "fecha_documento"),
            (Concept::Facility, "hospital"),
            (Concept::Address, "direccion"),
            (Concept::Smoking, "tabaquismo"),
            (Concept::Conditions, "diagnosticos"),
            (Concept::Medications, "medicacion"),
            (Concept::Icd10, "cie10"),
            (Concept::FreeText, "notas_clinicas"),
            (Concept::Department, "unidad"),
            (Concept::Diagnosis, "juicio_clinico"),
            (Concept::ReferralTo, "especialidad_destino"),
            (Concept::ReferralReason, "motivo"),
            (Concept::Urgency, "urgencia"),
        ],
        style: "Estilo medio. Uso de abreviaturas médicas habituales (HTA, DM, FA). Estructura semi-formal con párrafos breves.",
    },
    Facility {
        id: "iberia",
        name: "Laboratorios Iberia",
        doc_types: &[DocType::Lab],
        ocr_doc_types: &[DocType::Lab],
        id_type: IdType::String,
        age_format: AgeFormat::Range,
        date_format: "%Y-%m-%d",
        fields: &[
            (Concept::PatientId, "id_paciente"),
            (Concept::PatientName, "nombre"),
            (Concept::Age, "rango_edad"),
            (Concept::Gender, "sexo"),
            (Concept::Date, "fecha_muestra"),
            (Concept::Facility, "laboratorio"),
            (Concept::FreeText, "observaciones"),
            (Concept::LabTestName, "analito"),
            (Concept::LabValue, "valor"),
            (Concept::LabUnit, "unidades"),
            (Concept::LabReference, "rango_normal"),
            (Concept::LabFlag, "marca"),
        ],
        style: "Estilo muy conciso. Solo notas breves para resultados de laboratorio. 1-2 frases.",
    },
    Facility {
        id: "atencion",
        name: "Centro de Atención Primaria Los Olivos",
        doc_types: &[DocType::Visit, DocType::Referral],
        ocr_doc_types: &[],
        id_type: IdType::String,
        age_format: AgeFormat::Years,
        date_format: "%d/%m/%y",
        fields: &[
            (Concept::PatientId, "identificacion"),
            (Concept::PatientName, "nombre_paciente"),
            (Concept::Age, "anos"),
            (Concept::Gender, "sexo"),
            (Concept::Date, "fecha_visita"),
            (Concept::Facility, "centro_salud"),
            (Concept::Address, "direccion_paciente"),
            (Concept::Smoking, "fuma"),
            (Concept::Occupation, "ocupacion"),
            (Concept::Conditions, "problemas_activos"),
            (Concept::Medications, "medicamentos"),
            (Concept::FreeText, "nota"),
            (Concept::Department, "consulta"),
            (Concept::Diagnosis, "impresion_diagnostica"),
            (Concept::ReferralTo, "destino"),
            (Concept::ReferralReason, "motivo_consulta"),
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
    code: "es_ES",
    language: "Spanish",
    country: "Spain",
    cities: &[
        "Madrid", "Barcelona", "Valencia", "Sevilla", "Zaragoza", "Málaga", "Murcia", "Palma",
        "Bilbao", "Alicante", "Córdoba", "Valladolid", "Vigo", "Gijón", "Hospitalet de Llobregat",
        "Vitoria-Gasteiz", "Granada", "A Coruña", "Elche", "Oviedo",
    ],
    streets: &[
        "Calle Gran Vía", "Calle Mayor", "Paseo de la Castellana", "Avenida de la Constitución",
        "Calle Alcalá", "Rambla de Catalunya", "Calle Serrano", "Calle Princesa", "Avenida Diagonal",
        "Calle Arenal", "Paseo del Prado", "Calle Toledo", "Avenida de América", "Calle Velázquez",
    ],
    occupations: &[
        "ingeniero", "médico", "profesor", "abogado", "enfermero", "conductor", "albañil",
        "funcionario", "policía", "comerciante", "contable", "farmacéutico", "técnico",
        "programador", "militar", "jubilado", "estudiante", "periodista", "chef", "agricultor",
    ],
    conditions: &[
        "diabetes tipo 2", "hipertensión arterial", "enfermedad coronaria", "EPOC", "asma",
        "insuficiencia renal crónica", "artritis", "obesidad", "depresión", "demencia",
        "osteoporosis", "anemia", "ictus", "insuficiencia cardíaca", "fibrilación auricular",
        "hiperlipidemia", "gota", "enfermedad hepática grasa",
    ],
    medications: &[
        "metformina", "insulina", "aspirina", "amlodipino", "atorvastatina", "omeprazol", "ramipril",
        "metoprolol", "simvastatina", "losartán", "clopidogrel", "warfarina", "paroxetina",
        "diclofenaco", "ibuprofeno", "gabapentina", "alendronato", "levotiroxina",
        "hidroclorotiazida",
    ],
    departments: &[
        "medicina interna", "cardiología", "neurología", "cirugía general", "traumatología",
        "neumología", "urología", "digestivo", "nefrología", "endocrinología", "oncología",
        "geriatría", "urgencias", "UCI",
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
        ("ictus", "I63"),
        ("insuficiencia cardíaca", "I50"),
        ("fibrilación auricular", "I48"),
        ("hiperlipidemia", "E78"),
        ("gota", "M10"),
        ("enfermedad hepática grasa", "K76"),
    ],
    facilities: &FACILITIES,
    ocr_groups: &[],
    ocr_rules: scripts::LATIN,
    system_prompt: "Eres un médico español que redacta informes clínicos. Escribe en español. No añadas explicaciones ni texto adicional, solo el informe médico.",
    doc_type_contexts: &[
        (DocType::Discharge, "Informe de alta hospitalaria. Incluye: motivo de ingreso, evolución, tratamientos, recomendaciones al alta."),
        (DocType::Lab, "Notas sobre resultados de laboratorio. Muy breve, interpretación clínica de los resultados."),
        (DocType::Visit, "Resumen de consulta ambulatoria. Motivo de consulta, exploración, impresión diagnóstica, plan."),
        (DocType::Referral, "Carta de derivación para valoración/tratamiento. Antecedentes, motivo de derivación, urgencia."),
    ],
    medical_abbreviations: "HTA (hipertensión), DM (diabetes), EPOC, IAM (infarto agudo), ICC (insuficiencia cardíaca), FA (fibrilación auricular), IRC (insuficiencia renal), TAC (tomografía)",
    contradiction_templates: ContradictionTemplates {
        smoking_yes: "fumador de 20 años",
        smoking_no: "no fumador, nunca ha fumado",
        age: "paciente de {age} años",
        medication: "en tratamiento con {med}",
    },
    fallback: FallbackStrings {
        no_conditions: "sin antecedentes de interés",
        no_medications: "sin tratamiento habitual",
        no_diagnosis: "sin diagnóstico",
        referral_default: "estudio",
    },
    generic_location: "España",
    urgency_values: &["ordinaria", "preferente", "urgente"],
};

/// The es_ES locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spain;

impl Spain {
    fn patient_context(&self, patient: &Patient) -> String {
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
            Gender::Male => "hombre",
            Gender::Female => "mujer",
        };
        format!(
            "Datos del paciente:\n- Nombre: {}\n- Edad: {}\n- Sexo: {sex}\n- Antecedentes: {conditions}\n- Medicación: {medications}\n- Tabaquismo: {}",
            patient.full_name,
            patient.age,
            if patient.smoking { "sí" } else { "no" },
        )
    }
}

impl LocaleProvider for Spain {
    fn data(&self) -> &'static LocaleData {
        &DATA
    }

    /// First name plus paternal and maternal surnames. `last_name` holds the
    /// paternal surname only.
    fn generate_name(&self, gender: Gender, rng: &mut dyn RngCore) -> PersonName {
        let firsts = match gender {
            Gender::Male => MALE_FIRST_NAMES,
            Gender::Female => FEMALE_FIRST_NAMES,
        };
        let first = firsts.choose(rng).copied().unwrap_or_default();
        let paternal = PATERNAL_SURNAMES.choose(rng).copied().unwrap_or_default();
        let maternal = MATERNAL_SURNAMES.choose(rng).copied().unwrap_or_default();
        PersonName {
            first_name: first.to_string(),
            last_name: paternal.to_string(),
            full_name: format!("{first} {paternal} {maternal}"),
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
        let maternal = MATERNAL_SURNAMES.choose(rng).copied().unwrap_or_default();
        format!("{first} {paternal} {maternal}")
    }

    /// Eight digits and the mod-23 control letter.
    fn generate_id(&self, _sketch: &PatientSketch<'_>, rng: &mut dyn RngCore) -> String {
        let number: usize = rng.random_range(10_000_000..=99_999_999);
        dni(number)
    }

    fn format_prompt(
        &self,
        patient: &Patient,
        facility: &Facility,
        doc_type: DocType,
        contradiction: Option<&ContradictionDirective>,
    ) -> String {
        let mut prompt = format!(
            "Escribe un texto clínico médico en español para un documento de tipo: {}\n\n{}\n\nEstilo del centro: {}\n\nInstrucciones:\n- Escribe 1-3 párrafos únicamente\n- Usa abreviaturas médicas habituales: {}\n- Añade errores ortográficos leves (1-2) como un médico que escribe rápido\n- No añadas títulos ni formato especial, solo texto corrido",
            DATA.doc_type_context(doc_type),
            self.patient_context(patient),
            facility.style,
            DATA.medical_abbreviations,
        );
        if let Some(directive) = contradiction {
            prompt.push_str(&format!(
                "\n\nImportante: en el texto, menciona claramente que {}. Debe parecer natural como parte del informe médico.",
                directive.narrative_instruction
            ));
        }
        prompt.push_str(
            "\n- Si es pertinente, menciona detalles adicionales que no aparecen en los datos estructurados (p. ej.: estado civil, alergias, detalles de anamnesis)",
        );
        prompt
    }
}

fn dni(number: usize) -> String {
    let letter = DNI_LETTERS[number % 23] as char;
    format!("{number}{letter}")
}
