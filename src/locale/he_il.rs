//! Israel: Hebrew-language tables, nine-digit national IDs, Hebrew OCR rules.

use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

use super::{
    AgeFormat, Concept, ContradictionTemplates, DocType, Facility, FallbackStrings, IdType, LabTest,
    LocaleData, LocaleProvider, PatientSketch, scripts,
};
use crate::distort::ContradictionDirective;
use crate::model::{Gender, Patient, PersonName};

const MALE_FIRST_NAMES: &[&str] = &[
    "יוסף", "משה", "דוד", "אברהם", "יעקב", "מוחמד", "אחמד", "חיים", "שלמה", "דניאל", "עומר", "איתי",
    "נועם", "אריאל", "יונתן", "אלון", "רון", "גיל", "עידו", "תומר", "אורי", "מתן", "ליאם", "אדם",
];

const FEMALE_FIRST_NAMES: &[&str] = &[
    "שרה", "רחל", "לאה", "מרים", "חנה", "פאטמה", "נועה", "יעל", "תמר", "שירה", "מאיה", "ליאן",
    "אמילי", "הילה", "דנה", "רותם", "עדי", "אורלי", "מיכל", "ענת", "סיגל", "גלית", "אפרת", "ורד",
];

const LAST_NAMES: &[&str] = &[
    "כהן", "לוי", "מזרחי", "פרץ", "ביטון", "דהן", "אברהם", "פרידמן", "שלום", "מלכה", "אזולאי", "חדד",
    "יוסף", "דוד", "גולן", "בן דוד", "עמר", "שמעוני", "אלון", "רוזנברג", "ברק", "חיון", "סויסה",
    "אוחנה",
];

static FACILITIES: [Facility; 4] = [
    Facility {
        id: "alon",
        name: "מרכז רפואי אלון",
        doc_types: &[DocType::Discharge, DocType::Lab, DocType::Visit, DocType::Referral],
        ocr_doc_types: &[],
        id_type: IdType::Int,
        age_format: AgeFormat::Years,
        date_format: "%Y-%m-%d",
        // Lab result keys fall back to the generic names.
        fields: &[
            (Concept::PatientId, "patient_id"),
            (Concept::PatientName, "patient_name"),
            (Concept::Age, "patient_age"),
            (Concept::Gender, "gender"),
            (Concept::Date, "document_date"),
            (Concept::Facility, "facility_name"),
            (Concept::Address, "address"),
            (Concept::Smoking, "smoker"),
            (Concept::BloodType, "blood_type"),
            (Concept::Occupation, "occupation"),
            (Concept::Conditions, "diagnoses"),
            (Concept::Medications, "medications"),
            (Concept::Icd10, "icd10_codes"),
            (Concept::FreeText, "clinical_notes"),
            (Concept::Department, "department"),
            (Concept::Diagnosis, "primary_diagnosis"),
            (Concept::ReferralTo, "referred_to"),
            (Concept::ReferralReason, "referral_reason"),
            (Concept::Urgency, "urgency"),
        ],
        style: "סגנון מפורט ומקצועי. סיכומים ארוכים עם מבנה ברור: רקע, מהלך, סיכום והמלצות.",
    },
    Facility {
        id: "hadarim",
        name: "בית חולים הדרים",
        doc_types: &[DocType::Discharge, DocType::Visit, DocType::Referral],
        ocr_doc_types: &[DocType::Discharge, DocType::Visit],
        id_type: IdType::String,
        age_format: AgeFormat::Years,
        date_format: "%d/%m/%Y",
        fields: &[
            (Concept::PatientId, "מספר_זהות"),
            (Concept::PatientName, "שם_מלא"),
            (Concept::Age, "גיל"),
            (Concept::Gender, "מין"),
            (Concept::Date, "תאריך"),
            (Concept::Facility, "מוסד"),
            (Concept::Address, "כתובת"),
            (Concept::Smoking, "מעשן"),
            (Concept::Conditions, "מחלות_רקע"),
            (Concept::Medications, "תרופות"),
            (Concept::FreeText, "סיכום"),
            (Concept::Department, "מחלקה"),
            (Concept::Diagnosis, "אבחנה"),
            (Concept::ReferralTo, "הופנה_אל"),
            (Concept::ReferralReason, "סיבת_הפניה"),
            (Concept::Urgency, "דחיפות"),
        ],
        style: "סגנון ממוצע. שימוש בקיצורים רפואיים נפוצים (ס.ד, ל.ד, ח.ד). מבנה חצי-פורמלי.",
    },
    Facility {
        id: "ofek",
        name: "מעבדות אופק",
        doc_types: &[DocType::Lab],
        ocr_doc_types: &[DocType::Lab],
        id_type: IdType::Float,
        age_format: AgeFormat::Years,
        date_format: "%d.%m.%Y",
        fields: &[
            (Concept::PatientId, "ID"),
            (Concept::PatientName, "Name"),
            (Concept::Age, "Age"),
            (Concept::Gender, "Sex"),
            (Concept::Date, "SampleDate"),
            (Concept::Facility, "Lab"),
            (Concept::FreeText, "Remarks"),
            (Concept::LabTestName, "Test"),
            (Concept::LabValue, "Value"),
            (Concept::LabUnit, "Unit"),
            (Concept::LabReference, "Range"),
            (Concept::LabFlag, "Flag"),
        ],
        style: "סגנון תמציתי מאוד. רק הערות קצרות לתוצאות מעבדה. 1-2 משפטים.",
    },
    Facility {
        id: "shaked",
        name: "מרפאת שקד",
        doc_types: &[DocType::Visit, DocType::Referral],
        ocr_doc_types: &[],
        id_type: IdType::String,
        age_format: AgeFormat::Range,
        date_format: "%d/%m/%y",
        fields: &[
            (Concept::PatientId, "tz"),
            (Concept::PatientName, "shem"),
            (Concept::Age, "age_group"),
            (Concept::Gender, "min"),
            (Concept::Date, "taarich"),
            (Concept::Facility, "mirpaa"),
            (Concept::Address, "ktovet"),
            (Concept::Smoking, "ishun"),
            (Concept::Occupation, "isuk"),
            (Concept::Medications, "trufot"),
            (Concept::Icd10, "icd"),
            (Concept::FreeText, "notes"),
            (Concept::Department, "tchum"),
            (Concept::Diagnosis, "roshem"),
            (Concept::ReferralTo, "hafnaya_le"),
            (Concept::ReferralReason, "siba"),
            (Concept::Urgency, "dchifut"),
        ],
        style: "סגנון קצר וישיר. רישום קליני מינימלי. קיצורים רבים. ללא מבנה אחיד.",
    },
];

static LAB_TESTS: [LabTest; 16] = [
    LabTest::whole("גלוקוז", "mg/dL", (70.0, 100.0), (101.0, 400.0)),
    LabTest::decimal("המוגלובין", "g/dL", (12.0, 17.5), (6.0, 11.9)),
    LabTest::decimal("HbA1c", "%", (4.0, 5.6), (5.7, 14.0)),
    LabTest::decimal("קריאטינין", "mg/dL", (0.7, 1.3), (1.4, 8.0)),
    LabTest::whole("כולסטרול כללי", "mg/dL", (0.0, 200.0), (201.0, 350.0)),
    LabTest::whole("LDL", "mg/dL", (0.0, 100.0), (101.0, 250.0)),
    LabTest::whole("HDL", "mg/dL", (40.0, 100.0), (10.0, 39.0)),
    LabTest::whole("טריגליצרידים", "mg/dL", (0.0, 150.0), (151.0, 500.0)),
    LabTest::decimal("TSH", "mIU/L", (0.4, 4.0), (0.01, 0.39)),
    LabTest::whole("סודיום", "mEq/L", (136.0, 145.0), (120.0, 135.0)),
    LabTest::decimal("אשלגן", "mEq/L", (3.5, 5.0), (2.5, 3.4)),
    LabTest::decimal("WBC", "K/uL", (4.5, 11.0), (1.0, 4.4)),
    LabTest::whole("PLT", "K/uL", (150.0, 400.0), (50.0, 149.0)),
    LabTest::whole("ALT", "U/L", (7.0, 56.0), (57.0, 500.0)),
    LabTest::whole("AST", "U/L", (10.0, 40.0), (41.0, 400.0)),
    LabTest::whole("GFR", "mL/min", (90.0, 120.0), (15.0, 89.0)),
];

static DATA: LocaleData = LocaleData {
    code: "he_IL",
    language: "Hebrew",
    country: "Israel",
    cities: &[
        "תל אביב", "ירושלים", "חיפה", "באר שבע", "ראשון לציון", "פתח תקווה", "אשדוד", "נתניה", "חולון",
        "בני ברק", "רמת גן", "אשקלון", "בת ים", "הרצליה", "כפר סבא", "רעננה", "לוד", "רמלה", "עכו",
        "נצרת", "טבריה", "צפת", "קריית שמונה", "דימונה", "אילת",
    ],
    streets: &[
        "הרצל", "בן גוריון", "ז'בוטינסקי", "רוטשילד", "אלנבי", "דיזנגוף", "בלפור", "ויצמן", "סוקולוב",
        "ביאליק", "שדרות ירושלים", "שדרות העצמאות", "דרך השלום", "רחוב הנביאים",
    ],
    occupations: &[
        "מהנדס", "מורה", "אחות", "רופא", "עורך דין", "חשבונאי", "נהג", "קבלן", "פועל בניין", "מזכירה",
        "עובד סוציאלי", "שוטר", "חייל", "סטודנט", "גמלאי", "עקרת בית", "מתכנת", "טכנאי", "צלם",
        "עיתונאי", "שף",
    ],
    conditions: &[
        "סוכרת סוג 2", "יתר לחץ דם", "מחלת לב כלילית", "COPD", "אסתמה", "אי ספיקת כליות כרונית",
        "דלקת מפרקים", "השמנת יתר", "דיכאון", "דמנציה", "אוסטאופורוזיס", "אנמיה", "שבץ מוחי",
        "אי ספיקת לב", "פרפור פרוזדורים", "היפרליפידמיה", "גאוט", "מחלת כבד שומני",
    ],
    medications: &[
        "מטפורמין", "אינסולין", "אספירין", "אמלודיפין", "אטורבסטטין", "אומפרזול", "רמיפריל",
        "מטופרולול", "סימבסטטין", "לוסרטן", "קלופידוגרל", "וורפרין", "פרוקסטין", "דיקלופנק",
        "איבופרופן", "גבפנטין", "אלנדרונט", "לבותירוקסין", "הידרוכלורותיאזיד",
    ],
    departments: &[
        "פנימית א", "פנימית ב", "קרדיולוגיה", "נוירולוגיה", "כירורגיה כללית", "אורתופדיה", "ריאות",
        "אורולוגיה", "גסטרואנטרולוגיה", "נפרולוגיה", "אנדוקרינולוגיה", "אונקולוגיה", "גריאטריה",
        "מיון",
    ],
    lab_tests: &LAB_TESTS,
    icd10_codes: &[
        ("סוכרת סוג 2", "E11"),
        ("יתר לחץ דם", "I10"),
        ("מחלת לב כלילית", "I25"),
        ("COPD", "J44"),
        ("אסתמה", "J45"),
        ("אי ספיקת כליות כרונית", "N18"),
        ("דלקת מפרקים", "M19"),
        ("השמנת יתר", "E66"),
        ("דיכאון", "F32"),
        ("דמנציה", "F03"),
        ("אוסטאופורוזיס", "M81"),
        ("אנמיה", "D64"),
        ("שבץ מוחי", "I63"),
        ("אי ספיקת לב", "I50"),
        ("פרפור פרוזדורים", "I48"),
        ("היפרליפידמיה", "E78"),
        ("גאוט", "M10"),
        ("מחלת כבד שומני", "K76"),
    ],
    facilities: &FACILITIES,
    ocr_groups: &[],
    ocr_rules: scripts::HEBREW,
    system_prompt: "אתה רופא ישראלי שכותב סיכומים רפואיים. כתוב בעברית בלבד. אל תוסיף הסברים או מטא-טקסט, רק את הסיכום הרפואי עצמו.",
    doc_type_contexts: &[
        (DocType::Discharge, "סיכום שחרור מאשפוז. כולל: סיבת אשפוז, מהלך, טיפולים, המלצות לקהילה."),
        (DocType::Lab, "הערות לתוצאות מעבדה. קצר מאוד, פרשנות קלינית של התוצאות."),
        (DocType::Visit, "סיכום ביקור מרפאה. תלונה עיקרית, בדיקה, רושם, תוכנית."),
        (DocType::Referral, "מכתב הפניה לייעוץ/טיפול. רקע, סיבת ההפניה, דחיפות."),
    ],
    medical_abbreviations: "ס.ד (סוכרת), ל.ד (לחץ דם), ח.ד (חדר), טל\"ד (טונוס לחץ דם), צנ\"ל (צנתור לב), א.ק.ג (אלקטרוקרדיוגרמה)",
    contradiction_templates: ContradictionTemplates {
        smoking_yes: "מעשן 20 שנה",
        smoking_no: "לא מעשן, מעולם לא עישן",
        age: "בן {age}",
        medication: "נוטל {med} באופן קבוע",
    },
    fallback: FallbackStrings {
        no_conditions: "ללא מחלות רקע ידועות",
        no_medications: "ללא תרופות קבועות",
        no_diagnosis: "ללא",
        referral_default: "בירור",
    },
    generic_location: "ישראל",
    urgency_values: &["רגיל", "דחוף", "דחוף מאוד"],
};

/// The he_IL locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct Israel;

impl LocaleProvider for Israel {
    fn data(&self) -> &'static LocaleData {
        &DATA
    }

    fn generate_name(&self, gender: Gender, rng: &mut dyn RngCore) -> PersonName {
        let firsts = match gender {
            Gender::Male => MALE_FIRST_NAMES,
            Gender::Female => FEMALE_FIRST_NAMES,
        };
        let first = firsts.choose(rng).copied().unwrap_or_default();
        let last = LAST_NAMES.choose(rng).copied().unwrap_or_default();
        PersonName {
            first_name: first.to_string(),
            last_name: last.to_string(),
            full_name: format!("{first} {last}"),
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
        let last = LAST_NAMES.choose(rng).copied().unwrap_or_default();
        format!("{first} {last}")
    }

    /// Eight random digits followed by a check digit.
    fn generate_id(&self, _sketch: &PatientSketch<'_>, rng: &mut dyn RngCore) -> String {
        let mut digits = [0u32; 9];
        for digit in digits.iter_mut().take(8) {
            *digit = rng.random_range(0..=9);
        }
        digits[8] = check_digit(&digits[..8]);
        digits.iter().filter_map(|d| char::from_digit(*d, 10)).collect()
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
            Gender::Male => "זכר",
            Gender::Female => "נקבה",
        };
        let smoking = if patient.smoking { "כן" } else { "לא" };

        let mut prompt = format!(
            "כתוב טקסט קליני רפואי בעברית עבור מסמך מסוג: {}\n\nפרטי המטופל:\n- שם: {}\n- גיל: {}\n- מין: {sex}\n- מחלות רקע: {conditions}\n- תרופות: {medications}\n- עישון: {smoking}\n\nסגנון המוסד: {}\n\nהנחיות:\n- כתוב 1-3 פסקאות בלבד\n- השתמש בקיצורים רפואיים מקובלים: {}\n- הוסף שגיאות כתיב קלות (1-2) כמו רופא שכותב מהר\n- אל תוסיף כותרות או פורמט מיוחד, רק טקסט רץ",
            DATA.doc_type_context(doc_type),
            patient.full_name,
            patient.age,
            facility.style,
            DATA.medical_abbreviations,
        );
        if let Some(directive) = contradiction {
            prompt.push_str(&format!(
                "\n\nחשוב: בטקסט, הזכר בצורה ברורה ש{}. זה צריך להיראות טבעי כחלק מהסיכום הרפואי.",
                directive.narrative_instruction
            ));
        }
        prompt.push_str("\n- אם מתאים, הזכר פרטים נוספים שלא מופיעים בנתונים המובנים (למשל: מצב משפחתי, אלרגיות, פרטי אנמנזה)");
        prompt
    }
}

/// Luhn-style check digit: odd positions doubled, digit sums added.
fn check_digit(digits: &[u32]) -> u32 {
    let total: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let v = d * (1 + (i as u32 % 2));
            v / 10 + v % 10
        })
        .sum();
    (10 - total % 10) % 10
}

/// Whether a nine-digit string carries a valid check digit.
pub fn is_valid_id(id: &str) -> bool {
    let digits: Vec<u32> = id.chars().filter_map(|c| c.to_digit(10)).collect();
    digits.len() == 9 && id.chars().count() == 9 && check_digit(&digits[..8]) == digits[8]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{CountingRng, ScriptedRng};
    use chrono::NaiveDate;

    #[test]
    fn known_ids_validate() {
        assert!(is_valid_id("000000018"));
        assert!(is_valid_id("123456782"));
        assert!(!is_valid_id("123456789"));
        assert!(!is_valid_id("12345678"));
    }

    #[test]
    fn generated_ids_are_valid() {
        let name = PersonName {
            first_name: "נועה".into(),
            last_name: "כהן".into(),
            full_name: "נועה כהן".into(),
        };
        let sketch = PatientSketch {
            name: &name,
            gender: Gender::Female,
            date_of_birth: NaiveDate::from_ymd_opt(1975, 3, 2).unwrap(),
            city: "חיפה",
        };
        let mut rng = CountingRng::seeded(3);
        for _ in 0..100 {
            let id = Israel.generate_id(&sketch, &mut rng);
            assert!(is_valid_id(&id), "{id}");
        }
    }

    #[test]
    fn id_consumes_eight_draws() {
        let name = PersonName {
            first_name: "a".into(),
            last_name: "b".into(),
            full_name: "a b".into(),
        };
        let sketch = PatientSketch {
            name: &name,
            gender: Gender::Male,
            date_of_birth: NaiveDate::from_ymd_opt(1975, 3, 2).unwrap(),
            city: "x",
        };
        let mut rng = ScriptedRng::constant(0.0);
        assert_eq!(Israel.generate_id(&sketch, &mut rng), "000000000");
        assert_eq!(rng.consumed(), 8);
    }

    #[test]
    fn names_are_first_and_last() {
        let mut rng = ScriptedRng::constant(0.0);
        let name = Israel.generate_name(Gender::Female, &mut rng);
        assert_eq!(name.full_name, "שרה כהן");
        assert_eq!(name.last_name, "כהן");
    }

    #[test]
    fn prompt_mentions_hebrew_context() {
        let mut patient = crate::testutil::sample_patient();
        patient.conditions.clear();
        let facility = DATA.facility("shaked").unwrap();
        let prompt = Israel.format_prompt(&patient, facility, DocType::Visit, None);
        assert!(prompt.contains("סיכום ביקור מרפאה"));
        assert!(prompt.contains("ללא מחלות רקע ידועות"));
        assert!(prompt.contains(facility.style));
    }
}
