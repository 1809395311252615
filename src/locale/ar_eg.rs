//! Egypt: Arabic tables, 14-digit national IDs encoding birth date and sex,
//! Arabic dot-group OCR rules.

use chrono::{Datelike, NaiveDate};
use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

use super::{
    AgeFormat, Concept, ContradictionTemplates, DocType, Facility, FallbackStrings, IdType, LabTest,
    LocaleData, LocaleProvider, PatientSketch, scripts,
};
use crate::distort::ContradictionDirective;
use crate::model::{Gender, Patient, PersonName};

const MALE_GIVEN_NAMES: &[&str] = &[
    "محمد", "أحمد", "علي", "حسن", "إبراهيم", "عمر", "مصطفى", "خالد", "ياسر", "طارق", "محمود",
    "عبدالله", "كريم", "عمرو", "سامي", "هشام", "وائل", "شريف", "أشرف", "رامي", "حسام", "تامر",
    "مينا", "جورج",
];

const FEMALE_GIVEN_NAMES: &[&str] = &[
    "فاطمة", "نور", "سارة", "مريم", "ياسمين", "هبة", "إيمان", "دينا", "رنا", "سلمى", "هدى", "منى",
    "ليلى", "عبير", "نادية", "سمر", "غادة", "آية", "إسراء", "مروة", "داليا", "شيماء", "مارينا",
    "كريستين",
];

const FATHER_NAMES: &[&str] = &[
    "محمد", "أحمد", "علي", "حسن", "إبراهيم", "مصطفى", "عبدالله", "خالد", "محمود", "حسين", "عمر",
    "سعيد", "فؤاد", "رشدي", "جمال", "صلاح", "عادل", "ماهر", "سمير", "رمضان",
];

const FAMILY_NAMES: &[&str] = &[
    "الشريف", "المصري", "السيد", "حسن", "علي", "إبراهيم", "عبدالحميد", "الفقي", "الجندي", "البنا",
    "الشافعي", "المنشاوي", "عبدالرحمن", "الحسيني", "النجار", "الخولي", "الدسوقي", "البدري",
    "السباعي", "الطنطاوي", "العربي", "حبيب", "فرج", "مرسي",
];

const MALE_SEX_DIGITS: &[u32] = &[1, 3, 5, 7, 9];
const FEMALE_SEX_DIGITS: &[u32] = &[2, 4, 6, 8];

/// Highest governorate code in the national ID.
const MAX_GOVERNORATE: u32 = 35;

static FACILITIES: [Facility; 4] = [
    Facility {
        id: "nile",
        name: "مستشفى النيل الجامعي",
        doc_types: &[DocType::Discharge, DocType::Lab, DocType::Visit, DocType::Referral],
        ocr_doc_types: &[DocType::Discharge],
        id_type: IdType::String,
        age_format: AgeFormat::Years,
        date_format: "%d/%m/%Y",
        fields: &[
            (Concept::PatientId, "national_id"),
            (Concept::PatientName, "patient_name"),
            (Concept::Age, "age"),
            (Concept::Gender, "sex"),
            (Concept::Date, "report_date"),
            (Concept::Facility, "hospital"),
            (Concept::Address, "address"),
            (Concept::Smoking, "smoker"),
            (Concept::BloodType, "blood_group"),
            (Concept::Occupation, "occupation"),
            (Concept::Conditions, "chronic_diseases"),
            (Concept::Medications, "current_medications"),
            (Concept::Icd10, "icd10"),
            (Concept::FreeText, "clinical_report"),
            (Concept::Department, "department"),
            (Concept::Diagnosis, "final_diagnosis"),
            (Concept::ReferralTo, "referred_to"),
            (Concept::ReferralReason, "referral_reason"),
            (Concept::Urgency, "priority"),
            (Concept::LabTestName, "test"),
            (Concept::LabValue, "value"),
            (Concept::LabUnit, "unit"),
            (Concept::LabReference, "normal_range"),
            (Concept::LabFlag, "flag"),
        ],
        style: "أسلوب أكاديمي مفصل. تقارير طويلة بهيكل واضح: التاريخ المرضي، الفحص، التشخيص، الخطة العلاجية والتوصيات.",
    },
    Facility {
        id: "delta",
        name: "مستشفى الدلتا العام",
        doc_types: &[DocType::Discharge, DocType::Visit, DocType::Referral],
        ocr_doc_types: &[DocType::Discharge, DocType::Visit],
        id_type: IdType::Int,
        age_format: AgeFormat::Years,
        date_format: "%Y/%m/%d",
        fields: &[
            (Concept::PatientId, "الرقم_القومي"),
            (Concept::PatientName, "اسم_المريض"),
            (Concept::Age, "السن"),
            (Concept::Gender, "النوع"),
            (Concept::Date, "التاريخ"),
            (Concept::Facility, "المستشفى"),
            (Concept::Address, "العنوان"),
            (Concept::Smoking, "مدخن"),
            (Concept::Conditions, "الأمراض_المزمنة"),
            (Concept::Medications, "الأدوية"),
            (Concept::Icd10, "أكواد_التشخيص"),
            (Concept::FreeText, "ملخص"),
            (Concept::Department, "القسم"),
            (Concept::Diagnosis, "التشخيص"),
            (Concept::ReferralTo, "محول_إلى"),
            (Concept::ReferralReason, "سبب_التحويل"),
            (Concept::Urgency, "الأولوية"),
        ],
        style: "أسلوب متوسط بالعربية. استخدام اختصارات طبية شائعة. مبنى شبه رسمي مع تفاصيل سريرية كافية.",
    },
    Facility {
        id: "almokhtabar",
        name: "معامل المختبر",
        doc_types: &[DocType::Lab],
        ocr_doc_types: &[DocType::Lab],
        id_type: IdType::String,
        age_format: AgeFormat::Range,
        date_format: "%Y-%m-%d",
        fields: &[
            (Concept::PatientId, "patient_nid"),
            (Concept::PatientName, "name"),
            (Concept::Age, "age_band"),
            (Concept::Gender, "gender"),
            (Concept::Date, "collection_date"),
            (Concept::Facility, "lab_branch"),
            (Concept::FreeText, "comments"),
            (Concept::LabTestName, "analysis"),
            (Concept::LabValue, "result"),
            (Concept::LabUnit, "units"),
            (Concept::LabReference, "reference_range"),
            (Concept::LabFlag, "status"),
        ],
        style: "أسلوب مختصر جداً. ملاحظات قصيرة على نتائج المعمل فقط. جملة أو اثنتين.",
    },
    Facility {
        id: "tahrir",
        name: "عيادات التحرير",
        doc_types: &[DocType::Visit, DocType::Referral],
        ocr_doc_types: &[],
        id_type: IdType::String,
        age_format: AgeFormat::Years,
        date_format: "%d-%m-%y",
        fields: &[
            (Concept::PatientId, "raqam_qawmi"),
            (Concept::PatientName, "ism"),
            (Concept::Age, "sinn"),
            (Concept::Gender, "naw3"),
            (Concept::Date, "tarikh"),
            (Concept::Facility, "3eyada"),
            (Concept::Address, "3enwan"),
            (Concept::Smoking, "tadkhin"),
            (Concept::Occupation, "mehna"),
            (Concept::Conditions, "amrad"),
            (Concept::Medications, "adwiya"),
            (Concept::FreeText, "molahazat"),
            (Concept::Department, "takhassos"),
            (Concept::Diagnosis, "tashkhis"),
            (Concept::ReferralTo, "tahwil_ila"),
            (Concept::ReferralReason, "sabab_tahwil"),
            (Concept::Urgency, "awlawiya"),
        ],
        style: "أسلوب قصير ومباشر. تسجيل سريري مختصر. اختصارات كثيرة. بدون هيكل موحد.",
    },
];

static LAB_TESTS: [LabTest; 16] = [
    LabTest::whole("جلوكوز", "mg/dL", (70.0, 100.0), (101.0, 400.0)),
    LabTest::decimal("هيموغلوبين", "g/dL", (12.0, 17.5), (6.0, 11.9)),
    LabTest::decimal("HbA1c", "%", (4.0, 5.6), (5.7, 14.0)),
    LabTest::decimal("كرياتينين", "mg/dL", (0.7, 1.3), (1.4, 8.0)),
    LabTest::whole("كولسترول كلي", "mg/dL", (0.0, 200.0), (201.0, 350.0)),
    LabTest::whole("LDL", "mg/dL", (0.0, 100.0), (101.0, 250.0)),
    LabTest::whole("HDL", "mg/dL", (40.0, 100.0), (10.0, 39.0)),
    LabTest::whole("دهون ثلاثية", "mg/dL", (0.0, 150.0), (151.0, 500.0)),
    LabTest::decimal("TSH", "mIU/L", (0.4, 4.0), (0.01, 0.39)),
    LabTest::whole("صوديوم", "mEq/L", (136.0, 145.0), (120.0, 135.0)),
    LabTest::decimal("بوتاسيوم", "mEq/L", (3.5, 5.0), (2.5, 3.4)),
    LabTest::decimal("WBC", "K/uL", (4.5, 11.0), (1.0, 4.4)),
    LabTest::whole("PLT", "K/uL", (150.0, 400.0), (50.0, 149.0)),
    LabTest::whole("ALT", "U/L", (7.0, 56.0), (57.0, 500.0)),
    LabTest::whole("AST", "U/L", (10.0, 40.0), (41.0, 400.0)),
    LabTest::whole("GFR", "mL/min", (90.0, 120.0), (15.0, 89.0)),
];

static DATA: LocaleData = LocaleData {
    code: "ar_EG",
    language: "Arabic",
    country: "Egypt",
    cities: &[
        "القاهرة", "الإسكندرية", "الجيزة", "شبرا الخيمة", "بورسعيد", "السويس", "المنصورة", "طنطا",
        "الزقازيق", "أسيوط", "المنيا", "سوهاج", "الفيوم", "بني سويف", "دمياط", "الإسماعيلية",
        "أسوان", "الأقصر", "قنا", "كفر الشيخ",
    ],
    streets: &[
        "شارع التحرير", "شارع رمسيس", "شارع الهرم", "شارع فيصل", "كورنيش النيل", "شارع الجمهورية",
        "شارع مصطفى النحاس", "شارع عباس العقاد", "شارع جامعة الدول العربية", "طريق النصر",
        "شارع الثورة", "شارع بورسعيد", "شارع السودان", "شارع شبرا",
    ],
    occupations: &[
        "مهندس", "طبيب", "مدرس", "محاسب", "ممرض", "سائق", "عامل", "موظف حكومي", "ضابط شرطة",
        "تاجر", "محامي", "صيدلي", "فني", "مبرمج", "مجند", "متقاعد", "طالب", "صحفي", "مدير", "مزارع",
    ],
    conditions: &[
        "داء السكري النوع الثاني", "ارتفاع ضغط الدم", "مرض الشريان التاجي", "COPD", "الربو",
        "القصور الكلوي المزمن", "التهاب المفاصل", "السمنة", "الاكتئاب", "الخرف", "هشاشة العظام",
        "فقر الدم", "السكتة الدماغية", "قصور القلب", "الرجفان الأذيني", "فرط شحميات الدم",
        "النقرس", "مرض الكبد الدهني",
    ],
    medications: &[
        "ميتفورمين", "أنسولين", "أسبرين", "أملوديبين", "أتورفاستاتين", "أوميبرازول", "راميبريل",
        "ميتوبرولول", "سيمفاستاتين", "لوسارتان", "كلوبيدوغريل", "وارفارين", "باروكسيتين",
        "ديكلوفيناك", "إيبوبروفين", "غابابنتين", "أليندرونات", "ليفوثيروكسين", "هيدروكلوروثيازيد",
    ],
    departments: &[
        "الباطنة", "القلب", "الأعصاب", "الجراحة العامة", "العظام", "الصدر", "المسالك البولية",
        "الجهاز الهضمي", "الكلى", "الغدد الصماء", "الأورام", "الشيخوخة", "الطوارئ",
    ],
    lab_tests: &LAB_TESTS,
    icd10_codes: &[
        ("داء السكري النوع الثاني", "E11"),
        ("ارتفاع ضغط الدم", "I10"),
        ("مرض الشريان التاجي", "I25"),
        ("COPD", "J44"),
        ("الربو", "J45"),
        ("القصور الكلوي المزمن", "N18"),
        ("التهاب المفاصل", "M19"),
        ("السمنة", "E66"),
        ("الاكتئاب", "F32"),
        ("الخرف", "F03"),
        ("هشاشة العظام", "M81"),
        ("فقر الدم", "D64"),
        ("السكتة الدماغية", "I63"),
        ("قصور القلب", "I50"),
        ("الرجفان الأذيني", "I48"),
        ("فرط شحميات الدم", "E78"),
        ("النقرس", "M10"),
        ("مرض الكبد الدهني", "K76"),
    ],
    facilities: &FACILITIES,
    ocr_groups: scripts::ARABIC_GROUPS,
    ocr_rules: scripts::ARABIC,
    system_prompt: "أنت طبيب مصري تكتب تقارير طبية. اكتب بالعربية مع استخدام المصطلحات الطبية الإنجليزية عند الحاجة. لا تضف شروحات، فقط التقرير الطبي.",
    doc_type_contexts: &[
        (DocType::Discharge, "ملخص خروج من المستشفى. يشمل: سبب الدخول، المسار العلاجي، العلاجات، توصيات المتابعة."),
        (DocType::Lab, "ملاحظات على نتائج المعمل. مختصر جداً، تفسير سريري للنتائج."),
        (DocType::Visit, "ملخص زيارة العيادة. الشكوى الرئيسية، الفحص، الانطباع، الخطة."),
        (DocType::Referral, "خطاب إحالة للاستشارة/العلاج. الخلفية المرضية، سبب الإحالة، الأولوية."),
    ],
    medical_abbreviations: "DM (سكري), HTN (ضغط), IHD (قلب), CKD (كلى), COPD (انسداد رئوي), ECG (رسم قلب), CBC (صورة دم), LFT (وظائف كبد), KFT (وظائف كلى)",
    contradiction_templates: ContradictionTemplates {
        smoking_yes: "مدخن من 20 سنة",
        smoking_no: "مش بيدخن خالص",
        age: "عنده {age} سنة",
        medication: "بياخد {med} بانتظام",
    },
    fallback: FallbackStrings {
        no_conditions: "مفيش أمراض مزمنة",
        no_medications: "مش بياخد أدوية",
        no_diagnosis: "لا يوجد",
        referral_default: "للفحص",
    },
    generic_location: "مصر",
    urgency_values: &["عادي", "عاجل", "طارئ"],
};

/// The ar_EG locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct Egypt;

impl LocaleProvider for Egypt {
    fn data(&self) -> &'static LocaleData {
        &DATA
    }

    /// Given name, father's name and family name. `last_name` is the family
    /// name.
    fn generate_name(&self, gender: Gender, rng: &mut dyn RngCore) -> PersonName {
        let givens = match gender {
            Gender::Male => MALE_GIVEN_NAMES,
            Gender::Female => FEMALE_GIVEN_NAMES,
        };
        let given = givens.choose(rng).copied().unwrap_or_default();
        let father = FATHER_NAMES.choose(rng).copied().unwrap_or_default();
        let family = FAMILY_NAMES.choose(rng).copied().unwrap_or_default();
        PersonName {
            first_name: given.to_string(),
            last_name: family.to_string(),
            full_name: format!("{given} {father} {family}"),
        }
    }

    fn emergency_contact_name(&self, rng: &mut dyn RngCore) -> String {
        let idx = rng.random_range(0..MALE_GIVEN_NAMES.len() + FEMALE_GIVEN_NAMES.len());
        let given = MALE_GIVEN_NAMES
            .iter()
            .chain(FEMALE_GIVEN_NAMES)
            .nth(idx)
            .copied()
            .unwrap_or_default();
        let father = FATHER_NAMES.choose(rng).copied().unwrap_or_default();
        let family = FAMILY_NAMES.choose(rng).copied().unwrap_or_default();
        format!("{given} {father} {family}")
    }

    /// `C YYMMDD GG SSS X D`: century, birth date, governorate, sequence,
    /// sex digit (odd for men), digit-sum check.
    fn generate_id(&self, sketch: &PatientSketch<'_>, rng: &mut dyn RngCore) -> String {
        let governorate: u32 = rng.random_range(1..=MAX_GOVERNORATE);
        let sequence: u32 = rng.random_range(0..=999);
        let sex_digits = match sketch.gender {
            Gender::Male => MALE_SEX_DIGITS,
            Gender::Female => FEMALE_SEX_DIGITS,
        };
        let sex = sex_digits.choose(rng).copied().unwrap_or(1);
        national_id(sketch.date_of_birth, governorate, sequence, sex)
    }

    fn format_address(&self, street: &str, number: u32, city: &str) -> String {
        format!("{number} {street}، {city}")
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
            patient.conditions.join("، ")
        };
        let medications = if patient.medications.is_empty() {
            fallback.no_medications.to_string()
        } else {
            patient.medications.join("، ")
        };
        let sex = match patient.gender {
            Gender::Male => "ذكر",
            Gender::Female => "أنثى",
        };
        let smoking = if patient.smoking { "أيوه" } else { "لأ" };

        let mut prompt = format!(
            "اكتب نص طبي سريري بالعربية لمستند من نوع: {}\n\nبيانات المريض:\n- الاسم: {}\n- السن: {}\n- النوع: {sex}\n- الأمراض المزمنة: {conditions}\n- الأدوية: {medications}\n- التدخين: {smoking}\n\nأسلوب المنشأة: {}\n\nتعليمات:\n- اكتب من 1 إلى 3 فقرات فقط\n- استخدم الاختصارات الطبية المتعارف عليها: {}\n- أضف خطأ إملائي بسيط أو اثنين زي ما الدكتور بيكتب بسرعة\n- متضفش عناوين أو تنسيق خاص، نص عادي بس",
            DATA.doc_type_context(doc_type),
            patient.full_name,
            patient.age,
            facility.style,
            DATA.medical_abbreviations,
        );
        if let Some(directive) = contradiction {
            prompt.push_str(&format!(
                "\n\nمهم: في النص، اذكر بوضوح إن {}. لازم يبان طبيعي كجزء من التقرير الطبي.",
                directive.narrative_instruction
            ));
        }
        prompt.push_str("\n- لو مناسب، اذكر تفاصيل إضافية مش موجودة في البيانات المنظمة (مثلاً: الحالة الاجتماعية، حساسية، تفاصيل التاريخ المرضي)");
        prompt
    }
}

fn national_id(date_of_birth: NaiveDate, governorate: u32, sequence: u32, sex: u32) -> String {
    let year = date_of_birth.year();
    let century = if year < 2000 { 2 } else { 3 };
    let partial = format!(
        "{century}{:02}{:02}{:02}{governorate:02}{sequence:03}{sex}",
        year.rem_euclid(100),
        date_of_birth.month(),
        date_of_birth.day(),
    );
    let check = digit_sum(&partial) % 10;
    format!("{partial}{check}")
}

fn digit_sum(digits: &str) -> u32 {
    digits.chars().filter_map(|c| c.to_digit(10)).sum()
}

/// Birth date and sex encoded in a well-formed national ID, or `None` when
/// the length, century, date, governorate or check digit is wrong.
pub fn decode_id(id: &str) -> Option<(NaiveDate, Gender)> {
    if id.len() != 14 || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number = |range: std::ops::Range<usize>| id[range].parse::<u32>().ok();
    let century = match number(0..1)? {
        2 => 1900,
        3 => 2000,
        _ => return None,
    };
    let year = century + i32::try_from(number(1..3)?).ok()?;
    let date_of_birth = NaiveDate::from_ymd_opt(year, number(3..5)?, number(5..7)?)?;
    if !(1..=MAX_GOVERNORATE).contains(&number(7..9)?) {
        return None;
    }
    if digit_sum(&id[..13]) % 10 != number(13..14)? {
        return None;
    }
    let gender = if number(12..13)? % 2 == 1 { Gender::Male } else { Gender::Female };
    Some((date_of_birth, gender))
}

pub fn is_valid_id(id: &str) -> bool {
    decode_id(id).is_some()
}
