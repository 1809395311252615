use chrono::{Days, NaiveDate};
use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

use crate::config::PopulationConfig;
use crate::locale::{Locale, PatientSketch};
use crate::model::{Gender, Patient};

use super::seed::{Phase, make_rng};
use super::tables::{BLOOD_TYPES, choose_or, sample_between};

/// Build the ground-truth pool from the patient-phase stream of `seed`.
///
/// `age_reference` is the date ages are computed against, normally the end
/// of the document window.
pub fn generate_patients(
    count: usize,
    seed: u64,
    locale: &Locale,
    population: &PopulationConfig,
    age_reference: NaiveDate,
) -> Vec<Patient> {
    let mut rng = make_rng(seed, Phase::Patients);
    let patients: Vec<Patient> = (0..count)
        .map(|_| generate_patient(&mut rng, locale, population, age_reference))
        .collect();
    tracing::debug!(count = patients.len(), locale = locale.code(), "patient pool generated");
    patients
}

/// One patient. Draw order: gender, name, birth date, conditions, medications,
/// city, street, house number, national ID, smoking, blood type, occupation,
/// emergency contact.
pub fn generate_patient(
    rng: &mut dyn RngCore,
    locale: &Locale,
    population: &PopulationConfig,
    age_reference: NaiveDate,
) -> Patient {
    let provider = locale.provider();
    let data = locale.data();

    let gender = Gender::ALL.choose(rng).copied().unwrap_or(Gender::Female);
    let name = provider.generate_name(gender, rng);
    let offset = rng.random_range(0..=population.dob_range_days);
    let date_of_birth = population
        .dob_start
        .checked_add_days(Days::new(u64::from(offset)))
        .unwrap_or(population.dob_start);
    let age = (age_reference - date_of_birth).num_days().div_euclid(365).max(0) as u32;

    let conditions: Vec<String> = sample_between(data.conditions, 0, population.max_conditions, rng)
        .into_iter()
        .map(|c| c.to_string())
        .collect();
    let medications: Vec<String> = sample_between(data.medications, 0, population.max_medications, rng)
        .into_iter()
        .map(|m| m.to_string())
        .collect();

    let city = choose_or(data.cities, "", rng);
    let street = choose_or(data.streets, "", rng);
    let house_number = rng.random_range(1..=population.max_house_number.max(1));

    let id = provider.generate_id(
        &PatientSketch {
            name: &name,
            gender,
            date_of_birth,
            city,
        },
        rng,
    );

    let icd10_codes = conditions
        .iter()
        .filter_map(|c| data.icd10_for(c))
        .map(str::to_string)
        .collect();

    let smoking = rng.random::<f64>() < population.smoking_prevalence;
    let blood_type = choose_or(BLOOD_TYPES, "O+", rng).to_string();
    let occupation = choose_or(data.occupations, "", rng).to_string();
    let emergency_contact = provider.emergency_contact_name(rng);

    Patient {
        id,
        first_name: name.first_name,
        last_name: name.last_name,
        full_name: name.full_name,
        gender,
        date_of_birth,
        age,
        address: provider.format_address(street, house_number, city),
        city: city.to_string(),
        conditions,
        icd10_codes,
        medications,
        smoking,
        blood_type,
        occupation,
        emergency_contact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::load_locale;
    use crate::locale::he_il::is_valid_id;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()
    }

    #[test]
    fn same_seed_same_pool() {
        let locale = load_locale("es_ES").unwrap();
        let population = PopulationConfig::default();
        let a = generate_patients(20, 42, &locale, &population, reference());
        let b = generate_patients(20, 42, &locale, &population, reference());
        assert_eq!(a, b);
        let c = generate_patients(20, 43, &locale, &population, reference());
        assert_ne!(a, c);
    }

    #[test]
    fn patients_respect_population_bounds() {
        let locale = load_locale("he_IL").unwrap();
        let population = PopulationConfig::default();
        let latest = population
            .dob_start
            .checked_add_days(Days::new(u64::from(population.dob_range_days)))
            .unwrap();
        for patient in generate_patients(100, 7, &locale, &population, reference()) {
            assert!(patient.date_of_birth >= population.dob_start);
            assert!(patient.date_of_birth <= latest);
            assert!(patient.conditions.len() <= population.max_conditions);
            assert!(patient.medications.len() <= population.max_medications);
            assert_eq!(patient.icd10_codes.len(), patient.conditions.len());
            assert!(BLOOD_TYPES.contains(&patient.blood_type.as_str()));
            assert!(is_valid_id(&patient.id), "{}", patient.id);
            assert!(patient.address.ends_with(&patient.city));
            assert_eq!(i64::from(patient.age), patient.age_on(reference()));
        }
    }

    #[test]
    fn smoking_prevalence_extremes() {
        let locale = load_locale("es_ES").unwrap();
        let mut population = PopulationConfig::default();
        population.smoking_prevalence = 0.0;
        assert!(generate_patients(30, 1, &locale, &population, reference()).iter().all(|p| !p.smoking));
        population.smoking_prevalence = 1.0;
        assert!(generate_patients(30, 1, &locale, &population, reference()).iter().all(|p| p.smoking));
    }

    #[test]
    fn zero_patients() {
        let locale = load_locale("es_ES").unwrap();
        assert!(generate_patients(0, 1, &locale, &PopulationConfig::default(), reference()).is_empty());
    }
}
