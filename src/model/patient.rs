use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// Name parts produced by a locale. Surname structure is locale-defined, so
/// `last_name` may itself hold several surnames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
}

/// Ground-truth patient profile. Documents are derived from it and then
/// distorted; the profile itself is never corrupted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    /// Age at the end of the document date window.
    pub age: u32,
    pub address: String,
    pub city: String,
    pub conditions: Vec<String>,
    pub icd10_codes: Vec<String>,
    pub medications: Vec<String>,
    pub smoking: bool,
    pub blood_type: String,
    pub occupation: String,
    pub emergency_contact: String,
}

impl Patient {
    /// Whole years between birth and `on`, counting 365-day years.
    pub fn age_on(&self, on: NaiveDate) -> i64 {
        (on - self.date_of_birth).num_days().div_euclid(365)
    }
}
