pub mod patient;
pub mod record;

pub use patient::{Gender, Patient, PersonName};
pub use record::{Record, is_blank, is_integer};
