pub mod patients;
pub mod schema;
pub mod seed;
pub mod tables;

pub use patients::{generate_patient, generate_patients};
pub use schema::{all_index_mappings, all_index_names, build_structured_fields, index_mapping, index_name};
pub use seed::{Phase, make_rng};
