pub mod jsonl;

pub use jsonl::{count_existing, write_indices, write_jsonl, write_mappings};
