pub mod config;
pub mod distort;
pub mod error;
pub mod flush;
pub mod generate;
pub mod locale;
pub mod model;
pub mod narrative;
pub mod procgen;
pub mod testutil;

pub use config::GeneratorConfig;
pub use error::{GenerateError, GenerateResult};
pub use generate::{RunSummary, generate_documents};
pub use locale::{Locale, load_locale};
pub use model::{Patient, Record};
