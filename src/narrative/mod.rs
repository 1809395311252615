//! Free-text narratives for documents.
//!
//! Narratives come from a [`NarrativeGenerator`], normally a
//! [`ChatCompletionClient`] talking to an OpenAI-compatible endpoint. A
//! failed narrative never aborts a run: the text field is left empty.

pub mod client;

pub use client::{ChatCompletionClient, RetryPolicy, is_local_endpoint};

use crate::distort::ContradictionDirective;
use crate::error::NarrativeError;
use crate::locale::{DocType, Facility, Locale};
use crate::model::Patient;

/// Text written in place of a narrative when generation is skipped.
pub const SKIPPED_PLACEHOLDER: &str = "[free text generation skipped]";

/// One narrative to produce.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub facility_id: &'static str,
    pub doc_type: DocType,
}

impl NarrativeRequest {
    /// Assemble the prompts for a document, folding in the contradiction the
    /// text has to assert, if any.
    pub fn for_document(
        locale: &Locale,
        patient: &Patient,
        facility: &'static Facility,
        doc_type: DocType,
        contradiction: Option<&ContradictionDirective>,
    ) -> Self {
        Self {
            system_prompt: locale.data().system_prompt.to_string(),
            user_prompt: locale.provider().format_prompt(patient, facility, doc_type, contradiction),
            facility_id: facility.id,
            doc_type,
        }
    }
}

/// Source of narrative text.
pub trait NarrativeGenerator {
    fn generate(&mut self, request: &NarrativeRequest) -> Result<String, NarrativeError>;
}

impl<F> NarrativeGenerator for F
where
    F: FnMut(&NarrativeRequest) -> Result<String, NarrativeError>,
{
    fn generate(&mut self, request: &NarrativeRequest) -> Result<String, NarrativeError> {
        self(request)
    }
}
