//! End-to-end run: patient pool, structured records, distortion, narratives,
//! NDJSON output.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use rand::{Rng, RngCore};
use serde::Serialize;
use serde_json::Value;

use crate::config::{DocumentConfig, GeneratorConfig};
use crate::distort::{ContradictionDirective, Distorter};
use crate::error::{GenerateError, GenerateResult};
use crate::flush;
use crate::locale::{Concept, DocType, Facility, Locale, SourceType};
use crate::model::{Patient, Record};
use crate::narrative::{NarrativeGenerator, NarrativeRequest, SKIPPED_PLACEHOLDER};
use crate::procgen::{
    Phase, all_index_mappings, build_structured_fields, generate_patients, index_name, make_rng,
    tables::sample_between,
};

/// Free-text field name for facilities that do not map one.
pub const DEFAULT_TEXT_FIELD: &str = "clinical_notes";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexCount {
    pub name: String,
    pub documents: usize,
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub patients: usize,
    /// Per-index document counts, in order of first appearance.
    pub indices: Vec<IndexCount>,
    pub contradictions: usize,
    pub garbage_injections: usize,
    pub narratives_generated: usize,
    pub narratives_failed: usize,
}

impl RunSummary {
    pub fn total_documents(&self) -> usize {
        self.indices.iter().map(|i| i.documents).sum()
    }
}

/// A record waiting for its narrative.
struct PendingNarrative {
    batch: usize,
    position: usize,
    patient: usize,
    facility: &'static Facility,
    doc_type: DocType,
    source: SourceType,
    contradiction: Option<ContradictionDirective>,
}

struct IndexBatch {
    name: String,
    records: Vec<Record>,
}

/// Records grouped by output index, in order of first appearance.
#[derive(Default)]
struct IndexSet {
    batches: Vec<IndexBatch>,
    positions: HashMap<String, usize>,
}

impl IndexSet {
    /// Append a record and return its `(batch, position)` address.
    fn push(&mut self, name: String, record: Record) -> (usize, usize) {
        let batch = match self.positions.get(&name) {
            Some(&idx) => idx,
            None => {
                self.batches.push(IndexBatch {
                    name: name.clone(),
                    records: Vec::new(),
                });
                self.positions.insert(name, self.batches.len() - 1);
                self.batches.len() - 1
            }
        };
        let records = &mut self.batches[batch].records;
        records.push(record);
        (batch, records.len() - 1)
    }

    fn record_mut(&mut self, batch: usize, position: usize) -> Option<&mut Record> {
        self.batches.get_mut(batch)?.records.get_mut(position)
    }
}

/// Run the full pipeline and write one `.ndjson` file per index.
///
/// Refuses to write into a directory that already holds `.ndjson` files
/// unless `config.force` is set. When `config.skip_freetext` is set or no
/// narrator is given, text fields get [`SKIPPED_PLACEHOLDER`] and no random
/// draws are made for them.
pub fn generate_documents(
    config: &GeneratorConfig,
    locale: &Locale,
    narrator: Option<&mut dyn NarrativeGenerator>,
) -> GenerateResult<RunSummary> {
    config.validate()?;

    if !config.force {
        let existing = flush::count_existing(&config.output_dir)?;
        if existing > 0 {
            return Err(GenerateError::OutputExists {
                dir: config.output_dir.clone(),
                count: existing,
            });
        }
    }

    let documents = &config.documents;
    tracing::info!(
        patients = config.num_patients,
        seed = config.seed,
        locale = locale.code(),
        "generating patient pool"
    );
    let patients = generate_patients(
        config.num_patients,
        config.seed,
        locale,
        &config.population,
        documents.date_end,
    );

    let mut rng = make_rng(config.seed, Phase::Documents);
    let distorter = Distorter::new(locale, config.distortion);
    let mut summary = RunSummary {
        patients: patients.len(),
        ..RunSummary::default()
    };
    let mut indices = IndexSet::default();
    let mut queue = Vec::new();

    for (patient_idx, patient) in patients.iter().enumerate() {
        let facilities = sample_between(
            locale.data().facilities,
            documents.min_facilities_per_patient,
            documents.max_facilities_per_patient,
            &mut rng,
        );
        for facility in facilities {
            let doc_types =
                sample_between(facility.doc_types, documents.min_docs_per_visit, documents.max_docs_per_visit, &mut rng);
            for &doc_type in doc_types {
                let doc_date = random_doc_date(documents, &mut rng);
                let mut record =
                    build_structured_fields(patient, facility, doc_type, doc_date, &mut rng, locale.data(), documents);
                let source = facility.source(doc_type);
                let outcome = distorter.distort_record(patient, &mut record, source, &mut rng);

                if let Some(directive) = &outcome.contradiction {
                    summary.contradictions += 1;
                    tracing::debug!(facility = facility.id, kind = ?directive.kind, "contradiction planned");
                }
                if let Some(garbage) = &outcome.garbage {
                    summary.garbage_injections += 1;
                    tracing::debug!(
                        facility = facility.id,
                        strategy = garbage.strategy.as_str(),
                        field = garbage.field.as_deref().unwrap_or("-"),
                        "garbage injected"
                    );
                }

                let (batch, position) = indices.push(index_name(facility.id, doc_type), record);
                queue.push(PendingNarrative {
                    batch,
                    position,
                    patient: patient_idx,
                    facility,
                    doc_type,
                    source,
                    contradiction: outcome.contradiction,
                });
            }
        }
        if (patient_idx + 1) % 50 == 0 {
            tracing::debug!(processed = patient_idx + 1, documents = queue.len(), "patients processed");
        }
    }
    tracing::info!(
        documents = queue.len(),
        indices = indices.batches.len(),
        "structured records built"
    );

    let narrator = if config.skip_freetext { None } else { narrator };
    match narrator {
        None => {
            tracing::info!("skipping free text generation");
            for job in &queue {
                set_text(&mut indices, job, SKIPPED_PLACEHOLDER.to_string());
            }
        }
        Some(narrator) => {
            tracing::info!(documents = queue.len(), "generating free text");
            for (i, job) in queue.iter().enumerate() {
                let text = narrate(job, &patients, locale, &distorter, narrator, &mut rng, &mut summary, i);
                set_text(&mut indices, job, text);
                if (i + 1) % 100 == 0 {
                    tracing::info!(done = i + 1, total = queue.len(), "free text progress");
                }
            }
        }
    }

    flush::write_indices(
        &config.output_dir,
        indices
            .batches
            .iter()
            .map(|b| (b.name.as_str(), b.records.as_slice())),
    )?;
    let mappings: Vec<(String, Value)> = all_index_mappings(locale.data())
        .into_iter()
        .filter(|(name, _)| indices.batches.iter().any(|b| &b.name == name))
        .collect();
    flush::write_mappings(&config.output_dir, mappings.iter().map(|(name, m)| (name.as_str(), m)))?;

    summary.indices = indices
        .batches
        .iter()
        .map(|b| IndexCount {
            name: b.name.clone(),
            documents: b.records.len(),
        })
        .collect();
    tracing::info!(
        documents = summary.total_documents(),
        indices = summary.indices.len(),
        dir = %config.output_dir.display(),
        "output written"
    );
    Ok(summary)
}

/// Uniform date in the document window, bounds inclusive.
pub fn random_doc_date(documents: &DocumentConfig, rng: &mut dyn RngCore) -> NaiveDate {
    let span = (documents.date_end - documents.date_start).num_days().max(0);
    let offset = rng.random_range(0..=span);
    documents
        .date_start
        .checked_add_days(Days::new(offset as u64))
        .unwrap_or(documents.date_start)
}

#[allow(clippy::too_many_arguments)]
fn narrate(
    job: &PendingNarrative,
    patients: &[Patient],
    locale: &Locale,
    distorter: &Distorter<'_>,
    narrator: &mut dyn NarrativeGenerator,
    rng: &mut dyn RngCore,
    summary: &mut RunSummary,
    position: usize,
) -> String {
    let Some(patient) = patients.get(job.patient) else {
        return String::new();
    };
    let request = NarrativeRequest::for_document(locale, patient, job.facility, job.doc_type, job.contradiction.as_ref());
    match narrator.generate(&request) {
        Ok(text) => {
            summary.narratives_generated += 1;
            distorter.distort_narrative(&text, job.source, rng)
        }
        Err(err) => {
            summary.narratives_failed += 1;
            tracing::warn!(document = position, facility = job.facility.id, error = %err, "free text generation failed");
            String::new()
        }
    }
}

fn set_text(indices: &mut IndexSet, job: &PendingNarrative, text: String) {
    let field = job.facility.field(Concept::FreeText).unwrap_or(DEFAULT_TEXT_FIELD);
    if let Some(record) = indices.record_mut(job.batch, job.position) {
        record.insert(field.to_string(), Value::String(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NarrativeError;
    use crate::locale::load_locale;
    use crate::testutil::ScriptedRng;

    fn config_in(dir: &std::path::Path) -> GeneratorConfig {
        GeneratorConfig {
            num_patients: 5,
            locale: "es_ES".into(),
            output_dir: dir.to_path_buf(),
            skip_freetext: true,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn doc_dates_stay_in_window() {
        let documents = DocumentConfig::default();
        assert_eq!(random_doc_date(&documents, &mut ScriptedRng::constant(0.0)), documents.date_start);
        assert_eq!(random_doc_date(&documents, &mut ScriptedRng::constant(0.9999999)), documents.date_end);
    }

    #[test]
    fn index_set_groups_by_name() {
        let mut set = IndexSet::default();
        assert_eq!(set.push("a".into(), Record::new()), (0, 0));
        assert_eq!(set.push("b".into(), Record::new()), (1, 0));
        assert_eq!(set.push("a".into(), Record::new()), (0, 1));
        assert!(set.record_mut(0, 1).is_some());
        assert!(set.record_mut(2, 0).is_none());
    }

    #[test]
    fn refuses_existing_output_without_force() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("medical_x_lab.ndjson"), "{}\n").unwrap();
        let locale = load_locale("es_ES").unwrap();
        let mut config = config_in(dir.path());
        let err = generate_documents(&config, &locale, None).unwrap_err();
        assert!(matches!(err, GenerateError::OutputExists { count: 1, .. }));

        config.force = true;
        assert!(generate_documents(&config, &locale, None).is_ok());
    }

    #[test]
    fn failed_narratives_become_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let locale = load_locale("es_ES").unwrap();
        let mut config = config_in(dir.path());
        config.skip_freetext = false;
        let mut narrator = |_: &NarrativeRequest| Err::<String, _>(NarrativeError::Permanent { reason: "down".into() });
        let summary = generate_documents(&config, &locale, Some(&mut narrator)).unwrap();
        assert_eq!(summary.narratives_failed, summary.total_documents());
        assert_eq!(summary.narratives_generated, 0);
    }
}
