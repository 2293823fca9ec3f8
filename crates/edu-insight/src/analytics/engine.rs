use rayon::prelude::*;
use std::io::Read;
use std::path::Path;
use tracing::info;

use super::batch::{parse_students, BatchError, BatchOutcome};
use super::catalog::PersonaCatalog;
use super::domain::{ClassificationResult, RowError, ScoredRecord, StudentRecord};
use super::model::PersonaModel;
use super::persona::PersonaResolver;
use super::risk::RiskScorer;

/// Immutable engine configuration built once at startup and shared by every
/// prediction. Scoring a record touches no shared mutable state.
#[derive(Debug, Clone, Default)]
pub struct PersonaEngine {
    model: PersonaModel,
    resolver: PersonaResolver,
    scorer: RiskScorer,
    catalog: PersonaCatalog,
}

impl PersonaEngine {
    pub fn new(
        model: PersonaModel,
        resolver: PersonaResolver,
        scorer: RiskScorer,
        catalog: PersonaCatalog,
    ) -> Self {
        Self {
            model,
            resolver,
            scorer,
            catalog,
        }
    }

    pub fn standard() -> Self {
        Self::default()
    }

    pub fn with_model(model: PersonaModel) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    pub fn model(&self) -> &PersonaModel {
        &self.model
    }

    pub fn catalog(&self) -> &PersonaCatalog {
        &self.catalog
    }

    /// Runs the full pipeline on an already validated record.
    pub fn score(&self, row: usize, record: StudentRecord) -> ScoredRecord {
        let (suggestion, distance) = self.model.suggest(&record);
        let risk = self.scorer.score(&record);
        let decision = self
            .resolver
            .resolve(&record.traits(risk.risk_score), suggestion);

        ScoredRecord {
            row,
            record,
            classification: ClassificationResult {
                persona_id: decision.persona,
                centroid_suggestion_id: suggestion,
                distance,
                matched_rule: decision.rule,
            },
            risk,
        }
    }

    /// Single manual entry; non-finite inputs are refused before scoring.
    pub fn predict_one(&self, record: StudentRecord) -> Result<ScoredRecord, RowError> {
        record.validate()?;
        Ok(self.score(1, record))
    }

    pub fn predict_batch<R: Read>(&self, reader: R) -> Result<BatchOutcome, BatchError> {
        let parsed = parse_students(reader)?;

        let records: Vec<ScoredRecord> = parsed
            .students
            .into_par_iter()
            .map(|(row, student)| self.score(row, student))
            .collect();

        info!(
            total_rows = parsed.total_rows,
            scored = records.len(),
            rejected = parsed.rejected.len(),
            "scored student batch"
        );

        Ok(BatchOutcome {
            records,
            rejected: parsed.rejected,
            total_rows: parsed.total_rows,
        })
    }

    pub fn predict_batch_path<P: AsRef<Path>>(&self, path: P) -> Result<BatchOutcome, BatchError> {
        let file = std::fs::File::open(path)?;
        self.predict_batch(file)
    }
}
