pub mod batch;
pub mod catalog;
pub mod domain;
pub mod engine;
pub mod model;
pub mod persona;
pub mod risk;
pub mod summary;
pub mod view;

pub use batch::{export_predictions, parse_students, BatchError, BatchOutcome, RejectedRow, SchemaError};
pub use catalog::{PersonaCatalog, PersonaId, PersonaProfile};
pub use domain::{
    ClassificationResult, Motivation, PeerInfluence, RowError, ScoredRecord, StudentRecord, YesNo,
};
pub use engine::PersonaEngine;
pub use model::{ConfigurationError, Feature, NormalizationTable, PersonaModel};
pub use persona::{PersonaDecision, PersonaPolicy, PersonaResolver, PersonaTraits};
pub use risk::{RiskAssessment, RiskRubric, RiskScorer, RiskTier};
pub use summary::{assistant_context, AnalyticsSummary, ScoreBucket, ScoreDistribution};
pub use view::{build_view, PageMeta, ScoredDataset, TableView, ViewAction, ViewState};

#[cfg(test)]
pub(crate) mod test_support {
    use super::domain::{Motivation, PeerInfluence, StudentRecord, YesNo};

    /// A mid-range student with no risk-bearing categorical answers.
    pub(crate) fn student() -> StudentRecord {
        StudentRecord {
            hours_studied: 20.0,
            attendance: 80.0,
            sleep_hours: 7.0,
            previous_scores: 75.0,
            tutoring_sessions: 1.0,
            physical_activity: 3.0,
            exam_score: 67.0,
            motivation_level: Motivation::Medium,
            internet_access: YesNo::Yes,
            learning_disabilities: YesNo::No,
            peer_influence: PeerInfluence::Positive,
            school: Some("Public".to_string()),
            gender: Some("Female".to_string()),
        }
    }
}
