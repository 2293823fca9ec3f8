//! Student learning analytics engine.
//!
//! Raw student records flow through a fixed pipeline: feature normalization,
//! nearest-centroid suggestion, the persona gate cascade, and the additive risk
//! rubric. Scored records then feed a pure filter/sort/paginate view and the
//! aggregate summaries handed to presentation layers.

pub mod analytics;
pub mod config;
pub mod error;
pub mod telemetry;

pub use analytics::{
    BatchOutcome, PersonaCatalog, PersonaEngine, PersonaId, PersonaModel, RiskTier, ScoredDataset,
    ScoredRecord, StudentRecord, ViewState,
};
pub use error::AppError;
