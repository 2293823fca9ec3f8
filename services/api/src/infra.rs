use edu_insight::analytics::{AnalyticsSummary, BatchOutcome, PersonaModel};
use edu_insight::config::AnalyticsConfig;
use edu_insight::error::AppError;
use edu_insight::{PersonaEngine, ScoredDataset};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Engine, scored population and summary, fixed once the service starts.
pub(crate) struct Analytics {
    pub(crate) engine: PersonaEngine,
    pub(crate) dataset: ScoredDataset,
    pub(crate) summary: AnalyticsSummary,
}

impl Analytics {
    pub(crate) fn new(engine: PersonaEngine, outcome: Option<BatchOutcome>) -> Self {
        let records = outcome.map(|outcome| outcome.records).unwrap_or_default();
        let summary = AnalyticsSummary::from_records(&records, engine.catalog());
        Self {
            engine,
            dataset: ScoredDataset::new(records),
            summary,
        }
    }

    pub(crate) fn load(config: &AnalyticsConfig) -> Result<Self, AppError> {
        let engine = load_engine(config.model_path.as_deref())?;
        let outcome = config
            .dataset_path
            .as_deref()
            .map(|path| load_dataset(&engine, path))
            .transpose()?;

        let mut analytics = Self::new(engine, outcome);
        if let Some(path) = config.summary_path.as_deref() {
            analytics.summary = AnalyticsSummary::from_json_path(path)?;
            info!(path = %path.display(), "loaded precomputed summary");
        }

        Ok(analytics)
    }
}

pub(crate) fn load_engine(model_path: Option<&Path>) -> Result<PersonaEngine, AppError> {
    match model_path {
        Some(path) => {
            let model = PersonaModel::from_json_path(path)?;
            info!(path = %path.display(), "loaded persona model");
            Ok(PersonaEngine::with_model(model))
        }
        None => Ok(PersonaEngine::standard()),
    }
}

pub(crate) fn load_dataset(engine: &PersonaEngine, path: &Path) -> Result<BatchOutcome, AppError> {
    let outcome = engine.predict_batch_path(path)?;
    if !outcome.rejected.is_empty() {
        warn!(
            path = %path.display(),
            rejected = outcome.rejected.len(),
            "dataset contains rows that could not be scored"
        );
    }
    info!(
        path = %path.display(),
        students = outcome.accepted(),
        "scored startup dataset"
    );
    Ok(outcome)
}
