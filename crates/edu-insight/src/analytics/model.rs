//! Static model configuration: per-feature normalization statistics and the
//! persona centroids used for nearest-centroid suggestions.
//!
//! Both are produced by an offline analytics step and loaded once at startup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use super::catalog::PersonaId;
use super::domain::StudentRecord;

pub const FEATURE_COUNT: usize = 6;

pub type FeatureVector = [f64; FEATURE_COUNT];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    HoursStudied,
    Attendance,
    SleepHours,
    PreviousScores,
    TutoringSessions,
    PhysicalActivity,
}

impl Feature {
    pub const fn ordered() -> [Self; FEATURE_COUNT] {
        [
            Self::HoursStudied,
            Self::Attendance,
            Self::SleepHours,
            Self::PreviousScores,
            Self::TutoringSessions,
            Self::PhysicalActivity,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HoursStudied => "hours_studied",
            Self::Attendance => "attendance",
            Self::SleepHours => "sleep_hours",
            Self::PreviousScores => "previous_scores",
            Self::TutoringSessions => "tutoring_sessions",
            Self::PhysicalActivity => "physical_activity",
        }
    }

    fn raw_value(self, record: &StudentRecord) -> f64 {
        match self {
            Self::HoursStudied => record.hours_studied,
            Self::Attendance => record.attendance,
            Self::SleepHours => record.sleep_hours,
            Self::PreviousScores => record.previous_scores,
            Self::TutoringSessions => record.tutoring_sessions,
            Self::PhysicalActivity => record.physical_activity,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fatal model or catalog misconfiguration; the engine cannot run.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("normalization range for {0} must be non-zero")]
    ZeroRange(Feature),
    #[error("normalization statistics for {0} must be finite")]
    NonFiniteScale(Feature),
    #[error("normalization table is missing {0}")]
    MissingFeature(Feature),
    #[error("no centroid configured for persona {0:?}")]
    MissingCentroid(PersonaId),
    #[error("persona {0:?} has more than one centroid")]
    DuplicateCentroid(PersonaId),
    #[error("centroid for persona {0:?} has non-finite weights")]
    NonFiniteCentroid(PersonaId),
    #[error("catalog has no profile for persona {0:?}")]
    MissingPersona(PersonaId),
    #[error("catalog lists persona {0:?} more than once")]
    DuplicatePersona(PersonaId),
    #[error("persona policy must end with an unconditional rule")]
    OpenPolicy,
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid model document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureScale {
    pub min: f64,
    pub range: f64,
}

/// Per-feature `(min, range)` pairs applied as `(value - min) / range`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Feature, FeatureScale>",
    into = "BTreeMap<Feature, FeatureScale>"
)]
pub struct NormalizationTable {
    scales: [FeatureScale; FEATURE_COUNT],
}

impl NormalizationTable {
    pub fn new(scales: BTreeMap<Feature, FeatureScale>) -> Result<Self, ConfigurationError> {
        let mut ordered = [FeatureScale {
            min: 0.0,
            range: 1.0,
        }; FEATURE_COUNT];

        for (slot, feature) in ordered.iter_mut().zip(Feature::ordered()) {
            let scale = scales
                .get(&feature)
                .copied()
                .ok_or(ConfigurationError::MissingFeature(feature))?;
            if !scale.min.is_finite() || !scale.range.is_finite() {
                return Err(ConfigurationError::NonFiniteScale(feature));
            }
            if scale.range == 0.0 {
                return Err(ConfigurationError::ZeroRange(feature));
            }
            *slot = scale;
        }

        Ok(Self { scales: ordered })
    }

    /// Min/range observed over the reference student-performance dataset.
    pub fn standard() -> Self {
        let scale = |min, range| FeatureScale { min, range };
        Self {
            scales: [
                scale(1.0, 43.0),
                scale(60.0, 40.0),
                scale(4.0, 6.0),
                scale(50.0, 50.0),
                scale(0.0, 8.0),
                scale(0.0, 6.0),
            ],
        }
    }

    pub fn scale(&self, feature: Feature) -> FeatureScale {
        self.scales[feature as usize]
    }

    /// Values outside the reference range normalize outside [0, 1] and are
    /// kept as-is.
    pub fn normalize(&self, record: &StudentRecord) -> FeatureVector {
        let mut vector = [0.0; FEATURE_COUNT];
        for (slot, feature) in vector.iter_mut().zip(Feature::ordered()) {
            let FeatureScale { min, range } = self.scale(feature);
            *slot = (feature.raw_value(record) - min) / range;
        }
        vector
    }
}

impl TryFrom<BTreeMap<Feature, FeatureScale>> for NormalizationTable {
    type Error = ConfigurationError;

    fn try_from(value: BTreeMap<Feature, FeatureScale>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NormalizationTable> for BTreeMap<Feature, FeatureScale> {
    fn from(table: NormalizationTable) -> Self {
        Feature::ordered().into_iter().zip(table.scales).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub persona: PersonaId,
    pub weights: FeatureVector,
}

/// One centroid per persona, kept in ascending id order so that distance ties
/// resolve to the lowest id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Centroid>", into = "Vec<Centroid>")]
pub struct CentroidSet {
    centroids: Vec<Centroid>,
}

impl CentroidSet {
    pub fn new(mut centroids: Vec<Centroid>) -> Result<Self, ConfigurationError> {
        centroids.sort_by_key(|centroid| centroid.persona);

        for pair in centroids.windows(2) {
            if pair[0].persona == pair[1].persona {
                return Err(ConfigurationError::DuplicateCentroid(pair[0].persona));
            }
        }

        for persona in PersonaId::ordered() {
            if !centroids.iter().any(|centroid| centroid.persona == persona) {
                return Err(ConfigurationError::MissingCentroid(persona));
            }
        }

        if let Some(centroid) = centroids
            .iter()
            .find(|centroid| centroid.weights.iter().any(|weight| !weight.is_finite()))
        {
            return Err(ConfigurationError::NonFiniteCentroid(centroid.persona));
        }

        Ok(Self { centroids })
    }

    pub fn standard() -> Self {
        let centroid = |persona, weights| Centroid { persona, weights };
        Self {
            centroids: vec![
                centroid(
                    PersonaId::DrivenAchiever,
                    [0.55, 0.80, 0.50, 0.62, 0.22, 0.50],
                ),
                centroid(
                    PersonaId::ConsistentWorker,
                    [0.45, 0.70, 0.52, 0.48, 0.20, 0.48],
                ),
                centroid(
                    PersonaId::PassiveCoaster,
                    [0.38, 0.45, 0.50, 0.45, 0.16, 0.46],
                ),
                centroid(
                    PersonaId::StrugglingLearner,
                    [0.30, 0.22, 0.48, 0.30, 0.14, 0.45],
                ),
                centroid(
                    PersonaId::PotentialBloomer,
                    [0.40, 0.40, 0.50, 0.82, 0.17, 0.47],
                ),
            ],
        }
    }

    pub fn centroids(&self) -> &[Centroid] {
        &self.centroids
    }

    /// Nearest centroid by Euclidean distance.
    pub fn classify(&self, vector: &FeatureVector) -> (PersonaId, f64) {
        let mut nearest = (self.centroids[0].persona, f64::INFINITY);

        for centroid in &self.centroids {
            let distance = euclidean(vector, &centroid.weights);
            if distance.total_cmp(&nearest.1).is_lt() {
                nearest = (centroid.persona, distance);
            }
        }

        nearest
    }
}

impl TryFrom<Vec<Centroid>> for CentroidSet {
    type Error = ConfigurationError;

    fn try_from(value: Vec<Centroid>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CentroidSet> for Vec<Centroid> {
    fn from(set: CentroidSet) -> Self {
        set.centroids
    }
}

fn euclidean(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Normalization statistics paired with the centroids they were fitted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaModel {
    pub normalization: NormalizationTable,
    pub centroids: CentroidSet,
}

impl PersonaModel {
    pub fn standard() -> Self {
        Self {
            normalization: NormalizationTable::standard(),
            centroids: CentroidSet::standard(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn suggest(&self, record: &StudentRecord) -> (PersonaId, f64) {
        let vector = self.normalization.normalize(record);
        self.centroids.classify(&vector)
    }
}

impl Default for PersonaModel {
    fn default() -> Self {
        Self::standard()
    }
}
