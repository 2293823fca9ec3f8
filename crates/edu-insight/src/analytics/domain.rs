use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::catalog::PersonaId;
use super::persona::PersonaTraits;
use super::risk::RiskAssessment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Motivation {
    Low,
    Medium,
    High,
}

impl Motivation {
    pub const fn ordered() -> [Self; 3] {
        [Self::Low, Self::Medium, Self::High]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub const fn rank(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }

    pub const fn is_yes(self) -> bool {
        matches!(self, Self::Yes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeerInfluence {
    Positive,
    Neutral,
    Negative,
}

impl PeerInfluence {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
        }
    }
}

macro_rules! categorical_from_str {
    ($ty:ty, $($variant:ident),+) => {
        impl FromStr for $ty {
            type Err = ();

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let trimmed = raw.trim();
                $(
                    if trimmed.eq_ignore_ascii_case(stringify!($variant)) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(())
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

categorical_from_str!(Motivation, Low, Medium, High);
categorical_from_str!(YesNo, Yes, No);
categorical_from_str!(PeerInfluence, Positive, Neutral, Negative);

/// Raw per-student input, immutable once scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub hours_studied: f64,
    pub attendance: f64,
    pub sleep_hours: f64,
    pub previous_scores: f64,
    pub tutoring_sessions: f64,
    pub physical_activity: f64,
    pub exam_score: f64,
    pub motivation_level: Motivation,
    pub internet_access: YesNo,
    pub learning_disabilities: YesNo,
    pub peer_influence: PeerInfluence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl StudentRecord {
    /// Rejects NaN and infinite inputs; the gate cascade would otherwise route
    /// them silently into fallback branches.
    pub fn validate(&self) -> Result<(), RowError> {
        let numeric = [
            ("Hours_Studied", self.hours_studied),
            ("Attendance", self.attendance),
            ("Sleep_Hours", self.sleep_hours),
            ("Previous_Scores", self.previous_scores),
            ("Tutoring_Sessions", self.tutoring_sessions),
            ("Physical_Activity", self.physical_activity),
            ("Exam_Score", self.exam_score),
        ];

        match numeric.iter().find(|(_, value)| !value.is_finite()) {
            Some((column, _)) => Err(RowError::NonFinite {
                column: (*column).to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn traits(&self, risk_score: u8) -> PersonaTraits {
        PersonaTraits {
            score: self.exam_score,
            attendance: self.attendance,
            motivation: self.motivation_level,
            hours: self.hours_studied,
            previous_score: self.previous_scores,
            risk_score: Some(risk_score),
        }
    }
}

/// Per-row failure. Recovered locally by skipping the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowError {
    #[error("row has {found} fields but column {column} needs at least {required}")]
    InsufficientColumns {
        column: String,
        found: usize,
        required: usize,
    },
    #[error("column {column} has non-numeric value '{value}'")]
    InvalidNumber { column: String, value: String },
    #[error("column {column} must be finite")]
    NonFinite { column: String },
    #[error("column {column} has unrecognized value '{value}'")]
    InvalidCategory { column: String, value: String },
    #[error("column {column} is not valid UTF-8")]
    InvalidEncoding { column: String },
}

/// Output of the centroid classifier plus the persona gate cascade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub persona_id: PersonaId,
    pub centroid_suggestion_id: PersonaId,
    pub distance: f64,
    pub matched_rule: String,
}

/// Unit the view engine operates on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    /// 1-based position of the source row.
    pub row: usize,
    pub record: StudentRecord,
    pub classification: ClassificationResult,
    pub risk: RiskAssessment,
}

impl ScoredRecord {
    pub fn persona(&self) -> PersonaId {
        self.classification.persona_id
    }
}
