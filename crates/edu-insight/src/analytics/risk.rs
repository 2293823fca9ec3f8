use serde::{Deserialize, Serialize};
use std::fmt;

use super::domain::{Motivation, PeerInfluence, StudentRecord, YesNo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub const fn ordered() -> [Self; 3] {
        [Self::High, Self::Medium, Self::Low]
    }

    pub const fn from_score(score: u8) -> Self {
        if score >= 5 {
            Self::High
        } else if score >= 3 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn rank(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    Attendance,
    Motivation,
    ExamScore,
    InternetAccess,
    LearningDisabilities,
    StudyHours,
    PeerInfluence,
}

/// Points one factor added to a student's risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskContribution {
    pub factor: RiskFactor,
    pub points: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub risk_score: u8,
    pub tier: RiskTier,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contributions: Vec<RiskContribution>,
}

/// Thresholds for the additive rubric. Each two-step threshold awards two
/// points below `severe` and one point below `elevated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRubric {
    pub attendance_severe: f64,
    pub attendance_elevated: f64,
    pub exam_severe: f64,
    pub exam_elevated: f64,
    pub minimum_study_hours: f64,
}

impl Default for RiskRubric {
    fn default() -> Self {
        Self {
            attendance_severe: 70.0,
            attendance_elevated: 80.0,
            exam_severe: 62.0,
            exam_elevated: 67.0,
            minimum_study_hours: 10.0,
        }
    }
}

/// Additive scorer; every factor is evaluated independently of the others and
/// of the persona assignment.
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    rubric: RiskRubric,
}

impl RiskScorer {
    pub fn new(rubric: RiskRubric) -> Self {
        Self { rubric }
    }

    pub fn score(&self, record: &StudentRecord) -> RiskAssessment {
        let rubric = &self.rubric;
        let mut contributions = Vec::new();
        let mut add = |factor, points: u8| {
            if points > 0 {
                contributions.push(RiskContribution { factor, points });
            }
        };

        add(
            RiskFactor::Attendance,
            two_step(
                record.attendance,
                rubric.attendance_severe,
                rubric.attendance_elevated,
            ),
        );
        add(
            RiskFactor::Motivation,
            match record.motivation_level {
                Motivation::Low => 2,
                Motivation::Medium => 1,
                Motivation::High => 0,
            },
        );
        add(
            RiskFactor::ExamScore,
            two_step(record.exam_score, rubric.exam_severe, rubric.exam_elevated),
        );
        add(
            RiskFactor::InternetAccess,
            u8::from(record.internet_access == YesNo::No),
        );
        add(
            RiskFactor::LearningDisabilities,
            u8::from(record.learning_disabilities == YesNo::Yes),
        );
        add(
            RiskFactor::StudyHours,
            u8::from(record.hours_studied < rubric.minimum_study_hours),
        );
        add(
            RiskFactor::PeerInfluence,
            u8::from(record.peer_influence == PeerInfluence::Negative),
        );

        let risk_score = contributions.iter().map(|c| c.points).sum();
        RiskAssessment {
            risk_score,
            tier: RiskTier::from_score(risk_score),
            contributions,
        }
    }
}

fn two_step(value: f64, severe: f64, elevated: f64) -> u8 {
    if value < severe {
        2
    } else if value < elevated {
        1
    } else {
        0
    }
}
