use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::analytics::domain::{ScoredRecord, YesNo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Row,
    Persona,
    School,
    Gender,
    Score,
    Attend,
    Hours,
    Motiv,
    Internet,
    RiskScore,
    Risk,
    Tutor,
    Prev,
    Disability,
    Peer,
}

impl SortColumn {
    pub const fn ordered() -> [Self; 15] {
        [
            Self::Row,
            Self::Persona,
            Self::School,
            Self::Gender,
            Self::Score,
            Self::Attend,
            Self::Hours,
            Self::Motiv,
            Self::Internet,
            Self::RiskScore,
            Self::Risk,
            Self::Tutor,
            Self::Prev,
            Self::Disability,
            Self::Peer,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Row => "row",
            Self::Persona => "persona",
            Self::School => "school",
            Self::Gender => "gender",
            Self::Score => "score",
            Self::Attend => "attend",
            Self::Hours => "hours",
            Self::Motiv => "motiv",
            Self::Internet => "internet",
            Self::RiskScore => "risk_score",
            Self::Risk => "risk",
            Self::Tutor => "tutor",
            Self::Prev => "prev",
            Self::Disability => "disability",
            Self::Peer => "peer",
        }
    }

    /// Ascending comparison on this column's key.
    pub fn compare(self, a: &ScoredRecord, b: &ScoredRecord) -> Ordering {
        let (left, right) = (&a.record, &b.record);
        match self {
            Self::Row => a.row.cmp(&b.row),
            Self::Persona => a
                .persona()
                .desirability_rank()
                .cmp(&b.persona().desirability_rank()),
            Self::School => left.school.cmp(&right.school),
            Self::Gender => left.gender.cmp(&right.gender),
            Self::Score => left.exam_score.total_cmp(&right.exam_score),
            Self::Attend => left.attendance.total_cmp(&right.attendance),
            Self::Hours => left.hours_studied.total_cmp(&right.hours_studied),
            Self::Motiv => left
                .motivation_level
                .rank()
                .cmp(&right.motivation_level.rank()),
            Self::Internet => flag(left.internet_access).cmp(&flag(right.internet_access)),
            Self::RiskScore => a.risk.risk_score.cmp(&b.risk.risk_score),
            Self::Risk => a.risk.tier.rank().cmp(&b.risk.tier.rank()),
            Self::Tutor => left.tutoring_sessions.total_cmp(&right.tutoring_sessions),
            Self::Prev => left.previous_scores.total_cmp(&right.previous_scores),
            Self::Disability => {
                flag(left.learning_disabilities).cmp(&flag(right.learning_disabilities))
            }
            Self::Peer => left
                .peer_influence
                .label()
                .cmp(right.peer_influence.label()),
        }
    }
}

fn flag(value: YesNo) -> u8 {
    u8::from(value.is_yes())
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|column| column.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown sort column '{wanted}'"))
    }
}
