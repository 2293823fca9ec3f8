mod export;
mod parser;

pub use export::{export_predictions, export_to_string};
pub use parser::{parse_students, ParsedBatch};

use serde::Serialize;

use super::domain::{RowError, ScoredRecord};

/// Columns every batch upload must carry. Header order in the file is free.
pub const REQUIRED_HEADERS: [&str; 11] = [
    "Hours_Studied",
    "Attendance",
    "Sleep_Hours",
    "Previous_Scores",
    "Tutoring_Sessions",
    "Physical_Activity",
    "Motivation_Level",
    "Internet_Access",
    "Learning_Disabilities",
    "Peer_Influence",
    "Exam_Score",
];

pub const SCHOOL_HEADER: &str = "School_Type";
pub const GENDER_HEADER: &str = "Gender";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("failed to read batch input: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    pub row: usize,
    pub error: RowError,
}

/// Result of one batch call: scored rows in input order plus every row that
/// was skipped and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub records: Vec<ScoredRecord>,
    pub rejected: Vec<RejectedRow>,
    pub total_rows: usize,
}

impl BatchOutcome {
    pub fn accepted(&self) -> usize {
        self.records.len()
    }
}
