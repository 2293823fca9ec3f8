use csv::ByteRecord;
use std::io::Read;
use std::str::FromStr;
use tracing::{debug, warn};

use super::{BatchError, RejectedRow, SchemaError, GENDER_HEADER, REQUIRED_HEADERS, SCHOOL_HEADER};
use crate::analytics::domain::{RowError, StudentRecord};

/// Rows that survived validation, each tagged with its 1-based data-row index.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBatch {
    pub students: Vec<(usize, StudentRecord)>,
    pub rejected: Vec<RejectedRow>,
    pub total_rows: usize,
}

/// Rows are read as raw bytes and decoded field by field, so a badly encoded
/// row is rejected on its own instead of failing the upload.
pub fn parse_students<R: Read>(reader: R) -> Result<ParsedBatch, BatchError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let layout = ColumnLayout::resolve(csv_reader.headers()?)?;
    let mut students = Vec::new();
    let mut rejected = Vec::new();
    let mut total_rows = 0;

    for result in csv_reader.byte_records() {
        let record = result?;
        total_rows += 1;

        match layout.student(&record) {
            Ok(student) => students.push((total_rows, student)),
            Err(error) => {
                warn!(row = total_rows, %error, "skipping student row");
                rejected.push(RejectedRow {
                    row: total_rows,
                    error,
                });
            }
        }
    }

    debug!(
        total_rows,
        accepted = students.len(),
        rejected = rejected.len(),
        "parsed student batch"
    );

    Ok(ParsedBatch {
        students,
        rejected,
        total_rows,
    })
}

/// Field positions of the known columns within one upload.
struct ColumnLayout {
    required: [usize; REQUIRED_HEADERS.len()],
    school: Option<usize>,
    gender: Option<usize>,
}

impl ColumnLayout {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, SchemaError> {
        let position = |name: &str| headers.iter().position(|header| header == name);

        let mut required = [0; REQUIRED_HEADERS.len()];
        let mut missing = Vec::new();
        for (slot, name) in required.iter_mut().zip(REQUIRED_HEADERS) {
            match position(name) {
                Some(index) => *slot = index,
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(SchemaError::MissingHeaders(missing));
        }

        Ok(Self {
            required,
            school: position(SCHOOL_HEADER),
            gender: position(GENDER_HEADER),
        })
    }

    fn index_of(&self, column: &str) -> Option<usize> {
        REQUIRED_HEADERS
            .iter()
            .position(|name| *name == column)
            .map(|slot| self.required[slot])
    }

    fn student(&self, record: &ByteRecord) -> Result<StudentRecord, RowError> {
        self.check_width(record)?;

        Ok(StudentRecord {
            hours_studied: self.number(record, "Hours_Studied")?,
            attendance: self.number(record, "Attendance")?,
            sleep_hours: self.number(record, "Sleep_Hours")?,
            previous_scores: self.number(record, "Previous_Scores")?,
            tutoring_sessions: self.number(record, "Tutoring_Sessions")?,
            physical_activity: self.number(record, "Physical_Activity")?,
            exam_score: self.number(record, "Exam_Score")?,
            motivation_level: self.category(record, "Motivation_Level")?,
            internet_access: self.category(record, "Internet_Access")?,
            learning_disabilities: self.category(record, "Learning_Disabilities")?,
            peer_influence: self.category(record, "Peer_Influence")?,
            school: optional(record, self.school, SCHOOL_HEADER)?,
            gender: optional(record, self.gender, GENDER_HEADER)?,
        })
    }

    /// Short rows are reported against the leftmost required column they lack.
    fn check_width(&self, record: &ByteRecord) -> Result<(), RowError> {
        let found = record.len();
        let lacking = REQUIRED_HEADERS
            .iter()
            .zip(self.required)
            .filter(|(_, index)| *index >= found)
            .min_by_key(|(_, index)| *index);

        match lacking {
            Some((column, index)) => Err(RowError::InsufficientColumns {
                column: (*column).to_string(),
                found,
                required: index + 1,
            }),
            None => Ok(()),
        }
    }

    fn raw<'r>(&self, record: &'r ByteRecord, column: &str) -> Result<&'r str, RowError> {
        let bytes = self
            .index_of(column)
            .and_then(|index| record.get(index))
            .unwrap_or_default();
        decode(bytes, column)
    }

    fn number(&self, record: &ByteRecord, column: &str) -> Result<f64, RowError> {
        let raw = self.raw(record, column)?;
        raw.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| RowError::InvalidNumber {
                column: column.to_string(),
                value: raw.to_string(),
            })
    }

    fn category<T: FromStr>(&self, record: &ByteRecord, column: &str) -> Result<T, RowError> {
        let raw = self.raw(record, column)?;
        raw.parse::<T>().map_err(|_| RowError::InvalidCategory {
            column: column.to_string(),
            value: raw.to_string(),
        })
    }
}

fn decode<'r>(bytes: &'r [u8], column: &str) -> Result<&'r str, RowError> {
    std::str::from_utf8(bytes).map_err(|_| RowError::InvalidEncoding {
        column: column.to_string(),
    })
}

fn optional(
    record: &ByteRecord,
    index: Option<usize>,
    column: &str,
) -> Result<Option<String>, RowError> {
    match index.and_then(|index| record.get(index)) {
        Some(bytes) => {
            let value = decode(bytes, column)?;
            Ok((!value.is_empty()).then(|| value.to_string()))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::domain::{Motivation, PeerInfluence, YesNo};
    use std::io::Cursor;

    const HEADER: &str = "Hours_Studied,Attendance,Sleep_Hours,Previous_Scores,Tutoring_Sessions,Physical_Activity,Motivation_Level,Internet_Access,Learning_Disabilities,Peer_Influence,Exam_Score,School_Type,Gender";

    fn parse(body: &str) -> Result<ParsedBatch, BatchError> {
        parse_students(Cursor::new(format!("{HEADER}\n{body}")))
    }

    #[test]
    fn parses_complete_rows() {
        let batch = parse("23,84,7,73,0,3,Low,Yes,No,Positive,67,Public,Male\n")
            .expect("batch parses");

        assert_eq!(batch.total_rows, 1);
        assert!(batch.rejected.is_empty());
        let (row, student) = &batch.students[0];
        assert_eq!(*row, 1);
        assert_eq!(student.hours_studied, 23.0);
        assert_eq!(student.exam_score, 67.0);
        assert_eq!(student.motivation_level, Motivation::Low);
        assert_eq!(student.internet_access, YesNo::Yes);
        assert_eq!(student.learning_disabilities, YesNo::No);
        assert_eq!(student.peer_influence, PeerInfluence::Positive);
        assert_eq!(student.school.as_deref(), Some("Public"));
        assert_eq!(student.gender.as_deref(), Some("Male"));
    }

    #[test]
    fn header_order_is_free_and_context_columns_optional() {
        let csv = "Exam_Score,Peer_Influence,Learning_Disabilities,Internet_Access,Motivation_Level,Physical_Activity,Tutoring_Sessions,Previous_Scores,Sleep_Hours,Attendance,Hours_Studied\n\
                   61, negative ,yes,NO,high,4,2,88,6,70,12\n";
        let batch = parse_students(Cursor::new(csv)).expect("batch parses");

        let (_, student) = &batch.students[0];
        assert_eq!(student.exam_score, 61.0);
        assert_eq!(student.hours_studied, 12.0);
        assert_eq!(student.peer_influence, PeerInfluence::Negative);
        assert_eq!(student.motivation_level, Motivation::High);
        assert_eq!(student.internet_access, YesNo::No);
        assert_eq!(student.school, None);
        assert_eq!(student.gender, None);
    }

    #[test]
    fn missing_headers_abort_the_batch() {
        let csv = "Hours_Studied,Attendance,Sleep_Hours,Previous_Scores,Tutoring_Sessions,Physical_Activity,Motivation_Level,Internet_Access,Learning_Disabilities\n";
        let error = parse_students(Cursor::new(csv)).expect_err("schema is incomplete");

        match error {
            BatchError::Schema(SchemaError::MissingHeaders(missing)) => {
                assert_eq!(missing, vec!["Peer_Influence", "Exam_Score"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_input_is_a_schema_error() {
        let error = parse_students(Cursor::new("")).expect_err("no header row");
        assert!(matches!(
            error,
            BatchError::Schema(SchemaError::MissingHeaders(ref missing)) if missing.len() == 11
        ));
    }

    #[test]
    fn short_rows_are_counted_and_skipped() {
        let batch = parse(
            "23,84,7,73,0,3,Low,Yes,No,Positive,67,Public,Male\n\
             19,64,8\n\
             24,98,7,91,2,4,Medium,Yes,No,Neutral,74,Private,Female\n",
        )
        .expect("batch parses");

        assert_eq!(batch.total_rows, 3);
        assert_eq!(batch.students.len(), 2);
        assert_eq!(batch.students[1].0, 3);
        assert_eq!(
            batch.rejected,
            vec![RejectedRow {
                row: 2,
                error: RowError::InsufficientColumns {
                    column: "Previous_Scores".to_string(),
                    found: 3,
                    required: 4,
                },
            }]
        );
    }

    #[test]
    fn rows_without_context_columns_still_parse() {
        let batch = parse("23,84,7,73,0,3,Low,Yes,No,Positive,67\n").expect("batch parses");
        let (_, student) = &batch.students[0];
        assert_eq!(student.school, None);
        assert_eq!(student.gender, None);
    }

    #[test]
    fn unparseable_numbers_are_rejected_not_propagated() {
        let batch = parse(
            "abc,84,7,73,0,3,Low,Yes,No,Positive,67,Public,Male\n\
             23,NaN,7,73,0,3,Low,Yes,No,Positive,67,Public,Male\n\
             23,84,7,73,0,3,Low,Yes,No,Positive,,Public,Male\n",
        )
        .expect("batch parses");

        assert!(batch.students.is_empty());
        let errors: Vec<RowError> = batch.rejected.into_iter().map(|r| r.error).collect();
        assert_eq!(
            errors,
            vec![
                RowError::InvalidNumber {
                    column: "Hours_Studied".to_string(),
                    value: "abc".to_string()
                },
                RowError::InvalidNumber {
                    column: "Attendance".to_string(),
                    value: "NaN".to_string()
                },
                RowError::InvalidNumber {
                    column: "Exam_Score".to_string(),
                    value: String::new()
                },
            ]
        );
    }

    #[test]
    fn unknown_categories_are_rejected() {
        let batch = parse("23,84,7,73,0,3,Extreme,Yes,No,Positive,67,Public,Male\n")
            .expect("batch parses");
        assert_eq!(
            batch.rejected[0].error,
            RowError::InvalidCategory {
                column: "Motivation_Level".to_string(),
                value: "Extreme".to_string()
            }
        );
    }

    #[test]
    fn badly_encoded_rows_are_rejected_without_failing_the_batch() {
        let mut body = format!("{HEADER}\n").into_bytes();
        body.extend_from_slice(b"23,84,7,73,0,3,Low,Yes,No,Positive,67,Public,Male\n");
        body.extend_from_slice(b"19,64,8,59,2,4,Low,Yes,No,Negative,61,Pub\xfflic,Female\n");
        body.extend_from_slice(b"24,98,7,91,2,4,Medium,Yes,No,Neutral,74,Private,Female\n");
        body.extend_from_slice(b"20,\xff80,7,70,1,3,Medium,Yes,No,Neutral,70,Public,Male\n");

        let batch = parse_students(Cursor::new(body)).expect("batch parses");

        assert_eq!(batch.total_rows, 4);
        let accepted: Vec<usize> = batch.students.iter().map(|(row, _)| *row).collect();
        assert_eq!(accepted, vec![1, 3]);
        assert_eq!(
            batch.rejected,
            vec![
                RejectedRow {
                    row: 2,
                    error: RowError::InvalidEncoding {
                        column: "School_Type".to_string(),
                    },
                },
                RejectedRow {
                    row: 4,
                    error: RowError::InvalidEncoding {
                        column: "Attendance".to_string(),
                    },
                },
            ]
        );
    }

    #[test]
    fn encoding_is_not_checked_in_unused_columns() {
        let mut body =
            b"Hours_Studied,Attendance,Sleep_Hours,Previous_Scores,Tutoring_Sessions,Physical_Activity,Motivation_Level,Internet_Access,Learning_Disabilities,Peer_Influence,Exam_Score,Notes\n"
                .to_vec();
        body.extend_from_slice(b"23,84,7,73,0,3,Low,Yes,No,Positive,67,caf\xe9\n");

        let batch = parse_students(Cursor::new(body)).expect("batch parses");
        assert_eq!(batch.students.len(), 1);
        assert!(batch.rejected.is_empty());
    }
}
