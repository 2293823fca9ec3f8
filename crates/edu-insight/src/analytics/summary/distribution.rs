//! Exam-score distributions and feature correlations over a scored population.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Tally;
use crate::analytics::domain::{PeerInfluence, ScoredRecord, StudentRecord};

/// Histogram of exam scores. Each bucket is labelled with its inclusive upper
/// bound; the last bucket also absorbs every higher score.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreDistribution {
    pub labels: Vec<String>,
    pub counts: Vec<usize>,
}

/// Mean exam score of the records whose banded value falls in `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBucket {
    pub label: String,
    pub avg_score: f64,
    pub count: usize,
}

/// Half-open `[min, max)` band over one raw field.
pub(crate) struct Band {
    label: &'static str,
    min: f64,
    max: f64,
}

const fn band(label: &'static str, min: f64, max: f64) -> Band {
    Band { label, min, max }
}

pub(crate) const ATTENDANCE_BANDS: [Band; 5] = [
    band("<60%", 0.0, 60.0),
    band("60-70%", 60.0, 70.0),
    band("70-80%", 70.0, 80.0),
    band("80-90%", 80.0, 90.0),
    band("90%+", 90.0, 101.0),
];

pub(crate) const HOUR_BANDS: [Band; 5] = [
    band("0-10h", 0.0, 10.0),
    band("10-20h", 10.0, 20.0),
    band("20-30h", 20.0, 30.0),
    band("30-40h", 30.0, 40.0),
    band("40h+", 40.0, 999.0),
];

const SCORE_CEILING_FIRST: u32 = 55;
const SCORE_CEILING_LAST: u32 = 100;
const SCORE_CEILING_STEP: usize = 3;

pub(crate) fn score_distribution(records: &[ScoredRecord]) -> ScoreDistribution {
    let ceilings: Vec<u32> = (SCORE_CEILING_FIRST..=SCORE_CEILING_LAST)
        .step_by(SCORE_CEILING_STEP)
        .collect();
    let last = ceilings.len() - 1;
    let mut counts = vec![0; ceilings.len()];

    for scored in records {
        let score = scored.record.exam_score;
        let slot = ceilings
            .iter()
            .position(|ceiling| score <= f64::from(*ceiling))
            .unwrap_or(last);
        counts[slot] += 1;
    }

    ScoreDistribution {
        labels: ceilings.iter().map(u32::to_string).collect(),
        counts,
    }
}

/// Values outside every band are left uncounted.
pub(crate) fn banded_scores(
    records: &[ScoredRecord],
    bands: &[Band],
    value: fn(&StudentRecord) -> f64,
) -> Vec<ScoreBucket> {
    bands
        .iter()
        .map(|band| {
            let mut tally = Tally::default();
            for scored in records {
                let banded = value(&scored.record);
                if band.min <= banded && banded < band.max {
                    tally.add(scored);
                }
            }
            ScoreBucket {
                label: band.label.to_string(),
                avg_score: tally.mean(tally.score),
                count: tally.count,
            }
        })
        .collect()
}

/// Features correlated against exam score. Categoricals use their ordinal
/// encoding (Low/Medium/High as 0/1/2, No/Yes as 0/1).
const CORRELATED_FEATURES: [(&str, fn(&StudentRecord) -> f64); 9] = [
    ("Hours Studied", |record| record.hours_studied),
    ("Attendance", |record| record.attendance),
    ("Sleep Hours", |record| record.sleep_hours),
    ("Previous Scores", |record| record.previous_scores),
    ("Tutoring Sessions", |record| record.tutoring_sessions),
    ("Physical Activity", |record| record.physical_activity),
    ("Motivation", |record| f64::from(record.motivation_level.rank())),
    ("Peer Influence", |record| peer_rank(record.peer_influence)),
    ("Internet Access", |record| {
        f64::from(u8::from(record.internet_access.is_yes()))
    }),
];

fn peer_rank(peer: PeerInfluence) -> f64 {
    match peer {
        PeerInfluence::Negative => 0.0,
        PeerInfluence::Neutral => 1.0,
        PeerInfluence::Positive => 2.0,
    }
}

pub(crate) fn correlations(records: &[ScoredRecord]) -> BTreeMap<String, f64> {
    let scores: Vec<f64> = records
        .iter()
        .map(|scored| scored.record.exam_score)
        .collect();

    CORRELATED_FEATURES
        .iter()
        .map(|(name, value)| {
            let values: Vec<f64> = records
                .iter()
                .map(|scored| value(&scored.record))
                .collect();
            (name.to_string(), round4(pearson(&values, &scores)))
        })
        .collect()
}

/// Pearson's r; 0 when either side has no variance or there is no data.
fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return 0.0;
    }

    let mean = |values: &[f64]| values.iter().sum::<f64>() / n as f64;
    let (mx, my) = (mean(&xs[..n]), mean(&ys[..n]));

    let mut covariance = 0.0;
    let mut spread_x = 0.0;
    let mut spread_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        covariance += (x - mx) * (y - my);
        spread_x += (x - mx).powi(2);
        spread_y += (y - my).powi(2);
    }

    let denominator = (spread_x * spread_y).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        covariance / denominator
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::engine::PersonaEngine;
    use crate::analytics::test_support::student;

    fn scored(shape: &[(f64, f64, f64)]) -> Vec<ScoredRecord> {
        let engine = PersonaEngine::standard();
        shape
            .iter()
            .enumerate()
            .map(|(index, (score, attendance, hours))| {
                let mut record = student();
                record.exam_score = *score;
                record.attendance = *attendance;
                record.hours_studied = *hours;
                engine.score(index + 1, record)
            })
            .collect()
    }

    fn counts(buckets: &[ScoreBucket]) -> Vec<usize> {
        buckets.iter().map(|bucket| bucket.count).collect()
    }

    #[test]
    fn attendance_bands_are_half_open() {
        let records = scored(&[
            (60.0, 59.9, 20.0),
            (62.0, 60.0, 20.0),
            (70.0, 69.99, 20.0),
            (75.0, 80.0, 20.0),
            (80.0, 90.0, 20.0),
            (90.0, 100.5, 20.0),
            (99.0, 101.0, 20.0),
        ]);

        let buckets = banded_scores(&records, &ATTENDANCE_BANDS, |record| record.attendance);
        assert_eq!(counts(&buckets), vec![1, 2, 0, 1, 2]);
        assert_eq!(buckets[1].label, "60-70%");
        assert_eq!(buckets[1].avg_score, 66.0);
        assert_eq!(buckets[2].avg_score, 0.0);
        assert_eq!(buckets[4].avg_score, 85.0);
    }

    #[test]
    fn hour_bands_are_half_open() {
        let records = scored(&[
            (60.0, 80.0, 9.99),
            (61.0, 80.0, 10.0),
            (62.0, 80.0, 39.5),
            (63.0, 80.0, 40.0),
            (64.0, 80.0, 120.0),
        ]);

        let buckets = banded_scores(&records, &HOUR_BANDS, |record| record.hours_studied);
        assert_eq!(counts(&buckets), vec![1, 1, 0, 1, 2]);
        assert_eq!(buckets[4].label, "40h+");
        assert_eq!(buckets[4].avg_score, 63.5);
    }

    #[test]
    fn score_histogram_uses_inclusive_ceilings() {
        let records = scored(&[
            (40.0, 80.0, 20.0),
            (55.0, 80.0, 20.0),
            (55.5, 80.0, 20.0),
            (58.0, 80.0, 20.0),
            (100.0, 80.0, 20.0),
            (104.0, 80.0, 20.0),
        ]);

        let distribution = score_distribution(&records);
        assert_eq!(distribution.labels.len(), 16);
        assert_eq!(distribution.labels[0], "55");
        assert_eq!(distribution.labels[15], "100");
        assert_eq!(distribution.counts[0], 2);
        assert_eq!(distribution.counts[1], 2);
        assert_eq!(distribution.counts[15], 2);
        assert_eq!(distribution.counts.iter().sum::<usize>(), 6);
    }

    #[test]
    fn correlation_tracks_linear_relationships() {
        let records = scored(&[
            (60.0, 90.0, 10.0),
            (70.0, 80.0, 20.0),
            (80.0, 70.0, 30.0),
        ]);

        let correlations = correlations(&records);
        assert_eq!(correlations["Hours Studied"], 1.0);
        assert_eq!(correlations["Attendance"], -1.0);
        // sleep hours are identical across the sample
        assert_eq!(correlations["Sleep Hours"], 0.0);
        assert_eq!(correlations.len(), CORRELATED_FEATURES.len());
    }

    #[test]
    fn empty_population_has_zeroed_aggregates() {
        let distribution = score_distribution(&[]);
        assert!(distribution.counts.iter().all(|count| *count == 0));
        assert_eq!(distribution.counts.len(), distribution.labels.len());

        let buckets = banded_scores(&[], &HOUR_BANDS, |record| record.hours_studied);
        assert_eq!(counts(&buckets), vec![0; 5]);
        assert!(buckets.iter().all(|bucket| bucket.avg_score == 0.0));

        assert!(correlations(&[]).values().all(|r| *r == 0.0));
        assert_eq!(pearson(&[], &[]), 0.0);
    }
}
