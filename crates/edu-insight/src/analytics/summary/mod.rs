//! Aggregate KPIs and breakdowns over a scored population.
//!
//! The summary is computed once per dataset (or loaded precomputed) and is not
//! re-aggregated when view filters change; [`AnalyticsSummary::estimate_count`]
//! only re-weights it proportionally.

mod context;
mod distribution;

pub use context::assistant_context;
pub use distribution::{ScoreBucket, ScoreDistribution};

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::catalog::{PersonaCatalog, PersonaId};
use super::domain::{Motivation, ScoredRecord};
use super::model::ConfigurationError;
use super::risk::RiskTier;
use super::view::{Facet, FacetFilters};
use distribution::{banded_scores, correlations, score_distribution, ATTENDANCE_BANDS, HOUR_BANDS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub total: usize,
    pub avg_score: f64,
    pub avg_attend: f64,
    pub avg_hours: f64,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
    pub top_cluster: String,
    pub top_cluster_pct: f64,
}

impl Kpis {
    /// Share of High-tier students as a percentage; 0 for an empty population.
    pub fn high_risk_pct(&self) -> f64 {
        percentage(self.high_risk, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    #[serde(deserialize_with = "persona_id_or_index")]
    pub id: PersonaId,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub description: String,
    pub strategies: Vec<String>,
    pub count: usize,
    pub avg_score: f64,
    pub avg_hours: f64,
    pub avg_attend: f64,
    pub avg_tutor: f64,
    pub avg_sleep: f64,
    pub avg_prev: f64,
    pub risk_high: usize,
}

/// Precomputed summaries may leave out averages a breakdown does not track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetStats {
    pub count: usize,
    #[serde(default)]
    pub avg_score: f64,
    #[serde(default)]
    pub avg_attend: f64,
    #[serde(default)]
    pub avg_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub kpis: Kpis,
    pub clusters: Vec<ClusterSummary>,
    pub by_school: BTreeMap<String, FacetStats>,
    pub by_gender: BTreeMap<String, FacetStats>,
    #[serde(alias = "by_motiv")]
    pub by_motivation: BTreeMap<String, FacetStats>,
    /// Pearson r of each feature against exam score, rounded to 4 decimals.
    #[serde(default)]
    pub correlations: BTreeMap<String, f64>,
    #[serde(default, alias = "score_dist")]
    pub score_distribution: ScoreDistribution,
    #[serde(default)]
    pub attend_score: Vec<ScoreBucket>,
    #[serde(default)]
    pub hour_score: Vec<ScoreBucket>,
}

/// Accepts a persona either by name or by its numeric id.
fn persona_id_or_index<'de, D>(deserializer: D) -> Result<PersonaId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPersona {
        Index(usize),
        Name(PersonaId),
    }

    match RawPersona::deserialize(deserializer)? {
        RawPersona::Name(persona) => Ok(persona),
        RawPersona::Index(index) => PersonaId::from_index(index).ok_or_else(|| {
            serde::de::Error::custom(format!("persona id {index} is out of range"))
        }),
    }
}

/// Running sums for one group of records.
#[derive(Debug, Default, Clone)]
struct Tally {
    count: usize,
    score: f64,
    attend: f64,
    hours: f64,
    tutor: f64,
    sleep: f64,
    prev: f64,
    risk_high: usize,
}

impl Tally {
    fn add(&mut self, scored: &ScoredRecord) {
        let record = &scored.record;
        self.count += 1;
        self.score += record.exam_score;
        self.attend += record.attendance;
        self.hours += record.hours_studied;
        self.tutor += record.tutoring_sessions;
        self.sleep += record.sleep_hours;
        self.prev += record.previous_scores;
        if scored.risk.tier == RiskTier::High {
            self.risk_high += 1;
        }
    }

    fn mean(&self, sum: f64) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            round2(sum / self.count as f64)
        }
    }

    fn facet_stats(&self) -> FacetStats {
        FacetStats {
            count: self.count,
            avg_score: self.mean(self.score),
            avg_attend: self.mean(self.attend),
            avg_hours: self.mean(self.hours),
        }
    }
}

impl AnalyticsSummary {
    pub fn from_records(records: &[ScoredRecord], catalog: &PersonaCatalog) -> Self {
        let mut overall = Tally::default();
        let mut per_persona: BTreeMap<PersonaId, Tally> = BTreeMap::new();
        let mut by_school: BTreeMap<String, Tally> = BTreeMap::new();
        let mut by_gender: BTreeMap<String, Tally> = BTreeMap::new();
        let mut by_motivation: BTreeMap<String, Tally> = BTreeMap::new();
        let mut tiers = [0usize; 3];

        for scored in records {
            overall.add(scored);
            per_persona.entry(scored.persona()).or_default().add(scored);
            tiers[usize::from(scored.risk.tier.rank())] += 1;

            if let Some(school) = &scored.record.school {
                by_school.entry(school.clone()).or_default().add(scored);
            }
            if let Some(gender) = &scored.record.gender {
                by_gender.entry(gender.clone()).or_default().add(scored);
            }
            by_motivation
                .entry(scored.record.motivation_level.label().to_string())
                .or_default()
                .add(scored);
        }

        let clusters: Vec<ClusterSummary> = PersonaId::ordered()
            .into_iter()
            .map(|persona| {
                let tally = per_persona.remove(&persona).unwrap_or_default();
                let profile = catalog.profile(persona);
                ClusterSummary {
                    id: persona,
                    name: profile.name.clone(),
                    icon: profile.icon.clone(),
                    color: profile.color.clone(),
                    description: profile.description.clone(),
                    strategies: profile.strategies.clone(),
                    count: tally.count,
                    avg_score: tally.mean(tally.score),
                    avg_hours: tally.mean(tally.hours),
                    avg_attend: tally.mean(tally.attend),
                    avg_tutor: tally.mean(tally.tutor),
                    avg_sleep: tally.mean(tally.sleep),
                    avg_prev: tally.mean(tally.prev),
                    risk_high: tally.risk_high,
                }
            })
            .collect();

        // strictly greater keeps the lowest id on ties
        let top = clusters
            .iter()
            .filter(|cluster| cluster.count > 0)
            .fold(None::<&ClusterSummary>, |best, cluster| match best {
                Some(current) if current.count >= cluster.count => Some(current),
                _ => Some(cluster),
            });

        let kpis = Kpis {
            total: overall.count,
            avg_score: overall.mean(overall.score),
            avg_attend: overall.mean(overall.attend),
            avg_hours: overall.mean(overall.hours),
            high_risk: tiers[usize::from(RiskTier::High.rank())],
            medium_risk: tiers[usize::from(RiskTier::Medium.rank())],
            low_risk: tiers[usize::from(RiskTier::Low.rank())],
            top_cluster: top.map(|cluster| cluster.name.clone()).unwrap_or_default(),
            top_cluster_pct: top
                .map(|cluster| round1(percentage(cluster.count, overall.count)))
                .unwrap_or(0.0),
        };

        let finish = |groups: BTreeMap<String, Tally>| {
            groups
                .into_iter()
                .map(|(key, tally)| (key, tally.facet_stats()))
                .collect::<BTreeMap<_, _>>()
        };

        Self {
            kpis,
            clusters,
            by_school: finish(by_school),
            by_gender: finish(by_gender),
            by_motivation: finish(by_motivation),
            correlations: correlations(records),
            score_distribution: score_distribution(records),
            attend_score: banded_scores(records, &ATTENDANCE_BANDS, |record| record.attendance),
            hour_score: banded_scores(records, &HOUR_BANDS, |record| record.hours_studied),
        }
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn cluster(&self, persona: PersonaId) -> Option<&ClusterSummary> {
        self.clusters.iter().find(|cluster| cluster.id == persona)
    }

    /// Proportional head-count for the active facets, treating them as
    /// independent. Facet values absent from the summary contribute no
    /// narrowing.
    pub fn estimate_count(&self, filters: &FacetFilters) -> usize {
        let total = self.kpis.total;
        if total == 0 {
            return 0;
        }

        let fraction = [
            (&filters.school, &self.by_school),
            (&filters.gender, &self.by_gender),
            (&filters.motivation, &self.by_motivation),
        ]
        .into_iter()
        .filter_map(|(facet, groups)| match facet {
            Facet::All => None,
            Facet::Exactly(value) => Some(
                groups
                    .get(value)
                    .map(|stats| stats.count as f64 / total as f64)
                    .unwrap_or(1.0),
            ),
        })
        .product::<f64>();

        (total as f64 * fraction).round() as usize
    }

    /// Correlations ordered by strength, strongest first.
    pub fn strongest_correlations(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .correlations
            .iter()
            .map(|(feature, r)| (feature.as_str(), *r))
            .collect();
        ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        ranked
    }

    /// Motivation breakdown in Low, Medium, High order.
    pub fn motivation_breakdown(&self) -> Vec<(Motivation, &FacetStats)> {
        Motivation::ordered()
            .into_iter()
            .filter_map(|level| {
                self.by_motivation
                    .get(level.label())
                    .map(|stats| (level, stats))
            })
            .collect()
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::engine::PersonaEngine;
    use crate::analytics::test_support::student;

    fn population() -> Vec<ScoredRecord> {
        let engine = PersonaEngine::standard();
        let shapes: [(f64, f64, &str, &str); 4] = [
            (90.0, 95.0, "Public", "Male"),
            (88.0, 92.0, "Public", "Female"),
            (50.0, 60.0, "Private", "Female"),
            (66.0, 78.0, "Public", "Female"),
        ];
        shapes
            .into_iter()
            .enumerate()
            .map(|(index, (score, attendance, school, gender))| {
                let mut record = student();
                record.exam_score = score;
                record.attendance = attendance;
                record.school = Some(school.to_string());
                record.gender = Some(gender.to_string());
                engine.score(index + 1, record)
            })
            .collect()
    }

    #[test]
    fn kpis_cover_the_whole_population() {
        let summary = AnalyticsSummary::from_records(&population(), &PersonaCatalog::standard());
        let kpis = &summary.kpis;

        assert_eq!(kpis.total, 4);
        assert_eq!(kpis.avg_score, 73.5);
        assert_eq!(kpis.avg_attend, 81.25);
        assert_eq!(kpis.high_risk + kpis.medium_risk + kpis.low_risk, 4);
        assert_eq!(kpis.top_cluster, "Driven Achiever");
        assert_eq!(kpis.top_cluster_pct, 50.0);
    }

    #[test]
    fn clusters_list_every_persona_in_id_order() {
        let summary = AnalyticsSummary::from_records(&population(), &PersonaCatalog::standard());

        let ids: Vec<PersonaId> = summary.clusters.iter().map(|c| c.id).collect();
        assert_eq!(ids, PersonaId::ordered().to_vec());
        let achievers = summary
            .cluster(PersonaId::DrivenAchiever)
            .expect("cluster present");
        assert_eq!(achievers.count, 2);
        assert_eq!(achievers.avg_score, 89.0);
        let workers = summary
            .cluster(PersonaId::ConsistentWorker)
            .expect("cluster present");
        assert_eq!(workers.count, 0);
        assert_eq!(workers.avg_score, 0.0);
    }

    #[test]
    fn facets_group_by_exact_value() {
        let summary = AnalyticsSummary::from_records(&population(), &PersonaCatalog::standard());

        assert_eq!(summary.by_school["Public"].count, 3);
        assert_eq!(summary.by_school["Private"].count, 1);
        assert_eq!(summary.by_gender["Female"].count, 3);
        assert_eq!(summary.by_gender["Female"].avg_score, 68.0);
        assert_eq!(summary.motivation_breakdown().len(), 1);
    }

    #[test]
    fn estimate_multiplies_facet_shares() {
        let summary = AnalyticsSummary::from_records(&population(), &PersonaCatalog::standard());

        let mut filters = FacetFilters::default();
        assert_eq!(summary.estimate_count(&filters), 4);

        filters.school = Facet::from("Public");
        filters.gender = Facet::from("Female");
        // 4 * 3/4 * 3/4 = 2.25
        assert_eq!(summary.estimate_count(&filters), 2);

        filters.motivation = Facet::from("Unknown");
        assert_eq!(summary.estimate_count(&filters), 2);
    }

    #[test]
    fn empty_population_yields_zeroes() {
        let summary = AnalyticsSummary::from_records(&[], &PersonaCatalog::standard());
        assert_eq!(summary.kpis.total, 0);
        assert_eq!(summary.kpis.avg_score, 0.0);
        assert_eq!(summary.kpis.top_cluster, "");
        assert_eq!(summary.kpis.high_risk_pct(), 0.0);
        assert_eq!(summary.estimate_count(&FacetFilters::default()), 0);
        assert!(summary.by_school.is_empty());
    }

    #[test]
    fn precomputed_summary_accepts_short_motivation_key() {
        let summary = AnalyticsSummary::from_records(&population(), &PersonaCatalog::standard());
        let json = serde_json::to_string(&summary)
            .expect("serialize summary")
            .replace("by_motivation", "by_motiv");

        let loaded: AnalyticsSummary = serde_json::from_str(&json).expect("summary parses");
        assert_eq!(loaded, summary);
    }

    #[test]
    fn distributions_are_computed_with_the_summary() {
        let summary = AnalyticsSummary::from_records(&population(), &PersonaCatalog::standard());

        assert_eq!(summary.score_distribution.counts.iter().sum::<usize>(), 4);
        let attend: Vec<usize> = summary.attend_score.iter().map(|b| b.count).collect();
        assert_eq!(attend, vec![0, 1, 1, 0, 2]);
        assert_eq!(summary.attend_score[4].avg_score, 89.0);
        assert_eq!(summary.hour_score[2].count, 4);
        assert!(summary.correlations["Attendance"] > 0.9);
    }

    #[test]
    fn strongest_correlations_rank_by_magnitude() {
        let mut summary = AnalyticsSummary::from_records(&[], &PersonaCatalog::standard());
        summary.correlations = BTreeMap::from([
            ("Attendance".to_string(), 0.58),
            ("Hours Studied".to_string(), 0.45),
            ("Peer Influence".to_string(), -0.61),
        ]);

        let ranked: Vec<&str> = summary
            .strongest_correlations()
            .into_iter()
            .map(|(feature, _)| feature)
            .collect();
        assert_eq!(ranked, vec!["Peer Influence", "Attendance", "Hours Studied"]);
    }

    #[test]
    fn cluster_ids_load_from_names_or_numbers() {
        let summary = AnalyticsSummary::from_records(&population(), &PersonaCatalog::standard());
        let mut value = serde_json::to_value(&summary).expect("serialize summary");
        value["clusters"][4]["id"] = serde_json::json!(4);
        value["clusters"][1]["id"] = serde_json::json!("consistent_worker");

        let loaded: AnalyticsSummary = serde_json::from_value(value.clone()).expect("summary parses");
        assert_eq!(loaded.clusters[4].id, PersonaId::PotentialBloomer);
        assert_eq!(loaded.clusters[1].id, PersonaId::ConsistentWorker);

        value["clusters"][0]["id"] = serde_json::json!(7);
        assert!(serde_json::from_value::<AnalyticsSummary>(value).is_err());
    }

    #[test]
    fn facet_stats_tolerate_missing_averages() {
        let stats: FacetStats =
            serde_json::from_str(r#"{"count": 12, "avg_score": 67.1}"#).expect("stats parse");
        assert_eq!(stats.count, 12);
        assert_eq!(stats.avg_attend, 0.0);
        assert_eq!(stats.avg_hours, 0.0);
    }
}
