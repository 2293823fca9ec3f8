//! Filter, sort and paginate over an already scored population.
//!
//! Everything here is a pure function of the dataset and a [`ViewState`];
//! records are only borrowed and reordered, never modified.

mod sort;
mod state;

pub use sort::SortColumn;
pub use state::{Facet, FacetFilters, Scope, SortSpec, ViewAction, ViewState};

use serde::Serialize;

use super::domain::ScoredRecord;
use super::risk::RiskTier;

pub const PAGE_SIZE: usize = 10;

/// Upper bound on the precomputed high-risk subset.
pub const HIGH_RISK_LIMIT: usize = 50;

/// Scored population plus the high-risk subset, fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct ScoredDataset {
    records: Vec<ScoredRecord>,
    high_risk: Vec<usize>,
}

impl ScoredDataset {
    pub fn new(records: Vec<ScoredRecord>) -> Self {
        let mut high_risk: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, scored)| scored.risk.tier == RiskTier::High)
            .map(|(index, _)| index)
            .collect();
        high_risk.sort_by(|a, b| {
            records[*b]
                .risk
                .risk_score
                .cmp(&records[*a].risk.risk_score)
        });
        high_risk.truncate(HIGH_RISK_LIMIT);

        Self { records, high_risk }
    }

    pub fn records(&self) -> &[ScoredRecord] {
        &self.records
    }

    pub fn high_risk(&self) -> impl Iterator<Item = &ScoredRecord> + '_ {
        self.high_risk.iter().map(|index| &self.records[*index])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn source(&self, scope: Scope) -> Vec<&ScoredRecord> {
        match scope {
            Scope::AllStudents => self.records.iter().collect(),
            Scope::HighRiskOnly => self.high_risk().collect(),
        }
    }
}

impl From<Vec<ScoredRecord>> for ScoredDataset {
    fn from(records: Vec<ScoredRecord>) -> Self {
        Self::new(records)
    }
}

/// Pagination metadata. `start_idx` is inclusive and `end_idx` exclusive,
/// both 0-based offsets into the filtered, sorted rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub total_rows: usize,
    pub total_pages: usize,
    pub page: usize,
    pub start_idx: usize,
    pub end_idx: usize,
}

impl PageMeta {
    pub fn paginate(total_rows: usize, requested: usize) -> Self {
        let total_pages = total_rows.div_ceil(PAGE_SIZE);
        if total_pages == 0 {
            return Self {
                total_rows,
                total_pages,
                page: 1,
                start_idx: 0,
                end_idx: 0,
            };
        }

        let page = requested.clamp(1, total_pages);
        let start_idx = (page - 1) * PAGE_SIZE;
        Self {
            total_rows,
            total_pages,
            page,
            start_idx,
            end_idx: (start_idx + PAGE_SIZE).min(total_rows),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView<'a> {
    pub rows: Vec<&'a ScoredRecord>,
    pub meta: PageMeta,
}

pub fn build_view<'a>(dataset: &'a ScoredDataset, state: &ViewState) -> TableView<'a> {
    let mut rows: Vec<&ScoredRecord> = dataset
        .source(state.scope)
        .into_iter()
        .filter(|scored| state.filters.matches(scored))
        .collect();

    if let Some(spec) = state.sort {
        rows.sort_by(|a, b| spec.compare(a, b));
    }

    let meta = PageMeta::paginate(rows.len(), state.page);
    rows.truncate(meta.end_idx);
    rows.drain(..meta.start_idx);

    TableView { rows, meta }
}
