use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use super::sort::SortColumn;
use crate::analytics::domain::ScoredRecord;

/// Exact-match facet constraint. The literal `All` disables it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Facet {
    #[default]
    All,
    Exactly(String),
}

impl Facet {
    pub fn value(&self) -> Option<&str> {
        match self {
            Facet::All => None,
            Facet::Exactly(value) => Some(value),
        }
    }

    pub fn matches(&self, candidate: Option<&str>) -> bool {
        match self {
            Facet::All => true,
            Facet::Exactly(value) => candidate == Some(value.as_str()),
        }
    }
}

impl From<String> for Facet {
    fn from(raw: String) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "All" {
            Facet::All
        } else {
            Facet::Exactly(trimmed.to_string())
        }
    }
}

impl From<&str> for Facet {
    fn from(raw: &str) -> Self {
        Facet::from(raw.to_string())
    }
}

impl From<Facet> for String {
    fn from(facet: Facet) -> Self {
        match facet {
            Facet::All => "All".to_string(),
            Facet::Exactly(value) => value,
        }
    }
}

impl FromStr for Facet {
    type Err = Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(Facet::from(raw))
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value().unwrap_or("All"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetFilters {
    pub school: Facet,
    pub gender: Facet,
    pub motivation: Facet,
}

impl FacetFilters {
    pub fn matches(&self, scored: &ScoredRecord) -> bool {
        let record = &scored.record;
        self.school.matches(record.school.as_deref())
            && self.gender.matches(record.gender.as_deref())
            && self
                .motivation
                .matches(Some(record.motivation_level.label()))
    }

    pub fn is_unfiltered(&self) -> bool {
        [&self.school, &self.gender, &self.motivation]
            .iter()
            .all(|facet| **facet == Facet::All)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    #[default]
    HighRiskOnly,
    AllStudents,
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" | "high_risk" | "high_risk_only" => Ok(Scope::HighRiskOnly),
            "all" | "all_students" => Ok(Scope::AllStudents),
            other => Err(format!("unknown scope '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: SortColumn,
    pub ascending: bool,
}

impl SortSpec {
    pub fn compare(&self, a: &ScoredRecord, b: &ScoredRecord) -> std::cmp::Ordering {
        let ordering = self.column.compare(a, b);
        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

/// Cursor over the table. Owned by the caller and replaced wholesale by
/// [`ViewState::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub filters: FacetFilters,
    pub scope: Scope,
    pub sort: Option<SortSpec>,
    pub page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            filters: FacetFilters::default(),
            scope: Scope::default(),
            sort: None,
            page: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ViewAction {
    SetSchool(Facet),
    SetGender(Facet),
    SetMotivation(Facet),
    SetScope(Scope),
    ClearFilters,
    SortBy(SortColumn),
    GoToPage(usize),
    NextPage,
    PreviousPage,
}

impl ViewAction {
    fn is_navigation(&self) -> bool {
        matches!(
            self,
            ViewAction::GoToPage(_) | ViewAction::NextPage | ViewAction::PreviousPage
        )
    }
}

impl ViewState {
    /// Pure transition. Anything other than page navigation lands on page 1
    /// so a narrowed result set never opens past its end.
    pub fn apply(&self, action: ViewAction) -> ViewState {
        let mut next = self.clone();
        if !action.is_navigation() {
            next.page = 1;
        }

        match action {
            ViewAction::SetSchool(facet) => next.filters.school = facet,
            ViewAction::SetGender(facet) => next.filters.gender = facet,
            ViewAction::SetMotivation(facet) => next.filters.motivation = facet,
            ViewAction::SetScope(scope) => next.scope = scope,
            ViewAction::ClearFilters => next.filters = FacetFilters::default(),
            ViewAction::SortBy(column) => {
                let ascending = match self.sort {
                    Some(active) if active.column == column => !active.ascending,
                    _ => true,
                };
                next.sort = Some(SortSpec { column, ascending });
            }
            ViewAction::GoToPage(page) => next.page = page.max(1),
            ViewAction::NextPage => next.page = self.page.saturating_add(1),
            ViewAction::PreviousPage => next.page = self.page.saturating_sub(1).max(1),
        }

        next
    }
}
