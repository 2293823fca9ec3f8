use serde::{Deserialize, Serialize};

use super::super::catalog::PersonaId;
use super::super::model::ConfigurationError;
use super::PersonaTraits;

/// Single comparison against raw traits. Lower band bounds are never written
/// out: rule order supplies them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "when", content = "value", rename_all = "snake_case")]
pub enum Predicate {
    ScoreBelow(f64),
    AttendanceAtLeast(f64),
    AttendanceBelow(f64),
    PreviousAtLeast(f64),
    /// Current score sits more than `margin` points under the previous score.
    ScoreBelowPreviousBy(f64),
    Always,
}

impl Predicate {
    pub fn holds(&self, traits: &PersonaTraits) -> bool {
        match *self {
            Predicate::ScoreBelow(limit) => traits.score < limit,
            Predicate::AttendanceAtLeast(limit) => traits.attendance >= limit,
            Predicate::AttendanceBelow(limit) => traits.attendance < limit,
            Predicate::PreviousAtLeast(limit) => traits.previous_score >= limit,
            Predicate::ScoreBelowPreviousBy(margin) => {
                traits.score < traits.previous_score - margin
            }
            Predicate::Always => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateRule {
    pub label: String,
    pub when: Vec<Predicate>,
    pub persona: PersonaId,
}

impl GateRule {
    pub fn new(label: &str, when: &[Predicate], persona: PersonaId) -> Self {
        Self {
            label: label.to_string(),
            when: when.to_vec(),
            persona,
        }
    }

    pub fn matches(&self, traits: &PersonaTraits) -> bool {
        self.when.iter().all(|predicate| predicate.holds(traits))
    }

    fn is_unconditional(&self) -> bool {
        self.when
            .iter()
            .all(|predicate| matches!(predicate, Predicate::Always))
    }
}

/// Ordered gate cascade; the first matching rule wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GateRule>", into = "Vec<GateRule>")]
pub struct PersonaPolicy {
    rules: Vec<GateRule>,
}

impl PersonaPolicy {
    /// Requires a trailing unconditional rule so every input resolves.
    pub fn new(rules: Vec<GateRule>) -> Result<Self, ConfigurationError> {
        match rules.last() {
            Some(rule) if rule.is_unconditional() => Ok(Self { rules }),
            _ => Err(ConfigurationError::OpenPolicy),
        }
    }

    pub fn standard() -> Self {
        use Predicate::*;
        use PersonaId::*;

        let rules = vec![
            // score < 63: the current collapse is ground truth, history decides
            GateRule::new(
                "slip from strong history",
                &[ScoreBelow(63.0), PreviousAtLeast(78.0)],
                PotentialBloomer,
            ),
            GateRule::new("low score", &[ScoreBelow(63.0)], StrugglingLearner),
            // 63 <= score < 70: never a Driven Achiever
            GateRule::new(
                "mid-low score, high attendance",
                &[ScoreBelow(70.0), AttendanceAtLeast(85.0)],
                ConsistentWorker,
            ),
            GateRule::new(
                "mid-low score, sharp drop from history",
                &[
                    ScoreBelow(70.0),
                    PreviousAtLeast(80.0),
                    ScoreBelowPreviousBy(8.0),
                ],
                PotentialBloomer,
            ),
            GateRule::new(
                "mid-low score, fair attendance",
                &[ScoreBelow(70.0), AttendanceAtLeast(75.0)],
                PassiveCoaster,
            ),
            GateRule::new(
                "mid-low score, poor attendance",
                &[ScoreBelow(70.0), AttendanceBelow(72.0)],
                StrugglingLearner,
            ),
            GateRule::new(
                "mid-low score, borderline attendance",
                &[ScoreBelow(70.0)],
                PassiveCoaster,
            ),
            // 70 <= score < 75
            GateRule::new(
                "mid score, strong attendance",
                &[ScoreBelow(75.0), AttendanceAtLeast(82.0)],
                DrivenAchiever,
            ),
            GateRule::new(
                "mid score, steady attendance",
                &[ScoreBelow(75.0), AttendanceAtLeast(72.0)],
                ConsistentWorker,
            ),
            GateRule::new(
                "mid score, strong history",
                &[ScoreBelow(75.0), PreviousAtLeast(78.0)],
                PotentialBloomer,
            ),
            GateRule::new(
                "mid score, weak engagement",
                &[ScoreBelow(75.0)],
                StrugglingLearner,
            ),
            // score >= 75
            GateRule::new("high score", &[Always], DrivenAchiever),
        ];

        Self { rules }
    }

    pub fn rules(&self) -> &[GateRule] {
        &self.rules
    }

    pub fn first_match(&self, traits: &PersonaTraits) -> &GateRule {
        self.rules
            .iter()
            .find(|rule| rule.matches(traits))
            .unwrap_or_else(|| {
                // unreachable: construction guarantees an unconditional tail
                &self.rules[self.rules.len() - 1]
            })
    }
}

impl Default for PersonaPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<GateRule>> for PersonaPolicy {
    type Error = ConfigurationError;

    fn try_from(value: Vec<GateRule>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PersonaPolicy> for Vec<GateRule> {
    fn from(policy: PersonaPolicy) -> Self {
        policy.rules
    }
}
