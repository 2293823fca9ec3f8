mod policy;

pub use policy::{GateRule, PersonaPolicy, Predicate};

use serde::{Deserialize, Serialize};

use super::catalog::PersonaId;
use super::domain::Motivation;

/// Raw, unnormalized traits consulted by the gate cascade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonaTraits {
    pub score: f64,
    pub attendance: f64,
    pub motivation: Motivation,
    pub hours: f64,
    pub previous_score: f64,
    /// Carried for policies that want it; no standard gate reads it.
    #[serde(default)]
    pub risk_score: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaDecision {
    pub persona: PersonaId,
    pub rule: String,
}

/// Stateless resolver that applies the gate cascade to raw traits.
#[derive(Debug, Clone, Default)]
pub struct PersonaResolver {
    policy: PersonaPolicy,
}

impl PersonaResolver {
    pub fn new(policy: PersonaPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PersonaPolicy {
        &self.policy
    }

    /// The centroid suggestion is advisory: it is accepted for auditing but no
    /// gate consults it, so traits alone decide the persona.
    pub fn resolve(&self, traits: &PersonaTraits, _suggestion: PersonaId) -> PersonaDecision {
        let rule = self.policy.first_match(traits);
        PersonaDecision {
            persona: rule.persona,
            rule: rule.label.clone(),
        }
    }
}
