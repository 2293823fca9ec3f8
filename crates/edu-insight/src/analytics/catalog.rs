use serde::{Deserialize, Serialize};

use super::model::ConfigurationError;

/// Behavioral archetype assigned to every scored student.
///
/// Discriminants are the stable persona ids shared with presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaId {
    DrivenAchiever = 0,
    ConsistentWorker = 1,
    PassiveCoaster = 2,
    StrugglingLearner = 3,
    PotentialBloomer = 4,
}

impl PersonaId {
    pub const COUNT: usize = 5;

    pub const fn ordered() -> [Self; Self::COUNT] {
        [
            Self::DrivenAchiever,
            Self::ConsistentWorker,
            Self::PassiveCoaster,
            Self::StrugglingLearner,
            Self::PotentialBloomer,
        ]
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::DrivenAchiever),
            1 => Some(Self::ConsistentWorker),
            2 => Some(Self::PassiveCoaster),
            3 => Some(Self::StrugglingLearner),
            4 => Some(Self::PotentialBloomer),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::DrivenAchiever => "Driven Achiever",
            Self::ConsistentWorker => "Consistent Worker",
            Self::PassiveCoaster => "Passive Coaster",
            Self::StrugglingLearner => "Struggling Learner",
            Self::PotentialBloomer => "Potential Bloomer",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|persona| persona.name() == name)
    }

    /// Sort rank used by the table view; 0 is the most desirable persona.
    /// Differs from id order: Bloomers rank above Coasters.
    pub const fn desirability_rank(self) -> u8 {
        match self {
            Self::DrivenAchiever => 0,
            Self::ConsistentWorker => 1,
            Self::PotentialBloomer => 2,
            Self::PassiveCoaster => 3,
            Self::StrugglingLearner => 4,
        }
    }
}

/// Presentation metadata and intervention strategies for one persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub id: PersonaId,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub strategies: Vec<String>,
}

/// Immutable persona catalog, indexed densely by [`PersonaId`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaCatalog {
    profiles: Vec<PersonaProfile>,
}

impl PersonaCatalog {
    /// Builds a catalog, requiring exactly one profile per persona id.
    pub fn new(mut profiles: Vec<PersonaProfile>) -> Result<Self, ConfigurationError> {
        profiles.sort_by_key(|profile| profile.id);

        for persona in PersonaId::ordered() {
            let matching = profiles
                .iter()
                .filter(|profile| profile.id == persona)
                .count();
            match matching {
                0 => return Err(ConfigurationError::MissingPersona(persona)),
                1 => {}
                _ => return Err(ConfigurationError::DuplicatePersona(persona)),
            }
        }

        Ok(Self { profiles })
    }

    pub fn standard() -> Self {
        let profiles = PersonaId::ordered()
            .into_iter()
            .map(standard_profile)
            .collect();
        Self { profiles }
    }

    pub fn profile(&self, persona: PersonaId) -> &PersonaProfile {
        &self.profiles[persona.index()]
    }

    pub fn profiles(&self) -> &[PersonaProfile] {
        &self.profiles
    }
}

impl Default for PersonaCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl<'de> Deserialize<'de> for PersonaCatalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawCatalog {
            profiles: Vec<PersonaProfile>,
        }

        let raw = RawCatalog::deserialize(deserializer)?;
        PersonaCatalog::new(raw.profiles).map_err(serde::de::Error::custom)
    }
}

fn standard_profile(id: PersonaId) -> PersonaProfile {
    let (icon, color, description, strategies): (&str, &str, &str, [&str; 5]) = match id {
        PersonaId::DrivenAchiever => (
            "\u{1f680}",
            "#7C3AED",
            "High study hours, excellent attendance, strong motivation. These students consistently perform at the top.",
            [
                "Offer advanced challenge projects and enrichment tasks to maintain engagement.",
                "Assign peer mentoring roles to reinforce their own learning through teaching.",
                "Provide access to competitions (Olympiads, subject fairs) and external programs.",
                "Give autonomy in project-based learning; they thrive with creative freedom.",
                "Regularly celebrate milestones to sustain intrinsic motivation long-term.",
            ],
        ),
        PersonaId::ConsistentWorker => (
            "\u{1f4da}",
            "#0EA5E9",
            "Steady attendance and moderate study hours. Reliable performers who respond well to structured learning.",
            [
                "Use structured study plans and weekly goal-setting exercises.",
                "Introduce spaced repetition tools (flashcards, quizzes) for retention.",
                "Leverage collaborative study groups; they excel when paired with peers.",
                "Offer regular, specific feedback to help them identify precise gaps.",
                "Introduce slightly harder problems progressively to build confidence.",
            ],
        ),
        PersonaId::PassiveCoaster => (
            "\u{1f30a}",
            "#F59E0B",
            "Average attendance and minimal study effort. These students coast without clear academic direction.",
            [
                "Connect curriculum topics to real-world interests and career relevance.",
                "Use gamified learning (points, leaderboards) to spark engagement.",
                "Check in one-on-one to understand hidden barriers or personal challenges.",
                "Break tasks into short, achievable micro-goals to build momentum.",
                "Introduce choice in assignments to restore a sense of ownership.",
            ],
        ),
        PersonaId::StrugglingLearner => (
            "\u{1f198}",
            "#EF4444",
            "Low attendance, lower previous scores, and limited resources. High risk of falling behind without support.",
            [
                "Assign a dedicated mentor or tutor for weekly one-on-one sessions.",
                "Coordinate with parents/guardians to reinforce learning at home.",
                "Use multi-modal teaching (videos, hands-on activities) to suit diverse styles.",
                "Ensure access to school resources: library, devices, tutoring programs.",
                "Create safe, judgment-free classroom environments to reduce anxiety.",
            ],
        ),
        PersonaId::PotentialBloomer => (
            "\u{1f331}",
            "#10B981",
            "High previous scores but lower current engagement or attendance. Untapped potential waiting to be unlocked.",
            [
                "Investigate recent disengagement: personal, social, or academic triggers.",
                "Reignite curiosity with exploratory, discovery-based learning activities.",
                "Connect them with inspiring role models or alumni in their interest area.",
                "Flexible deadlines and project alternatives reduce pressure triggers.",
                "Offer leadership roles (class rep, project lead) to rebuild confidence.",
            ],
        ),
    };

    PersonaProfile {
        id,
        name: id.name().to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
        strategies: strategies.iter().map(|s| s.to_string()).collect(),
    }
}
