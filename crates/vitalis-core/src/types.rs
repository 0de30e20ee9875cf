use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::VitalisError;

// =============================================================================
// Persona
// =============================================================================

/// Identity of a conversation session.
///
/// Each persona owns at most one live session per process. `Default` is the
/// general-purpose session that has no system instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Default,
    Fitness,
    MentalHealth,
    GeneralHealth,
    Financial,
    Personalized,
}

impl Persona {
    /// Every persona, in a stable order.
    pub const ALL: [Persona; 6] = [
        Persona::Default,
        Persona::Fitness,
        Persona::MentalHealth,
        Persona::GeneralHealth,
        Persona::Financial,
        Persona::Personalized,
    ];

    /// Wire key of the persona (`mental_health`, `financial`, ...).
    pub fn key(&self) -> &'static str {
        match self {
            Persona::Default => "default",
            Persona::Fitness => "fitness",
            Persona::MentalHealth => "mental_health",
            Persona::GeneralHealth => "general_health",
            Persona::Financial => "financial",
            Persona::Personalized => "personalized",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// SupportType
// =============================================================================

/// Category accepted by the multi-type support endpoint.
///
/// A closed set: anything else is rejected at the request boundary and never
/// reaches a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportType {
    Fitness,
    MentalHealth,
    GeneralHealth,
}

impl SupportType {
    pub fn persona(self) -> Persona {
        match self {
            SupportType::Fitness => Persona::Fitness,
            SupportType::MentalHealth => Persona::MentalHealth,
            SupportType::GeneralHealth => Persona::GeneralHealth,
        }
    }
}

impl From<SupportType> for Persona {
    fn from(support: SupportType) -> Self {
        support.persona()
    }
}

impl FromStr for SupportType {
    type Err = VitalisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fitness" => Ok(SupportType::Fitness),
            "mental_health" => Ok(SupportType::MentalHealth),
            "general_health" => Ok(SupportType::GeneralHealth),
            _ => Err(VitalisError::InvalidArgument(
                "Invalid support type".to_string(),
            )),
        }
    }
}

// =============================================================================
// Turn
// =============================================================================

/// One input/output exchange appended to a session's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub input: String,
    pub output: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            created_at: Utc::now(),
        }
    }
}
