use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Self-reported emotional state, best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Mood {
    Great,
    Good,
    Neutral,
    Bad,
    Awful,
}

impl Mood {
    pub const ALL: [Mood; 5] = [Mood::Great, Mood::Good, Mood::Neutral, Mood::Bad, Mood::Awful];

    pub fn label(&self) -> &'static str {
        match self {
            Mood::Great => "Ótimo",
            Mood::Good => "Bem",
            Mood::Neutral => "Neutro",
            Mood::Bad => "Mal",
            Mood::Awful => "Péssimo",
        }
    }

    fn wire_name(&self) -> &'static str {
        match self {
            Mood::Great => "great",
            Mood::Good => "good",
            Mood::Neutral => "neutral",
            Mood::Bad => "bad",
            Mood::Awful => "awful",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mood '{0}'")]
pub struct ParseMoodError(String);

/// Parses user input, accepting the wire name or the display label
impl FromStr for Mood {
    type Err = ParseMoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.wire_name() == wanted || m.label().to_lowercase() == wanted)
            .ok_or_else(|| ParseMoodError(s.trim().to_string()))
    }
}

/// Daily check-in submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CheckIn {
    pub mood: Mood,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CheckInReceipt {
    pub id: String,
    #[serde(default)]
    pub points_earned: i64,
    pub recorded_at: DateTime<Utc>,
}
