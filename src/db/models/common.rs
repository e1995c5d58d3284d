//! Common types shared across models.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CEFR proficiency level attached to words and users
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum CefrLevel {
    #[default]
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    pub const ALL: [CefrLevel; 6] = [
        Self::A1,
        Self::A2,
        Self::B1,
        Self::B2,
        Self::C1,
        Self::C2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown level '{0}'. Must be one of: A1, A2, B1, B2, C1, C2")]
pub struct ParseLevelError(pub String);

impl std::fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CefrLevel {
    type Err = ParseLevelError;

    /// Level tags are matched exactly; `a1` is not accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

impl TryFrom<String> for CefrLevel {
    type Error = ParseLevelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Current UTC time in the format stored in `created_at`/`updated_at` columns.
///
/// Microsecond precision keeps newest-first ordering stable for rapid inserts.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
