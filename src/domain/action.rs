//! Action kinds a workflow step can exercise

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// The closed set of data capabilities a step may call.
///
/// Wire values match the original API contract: `weather`, `news`,
/// `github` (with `repo-trends` accepted as an input alias). An unknown
/// kind is rejected when a chain is defined or a request is parsed, never
/// at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    #[serde(rename = "weather")]
    Weather,
    #[serde(rename = "news")]
    News,
    #[serde(rename = "github", alias = "repo-trends")]
    Github,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [ActionKind::Weather, ActionKind::News, ActionKind::Github];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Weather => "weather",
            ActionKind::News => "news",
            ActionKind::Github => "github",
        }
    }

    /// The token appended to every combined step result, e.g. `#weather`.
    pub fn hashtag(&self) -> String {
        format!("#{}", self.as_str())
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weather" => Ok(ActionKind::Weather),
            "news" => Ok(ActionKind::News),
            "github" | "repo-trends" => Ok(ActionKind::Github),
            _ => Err(DomainError::validation(format!(
                "Invalid action type: {}. Valid types: weather, github, news",
                s
            ))),
        }
    }
}
