//! Chain and step entities

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::action::ActionKind;
use crate::domain::DomainError;

/// Prefix reserved for the built-in shared catalog.
pub const PUBLIC_CHAIN_PREFIX: &str = "public-";

/// Maximum number of steps accepted in a single chain.
pub const MAX_CHAIN_STEPS: usize = 10;

/// Maximum prompt length accepted for execution.
pub const MAX_PROMPT_LEN: usize = 500;

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;

/// One step of a chain: a capability plus an optional prompt override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStep {
    #[serde(rename = "type")]
    pub action: ActionKind,
    /// Overrides the step's generation subject when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl ChainStep {
    pub fn new(action: ActionKind) -> Self {
        Self {
            action,
            prompt: None,
        }
    }

    pub fn with_prompt(action: ActionKind, prompt: impl Into<String>) -> Self {
        Self {
            action,
            prompt: Some(prompt.into()),
        }
    }
}

/// A stored, reusable workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "actions")]
    pub steps: Vec<ChainStep>,
    /// Owner identity, `None` for the shared catalog.
    #[serde(rename = "ownerId", skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(rename = "executionCount")]
    pub execution_count: i64,
    #[serde(rename = "lastExecuted", skip_serializing_if = "Option::is_none")]
    pub last_executed_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Chain {
    /// Creates a new owned chain with a fresh id and zeroed counters.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        steps: Vec<ChainStep>,
        owner_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            steps,
            owner_id,
            execution_count: 0,
            last_executed_at: None,
            created_at: chrono::Utc::now(),
        }
    }

    /// Validates name, description and step-count bounds.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("Chain name cannot be empty"));
        }
        if self.name.len() > MAX_NAME_LEN {
            return Err(DomainError::validation(format!(
                "Chain name cannot exceed {} characters",
                MAX_NAME_LEN
            )));
        }
        if self.description.len() > MAX_DESCRIPTION_LEN {
            return Err(DomainError::validation(format!(
                "Chain description cannot exceed {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }
        validate_steps(&self.steps)
    }

    /// Whether the id addresses the shared catalog.
    pub fn is_public_id(id: &str) -> bool {
        id.starts_with(PUBLIC_CHAIN_PREFIX)
    }

    /// The built-in shared catalog, identical for every caller.
    pub fn public_catalog() -> Vec<Chain> {
        let epoch = chrono::DateTime::<chrono::Utc>::UNIX_EPOCH;
        vec![
            Chain {
                id: "public-1".to_string(),
                name: "Weather & News Update".to_string(),
                description: "Get current weather and latest news in one go".to_string(),
                steps: vec![
                    ChainStep::with_prompt(ActionKind::Weather, "Get current weather"),
                    ChainStep::with_prompt(ActionKind::News, "Get latest technology news"),
                ],
                owner_id: None,
                execution_count: 0,
                last_executed_at: None,
                created_at: epoch,
            },
            Chain {
                id: "public-2".to_string(),
                name: "Dev Daily Brief".to_string(),
                description: "Weather, trending repos, and tech news for developers".to_string(),
                steps: vec![
                    ChainStep::with_prompt(ActionKind::Weather, "Get weather for my location"),
                    ChainStep::with_prompt(
                        ActionKind::Github,
                        "Show trending JavaScript repositories",
                    ),
                    ChainStep::with_prompt(
                        ActionKind::News,
                        "Latest programming and technology news",
                    ),
                ],
                owner_id: None,
                execution_count: 0,
                last_executed_at: None,
                created_at: epoch,
            },
        ]
    }
}

/// Validates step-list bounds shared by stored chains and ad-hoc runs.
pub fn validate_steps(steps: &[ChainStep]) -> Result<(), DomainError> {
    if steps.is_empty() {
        return Err(DomainError::validation(
            "Chain must contain at least one step",
        ));
    }
    if steps.len() > MAX_CHAIN_STEPS {
        return Err(DomainError::validation(format!(
            "Chain cannot exceed {} steps",
            MAX_CHAIN_STEPS
        )));
    }
    Ok(())
}

/// Validates the user-supplied initiating prompt.
pub fn validate_prompt(prompt: &str) -> Result<(), DomainError> {
    if prompt.trim().is_empty() {
        return Err(DomainError::validation("Prompt cannot be empty"));
    }
    if prompt.len() > MAX_PROMPT_LEN {
        return Err(DomainError::validation(format!(
            "Prompt cannot exceed {} characters",
            MAX_PROMPT_LEN
        )));
    }
    Ok(())
}
