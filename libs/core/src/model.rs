use serde::{Deserialize, Serialize};

/// A connected installation: one platform account holding one access token.
/// Upserted on every successful OAuth exchange, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: i64,
    pub access_token: String,
}

/// A registered automation subscription linking a webhook to a board and the
/// account whose token authenticates the outbound column round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationRule {
    pub webhook_id: String,
    pub board_id: i64,
    pub account_id: i64,
    pub rule_type: RuleType,
}

/// The transform an automation rule applies to a column's text value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    ToUppercase,
}

impl RuleType {
    pub fn apply(&self, input: &str) -> String {
        match self {
            Self::ToUppercase => input.to_uppercase(),
        }
    }

    /// Stable code persisted in the rule store.
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::ToUppercase => "TO_UPPERCASE",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "TO_UPPERCASE" => Some(Self::ToUppercase),
            _ => None,
        }
    }
}
