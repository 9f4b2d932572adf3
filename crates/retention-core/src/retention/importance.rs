//! # Importance Classification
//!
//! Flags messages the token-budget filter must not drop. A message is
//! important if its action tag records a completed record mutation or its
//! content mentions any consequence keyword. False positives are tolerated.

use crate::retention::message::Message;
use serde::{Deserialize, Serialize};

/// Action tags denoting a completed state change on a tracked record
pub const IMPORTANT_ACTIONS: [&str; 12] = [
    "contact_created",
    "contact_updated",
    "contact_deleted",
    "company_created",
    "company_updated",
    "company_deleted",
    "deal_created",
    "deal_updated",
    "deal_deleted",
    "task_created",
    "task_updated",
    "task_deleted",
];

/// Content keywords signalling consequence or urgency (lower-case)
pub const IMPORTANT_KEYWORDS: [&str; 10] = [
    "created",
    "updated",
    "deleted",
    "confirmed",
    "successful",
    "error",
    "failed",
    "important",
    "urgent",
    "critical",
];

/// Action tags and keywords used to classify messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportanceRules {
    actions: Vec<String>,
    keywords: Vec<String>,
}

impl Default for ImportanceRules {
    fn default() -> Self {
        Self::new(IMPORTANT_ACTIONS, IMPORTANT_KEYWORDS)
    }
}

impl ImportanceRules {
    /// Build a rule set; keywords are lower-cased so matching stays
    /// case-insensitive
    pub fn new<A, K>(actions: A, keywords: K) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        Self {
            actions: actions.into_iter().map(Into::into).collect(),
            keywords: keywords
                .into_iter()
                .map(|k| Into::<String>::into(k).to_lowercase())
                .collect(),
        }
    }

    /// Action tags in this rule set
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// Keywords in this rule set
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Classify a message. Always `false` when `preserve_important` is off.
    pub fn is_important(&self, message: &Message, preserve_important: bool) -> bool {
        preserve_important
            && classify(
                message,
                self.actions.iter().map(String::as_str),
                self.keywords.iter().map(String::as_str),
            )
    }
}

/// Classify a message against the compiled-in rule set
pub fn is_important(message: &Message, preserve_important: bool) -> bool {
    preserve_important && classify(message, IMPORTANT_ACTIONS, IMPORTANT_KEYWORDS)
}

fn classify<'a, A, K>(message: &Message, actions: A, keywords: K) -> bool
where
    A: IntoIterator<Item = &'a str>,
    K: IntoIterator<Item = &'a str>,
{
    if let Some(action) = message.action.as_deref() {
        if actions.into_iter().any(|tag| tag == action) {
            return true;
        }
    }

    let content = message.content.to_lowercase();
    keywords.into_iter().any(|keyword| content.contains(keyword))
}
