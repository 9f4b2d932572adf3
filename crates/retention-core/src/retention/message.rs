//! # Transcript Messages
//!
//! The immutable record the engine operates on. The engine never mutates a
//! message; pruning clones survivors into a new transcript.

use crate::error::{RetentionError, Result, ResultExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message role
///
/// Opaque to the engine: no strategy branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// End user of the chat
    User,
    /// Model reply
    Assistant,
    /// Host-injected instruction
    System,
}

/// A single transcript turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent it
    pub role: MessageRole,
    /// Free text
    pub content: String,

    /// Absent timestamps count as "now" for age computations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Side-effect tag such as `contact_created`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl Message {
    /// Create new message without timestamp or action
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: None,
            action: None,
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Attach a timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Attach an action tag
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Content length in characters (Unicode scalar values)
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Timestamp used for age filtering; missing timestamps resolve to `now`
    pub fn effective_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.timestamp.unwrap_or(now)
    }
}

/// Decode a transcript from a JSON array of messages
pub fn parse_transcript(json: &str) -> Result<Vec<Message>> {
    serde_json::from_str(json)
        .map_err(RetentionError::from)
        .context("Failed to parse transcript")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_builder_helpers() {
        let ts = Utc::now() - Duration::hours(2);
        let msg = Message::assistant("Contact saved")
            .with_timestamp(ts)
            .with_action("contact_created");

        assert_eq!(msg.role, MessageRole::Assistant);
        assert_eq!(msg.timestamp, Some(ts));
        assert_eq!(msg.action.as_deref(), Some("contact_created"));
    }

    #[test]
    fn test_char_len_counts_scalars() {
        let msg = Message::user("héllo");
        assert_eq!(msg.char_len(), 5);
        assert_eq!(msg.content.len(), 6);
    }

    #[test]
    fn test_effective_timestamp_defaults_to_now() {
        let now = Utc::now();
        assert_eq!(Message::user("hi").effective_timestamp(now), now);
    }

    #[test]
    fn test_parse_transcript() {
        let json = r#"[
            {"role": "user", "content": "Add Jane to the CRM"},
            {"role": "assistant", "content": "Done", "timestamp": "2026-01-05T10:00:00Z", "action": "contact_created"}
        ]"#;

        let transcript = parse_transcript(json).unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].timestamp, None);
        assert!(transcript[1].timestamp.is_some());
        assert_eq!(transcript[1].action.as_deref(), Some("contact_created"));
    }

    #[test]
    fn test_parse_transcript_rejects_unknown_role() {
        let json = r#"[{"role": "robot", "content": "beep"}]"#;
        let err = parse_transcript(json).unwrap_err();

        assert!(err.to_string().starts_with("Failed to parse transcript: "));
        assert!(matches!(err.root(), RetentionError::Json(_)));
    }
}
