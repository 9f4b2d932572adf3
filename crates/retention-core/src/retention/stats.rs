//! # Conversation Statistics
//!
//! Aggregate figures for a transcript and the fixed trigger deciding whether
//! the adaptive pruning path should run at all.

use crate::retention::message::Message;
use crate::retention::policy::{DEFAULT_MAX_AGE_HOURS, DEFAULT_MAX_MESSAGES, DEFAULT_MAX_TOKENS};
use crate::retention::tokens::estimate_transcript_tokens;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only summary of a transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationStats {
    /// Messages in the transcript
    pub total_messages: usize,
    /// Characters across all message contents
    pub total_characters: usize,
    /// Mean content length, rounded
    pub avg_message_length: usize,
    /// Sum of per-message token estimates
    pub estimated_tokens: usize,
    /// Span between oldest and newest timestamped message
    pub conversation_age_hours: f64,
    /// Result of [`needs_pruning`] for the same transcript
    pub needs_pruning: bool,
}

/// Compute statistics for a transcript
pub fn stats(messages: &[Message]) -> ConversationStats {
    let total_characters: usize = messages.iter().map(Message::char_len).sum();
    let avg_message_length = if messages.is_empty() {
        0
    } else {
        (total_characters as f64 / messages.len() as f64).round() as usize
    };

    ConversationStats {
        total_messages: messages.len(),
        total_characters,
        avg_message_length,
        estimated_tokens: estimate_transcript_tokens(messages),
        conversation_age_hours: conversation_age_hours(messages),
        needs_pruning: needs_pruning(messages),
    }
}

/// Hours between the oldest and newest timestamped messages
///
/// Zero with fewer than two timestamped messages.
pub fn conversation_age_hours(messages: &[Message]) -> f64 {
    let mut stamps = messages.iter().filter_map(|m| m.timestamp);
    let Some(first) = stamps.next() else {
        return 0.0;
    };

    let mut oldest = first;
    let mut newest = first;
    let mut seen = 1;
    for ts in stamps {
        oldest = oldest.min(ts);
        newest = newest.max(ts);
        seen += 1;
    }

    if seen < 2 {
        return 0.0;
    }
    hours_between(oldest, newest)
}

/// Whether the default thresholds are exceeded
///
/// Fixed trigger: more than 50 messages, more than 10 000 estimated tokens,
/// or a conversation span ([`conversation_age_hours`]) over 24 hours.
/// Independent of whichever adaptive config would be selected afterwards.
pub fn needs_pruning(messages: &[Message]) -> bool {
    messages.len() > DEFAULT_MAX_MESSAGES
        || estimate_transcript_tokens(messages) > DEFAULT_MAX_TOKENS
        || conversation_age_hours(messages) > DEFAULT_MAX_AGE_HOURS
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}
