//! # Pruning Policy
//!
//! The [`PruningConfig`] value that fully determines one pruning run, its
//! named presets, and the adaptive tables that pick a preset from the shape
//! of a transcript.

use crate::error::{RetentionError, Result, ResultExt};
use crate::retention::message::Message;
use serde::{Deserialize, Serialize};

/// Message cap of the default policy
pub const DEFAULT_MAX_MESSAGES: usize = 50;

/// Token budget of the default policy
pub const DEFAULT_MAX_TOKENS: usize = 10_000;

/// Age limit of the default policy, in hours
pub const DEFAULT_MAX_AGE_HOURS: f64 = 24.0;

/// Guaranteed tail of the default policy
pub const DEFAULT_PRESERVE_LAST_N: usize = 10;

/// Message count above which the high-volume preset applies
pub const HIGH_VOLUME_THRESHOLD: usize = 100;

/// Message count above which the busy preset applies
pub const BUSY_THRESHOLD: usize = 50;

/// Mean message length (characters) above which the long-form preset applies
pub const LONG_FORM_THRESHOLD: f64 = 500.0;

/// Configuration for one pruning run
///
/// Configs are trusted input: [`prune`](crate::retention::pruner::prune)
/// never validates or clamps them. Call [`PruningConfig::validate`] when the
/// values come from outside the program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PruningConfig {
    /// Cap on retained messages, counting the preserved tail
    #[serde(alias = "maxMessages")]
    pub max_messages: usize,

    /// Token budget, counting the preserved tail
    #[serde(alias = "maxTokens")]
    pub max_tokens: usize,

    /// Evaluated messages at or older than this are dropped
    #[serde(alias = "maxAgeHours")]
    pub max_age_hours: f64,

    /// Honor importance classification in the token-budget filter
    #[serde(alias = "preserveImportant")]
    pub preserve_important: bool,

    /// Newest N messages are retained verbatim, outside every filter
    #[serde(alias = "preserveLastN")]
    pub preserve_last_n: usize,
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_age_hours: DEFAULT_MAX_AGE_HOURS,
            preserve_important: true,
            preserve_last_n: DEFAULT_PRESERVE_LAST_N,
        }
    }
}

impl PruningConfig {
    /// Create config for standard usage
    pub fn standard() -> Self {
        Self::default()
    }

    /// Create config for very long transcripts (more than 100 messages)
    pub fn high_volume() -> Self {
        Self {
            max_messages: 30,
            max_tokens: 8_000,
            max_age_hours: 12.0,
            preserve_important: true,
            preserve_last_n: 15,
        }
    }

    /// Create config for busy transcripts (more than 50 messages)
    pub fn busy() -> Self {
        Self {
            max_messages: 40,
            max_tokens: 9_000,
            max_age_hours: 18.0,
            preserve_important: true,
            preserve_last_n: 12,
        }
    }

    /// Create config for transcripts of long messages
    pub fn long_form() -> Self {
        Self {
            max_messages: 35,
            max_tokens: 8_000,
            max_age_hours: 24.0,
            preserve_important: true,
            preserve_last_n: 8,
        }
    }

    /// Override the message cap
    pub fn with_max_messages(mut self, max_messages: usize) -> Self {
        self.max_messages = max_messages;
        self
    }

    /// Override the token budget
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Override the age limit
    pub fn with_max_age_hours(mut self, max_age_hours: f64) -> Self {
        self.max_age_hours = max_age_hours;
        self
    }

    /// Toggle importance preservation
    pub fn with_preserve_important(mut self, preserve_important: bool) -> Self {
        self.preserve_important = preserve_important;
        self
    }

    /// Override the preserved tail length
    pub fn with_preserve_last_n(mut self, preserve_last_n: usize) -> Self {
        self.preserve_last_n = preserve_last_n;
        self
    }

    /// Reject values the type system cannot rule out
    pub fn validate(&self) -> Result<()> {
        if self.max_age_hours.is_nan() {
            return Err(RetentionError::InvalidConfig(
                "max_age_hours must be a number".to_string(),
            ));
        }
        if self.max_age_hours < 0.0 {
            return Err(RetentionError::InvalidConfig(format!(
                "max_age_hours must be >= 0, got {}",
                self.max_age_hours
            )));
        }
        Ok(())
    }

    /// Parse a config from TOML
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(RetentionError::from)
            .context("Failed to parse TOML pruning config")
    }

    /// Parse a config from JSON
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map_err(RetentionError::from)
            .context("Failed to parse JSON pruning config")
    }
}

/// Which adaptive table to consult
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStrategy {
    /// Full table: volume thresholds, then mean message length
    #[default]
    Adaptive,

    /// Coarse table: volume thresholds only
    Recommended,
}

impl PolicyStrategy {
    /// Derive a config for this transcript
    pub fn config_for(self, messages: &[Message]) -> PruningConfig {
        match self {
            Self::Adaptive => select_config(messages),
            Self::Recommended => recommended_config(messages),
        }
    }
}

/// Mean content length in characters; zero for an empty transcript
pub fn average_message_length(messages: &[Message]) -> f64 {
    if messages.is_empty() {
        return 0.0;
    }
    let total: usize = messages.iter().map(Message::char_len).sum();
    total as f64 / messages.len() as f64
}

/// Pick pruning parameters from transcript shape; first matching row wins
pub fn select_config(messages: &[Message]) -> PruningConfig {
    let count = messages.len();

    if count > HIGH_VOLUME_THRESHOLD {
        tracing::debug!("Adaptive policy: high volume ({} messages)", count);
        return PruningConfig::high_volume();
    }
    if count > BUSY_THRESHOLD {
        tracing::debug!("Adaptive policy: busy ({} messages)", count);
        return PruningConfig::busy();
    }

    let avg = average_message_length(messages);
    if avg > LONG_FORM_THRESHOLD {
        tracing::debug!("Adaptive policy: long form (avg {:.1} chars)", avg);
        return PruningConfig::long_form();
    }

    tracing::debug!("Adaptive policy: standard");
    PruningConfig::standard()
}

/// Suggest a config from message volume alone
///
/// Deliberately ignores message length; callers wanting the length-aware
/// table use [`select_config`].
pub fn recommended_config(messages: &[Message]) -> PruningConfig {
    let count = messages.len();

    if count > HIGH_VOLUME_THRESHOLD {
        PruningConfig::high_volume()
    } else if count > BUSY_THRESHOLD {
        PruningConfig::busy()
    } else {
        PruningConfig::standard()
    }
}
