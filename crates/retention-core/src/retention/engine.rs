//! # Retention Engine
//!
//! Facade bundling importance rules, an adaptive strategy, and a token
//! ordering. Holds no mutable state, so one engine can be shared across
//! threads.

use crate::retention::importance::ImportanceRules;
use crate::retention::message::Message;
use crate::retention::policy::{PolicyStrategy, PruningConfig};
use crate::retention::pruner::{prune_with, PruningResult, TokenOrdering};
use crate::retention::stats::{needs_pruning, stats, ConversationStats};
use chrono::{DateTime, Utc};

/// Retention engine
#[derive(Debug, Clone, Default)]
pub struct RetentionEngine {
    rules: ImportanceRules,
    strategy: PolicyStrategy,
    ordering: TokenOrdering,
}

impl RetentionEngine {
    /// Create engine with compiled-in rules and the adaptive table
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the importance rules
    pub fn with_rules(mut self, rules: ImportanceRules) -> Self {
        self.rules = rules;
        self
    }

    /// Choose which adaptive table `evaluate` consults
    pub fn with_strategy(mut self, strategy: PolicyStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Choose how the token-budget filter orders survivors
    pub fn with_ordering(mut self, ordering: TokenOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Importance rules in use
    pub fn rules(&self) -> &ImportanceRules {
        &self.rules
    }

    /// Adaptive strategy in use
    pub fn strategy(&self) -> PolicyStrategy {
        self.strategy
    }

    /// Classify a message with this engine's rules
    pub fn is_important(&self, message: &Message, preserve_important: bool) -> bool {
        self.rules.is_important(message, preserve_important)
    }

    /// Config the adaptive strategy picks for this transcript
    pub fn select_config(&self, messages: &[Message]) -> PruningConfig {
        self.strategy.config_for(messages)
    }

    /// Prune with an explicit config, as of now
    pub fn prune(&self, messages: &[Message], config: &PruningConfig) -> PruningResult {
        self.prune_at(messages, config, Utc::now())
    }

    /// Prune with an explicit config at a fixed clock
    pub fn prune_at(
        &self,
        messages: &[Message],
        config: &PruningConfig,
        now: DateTime<Utc>,
    ) -> PruningResult {
        prune_with(messages, config, &self.rules, self.ordering, now)
    }

    /// Transcript statistics
    pub fn stats(&self, messages: &[Message]) -> ConversationStats {
        stats(messages)
    }

    /// Fixed trigger check
    pub fn needs_pruning(&self, messages: &[Message]) -> bool {
        needs_pruning(messages)
    }

    /// Full host flow as of now
    pub fn evaluate(&self, messages: &[Message]) -> Option<PruningResult> {
        self.evaluate_at(messages, Utc::now())
    }

    /// Trigger check, then adaptive selection, then pruning
    ///
    /// Returns `None` when the fixed trigger says the transcript is fine.
    pub fn evaluate_at(&self, messages: &[Message], now: DateTime<Utc>) -> Option<PruningResult> {
        if !needs_pruning(messages) {
            tracing::debug!("Transcript of {} messages within limits", messages.len());
            return None;
        }

        let config = self.select_config(messages);
        Some(self.prune_at(messages, &config, now))
    }
}
