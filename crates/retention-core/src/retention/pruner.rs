//! # Multi-Strategy Pruner
//!
//! Applies the age, count, and token-budget filters in that order to the
//! evaluated prefix of a transcript. The newest `preserve_last_n` messages
//! bypass every filter and are re-appended unchanged.
//!
//! Work is done on indices into the borrowed input, so the caller's
//! transcript is never touched and pruned messages are identified by
//! position rather than content.

use crate::retention::importance::ImportanceRules;
use crate::retention::message::Message;
use crate::retention::policy::PruningConfig;
use crate::retention::tokens::estimate_message_tokens;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason reported when no strategy removed anything
pub const NO_PRUNING_REASON: &str = "No pruning needed";

/// A single filter of the pruning pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PruneStage {
    /// Messages at or older than `max_age_hours`
    Age,
    /// Oldest messages beyond `max_messages`
    Count,
    /// Oldest regular messages until the token budget fits
    TokenBudget,
}

impl fmt::Display for PruneStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Age => write!(f, "age"),
            Self::Count => write!(f, "count"),
            Self::TokenBudget => write!(f, "token budget"),
        }
    }
}

/// What one stage removed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutcome {
    /// Filter that ran
    pub stage: PruneStage,
    /// Messages it removed, always at least one
    pub removed: usize,
    /// Human-readable description of the removal
    pub reason: String,
}

impl StageOutcome {
    fn age(removed: usize, max_age_hours: f64) -> Self {
        Self {
            stage: PruneStage::Age,
            removed,
            reason: format!(
                "Removed {} messages older than {} hours",
                removed, max_age_hours
            ),
        }
    }

    fn count(removed: usize, max_messages: usize) -> Self {
        Self {
            stage: PruneStage::Count,
            removed,
            reason: format!(
                "Removed {} oldest messages to stay within {} message limit",
                removed, max_messages
            ),
        }
    }

    fn token_budget(removed: usize, max_tokens: usize) -> Self {
        Self {
            stage: PruneStage::TokenBudget,
            removed,
            reason: format!(
                "Removed {} messages to stay within {} token budget",
                removed, max_tokens
            ),
        }
    }
}

/// How the token-budget filter orders its survivors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenOrdering {
    /// Regular remainder first, then every important message. Can reorder the
    /// transcript relative to its original chronology.
    #[default]
    Reference,

    /// Survivors in original index order
    Chronological,
}

/// Outcome of a pruning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PruningResult {
    /// The retained transcript
    pub messages: Vec<Message>,
    /// Length of the input transcript
    pub original_count: usize,
    /// Length of the retained transcript
    pub remaining_count: usize,
    /// `original_count - remaining_count`
    pub pruned_count: usize,
    /// Removed messages in original order
    pub pruned_messages: Vec<Message>,
    /// Reason from the last stage that removed anything, or
    /// [`NO_PRUNING_REASON`]
    pub reason: String,
    /// Stages that removed at least one message, in pipeline order
    pub stages: Vec<StageOutcome>,
}

impl PruningResult {
    /// Result that keeps the whole transcript
    pub fn unchanged(messages: &[Message]) -> Self {
        Self {
            messages: messages.to_vec(),
            original_count: messages.len(),
            remaining_count: messages.len(),
            pruned_count: 0,
            pruned_messages: Vec::new(),
            reason: NO_PRUNING_REASON.to_string(),
            stages: Vec::new(),
        }
    }

    /// Whether any message was removed
    pub fn was_pruned(&self) -> bool {
        self.pruned_count > 0
    }

    /// Messages removed by a given stage, zero if it did not run
    pub fn removed_by(&self, stage: PruneStage) -> usize {
        self.stages
            .iter()
            .filter(|s| s.stage == stage)
            .map(|s| s.removed)
            .sum()
    }
}

/// Prune with the compiled-in importance rules, as of now
pub fn prune(messages: &[Message], config: &PruningConfig) -> PruningResult {
    prune_at(messages, config, Utc::now())
}

/// Prune with the compiled-in importance rules at a fixed clock
pub fn prune_at(messages: &[Message], config: &PruningConfig, now: DateTime<Utc>) -> PruningResult {
    prune_with(
        messages,
        config,
        &ImportanceRules::default(),
        TokenOrdering::Reference,
        now,
    )
}

/// Like [`prune`], but the output keeps original chronological order
pub fn prune_chronological(messages: &[Message], config: &PruningConfig) -> PruningResult {
    prune_chronological_at(messages, config, Utc::now())
}

/// Like [`prune_at`], but the output keeps original chronological order
pub fn prune_chronological_at(
    messages: &[Message],
    config: &PruningConfig,
    now: DateTime<Utc>,
) -> PruningResult {
    prune_with(
        messages,
        config,
        &ImportanceRules::default(),
        TokenOrdering::Chronological,
        now,
    )
}

/// Run the full pipeline with explicit rules, ordering, and clock
pub fn prune_with(
    messages: &[Message],
    config: &PruningConfig,
    rules: &ImportanceRules,
    ordering: TokenOrdering,
    now: DateTime<Utc>,
) -> PruningResult {
    let original_count = messages.len();
    let preserve_n = config.preserve_last_n;

    if preserve_n >= original_count {
        return PruningResult::unchanged(messages);
    }

    let split = original_count - preserve_n;
    let mut stages = Vec::new();

    let mut kept = filter_by_age(messages, split, config.max_age_hours, now);
    let aged_out = split - kept.len();
    if aged_out > 0 {
        stages.push(StageOutcome::age(aged_out, config.max_age_hours));
    }

    let over_cap = filter_by_count(&mut kept, preserve_n, config.max_messages);
    if over_cap > 0 {
        stages.push(StageOutcome::count(over_cap, config.max_messages));
    }

    let over_budget = filter_by_tokens(messages, &mut kept, split, config, rules, ordering);
    if over_budget > 0 {
        stages.push(StageOutcome::token_budget(over_budget, config.max_tokens));
    }

    kept.extend(split..original_count);
    assemble(messages, kept, stages)
}

/// Evaluated indices surviving the age cutoff
fn filter_by_age(
    messages: &[Message],
    split: usize,
    max_age_hours: f64,
    now: DateTime<Utc>,
) -> Vec<usize> {
    match age_cutoff(now, max_age_hours) {
        Some(cutoff) => (0..split)
            .filter(|&i| messages[i].effective_timestamp(now) > cutoff)
            .collect(),
        None => (0..split).collect(),
    }
}

/// `now - max_age_hours`, or `None` when nothing can be old enough
fn age_cutoff(now: DateTime<Utc>, max_age_hours: f64) -> Option<DateTime<Utc>> {
    if max_age_hours.is_nan() || max_age_hours == f64::INFINITY {
        return None;
    }
    let millis = ((max_age_hours * 3_600_000.0) as i64).max(-i64::MAX);
    let age = Duration::try_milliseconds(millis)?;

    match now.checked_sub_signed(age) {
        Some(cutoff) => Some(cutoff),
        // a negative age past the calendar's end still ages out everything
        None if max_age_hours < 0.0 => Some(DateTime::<Utc>::MAX_UTC),
        None => None,
    }
}

/// Drop the oldest survivors so survivors plus the tail fit `max_messages`
fn filter_by_count(kept: &mut Vec<usize>, preserve_n: usize, max_messages: usize) -> usize {
    let total = kept.len() + preserve_n;
    if total <= max_messages {
        return 0;
    }
    let excess = (total - max_messages).min(kept.len());
    kept.drain(..excess);
    excess
}

/// Remove the oldest regular messages until the budget is met
///
/// Important messages are never removed here, so the result may still exceed
/// `max_tokens` by their cost.
fn filter_by_tokens(
    messages: &[Message],
    kept: &mut Vec<usize>,
    split: usize,
    config: &PruningConfig,
    rules: &ImportanceRules,
    ordering: TokenOrdering,
) -> usize {
    let kept_tokens: usize = kept.iter().map(|&i| estimate_message_tokens(&messages[i])).sum();
    let tail_tokens: usize = messages[split..].iter().map(estimate_message_tokens).sum();
    let current = kept_tokens + tail_tokens;

    if current <= config.max_tokens {
        return 0;
    }

    let target = current - config.max_tokens;
    let (important, regular): (Vec<usize>, Vec<usize>) = kept
        .iter()
        .partition(|&&i| rules.is_important(&messages[i], config.preserve_important));

    let mut freed = 0;
    let mut removed = 0;
    while removed < regular.len() && freed < target {
        freed += estimate_message_tokens(&messages[regular[removed]]);
        removed += 1;
    }

    let mut survivors: Vec<usize> = regular[removed..].iter().chain(&important).copied().collect();
    if ordering == TokenOrdering::Chronological {
        survivors.sort_unstable();
    }
    *kept = survivors;

    if removed > 0 {
        tracing::debug!(
            "Token budget: removed {} regular messages ({} tokens), kept {} important",
            removed,
            freed,
            important.len()
        );
    }
    removed
}

fn assemble(messages: &[Message], kept: Vec<usize>, stages: Vec<StageOutcome>) -> PruningResult {
    let mut retained = vec![false; messages.len()];
    for &i in &kept {
        retained[i] = true;
    }

    let pruned_messages: Vec<Message> = messages
        .iter()
        .zip(&retained)
        .filter(|(_, &keep)| !keep)
        .map(|(m, _)| m.clone())
        .collect();

    let remaining: Vec<Message> = kept.iter().map(|&i| messages[i].clone()).collect();
    let reason = stages
        .last()
        .map(|s| s.reason.clone())
        .unwrap_or_else(|| NO_PRUNING_REASON.to_string());

    for stage in &stages {
        tracing::debug!("Pruning stage {}: {}", stage.stage, stage.reason);
    }

    let result = PruningResult {
        original_count: messages.len(),
        remaining_count: remaining.len(),
        pruned_count: messages.len() - remaining.len(),
        messages: remaining,
        pruned_messages,
        reason,
        stages,
    };

    if result.was_pruned() {
        tracing::info!(
            "Pruned {} of {} messages: {}",
            result.pruned_count,
            result.original_count,
            result.reason
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(count: usize) -> Vec<Message> {
        (0..count).map(|i| Message::user(format!("msg {}", i))).collect()
    }

    fn generous() -> PruningConfig {
        PruningConfig {
            max_messages: 1_000,
            max_tokens: 1_000_000,
            max_age_hours: f64::INFINITY,
            preserve_important: true,
            preserve_last_n: 0,
        }
    }

    #[test]
    fn test_no_pruning_needed() {
        let messages = plain(5);
        let result = prune(&messages, &generous());

        assert_eq!(result.messages, messages);
        assert_eq!(result.pruned_count, 0);
        assert_eq!(result.reason, NO_PRUNING_REASON);
        assert!(result.stages.is_empty());
    }

    #[test]
    fn test_tail_covers_everything() {
        let messages = plain(3);
        let config = PruningConfig {
            max_messages: 0,
            max_tokens: 0,
            max_age_hours: 0.0,
            preserve_important: false,
            preserve_last_n: 3,
        };

        let result = prune(&messages, &config);
        assert_eq!(result.remaining_count, 3);
        assert_eq!(result.reason, NO_PRUNING_REASON);
    }

    #[test]
    fn test_empty_transcript() {
        let result = prune(&[], &PruningConfig::default());
        assert_eq!(result.original_count, 0);
        assert_eq!(result.pruned_count, 0);
    }

    #[test]
    fn test_age_filter() {
        let now = Utc::now();
        let old = now - Duration::hours(48);
        let mut messages: Vec<Message> = (0..4)
            .map(|i| Message::user(format!("old {}", i)).with_timestamp(old))
            .collect();
        messages.push(Message::assistant("fresh").with_timestamp(now));

        let config = generous().with_max_age_hours(24.0);
        let result = prune_at(&messages, &config, now);

        assert_eq!(result.remaining_count, 1);
        assert_eq!(result.pruned_count, 4);
        assert!(result.reason.contains("4 messages older than 24 hours"));
        assert_eq!(result.removed_by(PruneStage::Age), 4);
    }

    #[test]
    fn test_age_cutoff_is_inclusive() {
        let now = Utc::now();
        let messages = vec![
            Message::user("exactly at cutoff").with_timestamp(now - Duration::hours(2)),
            Message::user("just inside").with_timestamp(now - Duration::minutes(119)),
        ];

        let result = prune_at(&messages, &generous().with_max_age_hours(2.0), now);
        assert_eq!(result.pruned_messages, vec![messages[0].clone()]);
    }

    #[test]
    fn test_zero_age_drops_untimestamped() {
        let messages = plain(4);
        let config = generous().with_max_age_hours(0.0).with_preserve_last_n(1);

        let result = prune(&messages, &config);
        assert_eq!(result.messages, vec![messages[3].clone()]);
    }

    #[test]
    fn test_count_filter_keeps_newest() {
        let messages = plain(20);
        let config = generous().with_max_messages(10).with_preserve_last_n(5);

        let result = prune(&messages, &config);
        assert_eq!(result.remaining_count, 10);
        assert_eq!(result.messages, messages[10..].to_vec());
        assert_eq!(result.pruned_messages, messages[..10].to_vec());
        assert_eq!(result.stages[0].stage, PruneStage::Count);
    }

    #[test]
    fn test_count_filter_when_tail_exceeds_cap() {
        let messages = plain(10);
        let config = generous().with_max_messages(2).with_preserve_last_n(4);

        let result = prune(&messages, &config);
        // evaluated prefix emptied, tail kept whole
        assert_eq!(result.messages, messages[6..].to_vec());
        assert_eq!(result.removed_by(PruneStage::Count), 6);
    }

    #[test]
    fn test_token_budget_preserves_important() {
        let mut messages: Vec<Message> = (0..10).map(|_| Message::user("x".repeat(2000))).collect();
        messages[2] = Message::assistant(format!("error{}", "x".repeat(1995)));

        let config = generous().with_max_tokens(2000);
        let result = prune(&messages, &config);

        assert!(result.messages.contains(&messages[2]));
        assert_eq!(result.removed_by(PruneStage::TokenBudget), 6);
        // regular remainder first, important last
        assert_eq!(result.messages.last(), Some(&messages[2]));
        assert_eq!(result.remaining_count, 4);
    }

    #[test]
    fn test_token_budget_chronological_variant() {
        let mut messages: Vec<Message> =
            (0..10).map(|i| Message::user(format!("{}{}", i, "x".repeat(1999)))).collect();
        messages[2] = Message::assistant(format!("error{}", "x".repeat(1995)));

        let config = generous().with_max_tokens(2000);
        let result = prune_chronological(&messages, &config);

        let expected = vec![
            messages[2].clone(),
            messages[7].clone(),
            messages[8].clone(),
            messages[9].clone(),
        ];
        assert_eq!(result.messages, expected);
    }

    #[test]
    fn test_token_budget_without_importance() {
        let mut messages: Vec<Message> = (0..4).map(|_| Message::user("x".repeat(400))).collect();
        messages[0] = Message::assistant(format!("critical{}", "x".repeat(392)));

        let config = generous().with_max_tokens(200).with_preserve_important(false);
        let result = prune(&messages, &config);

        assert_eq!(result.messages, messages[2..].to_vec());
    }

    #[test]
    fn test_token_budget_counts_tail() {
        let messages: Vec<Message> = (0..4).map(|_| Message::user("x".repeat(400))).collect();
        let config = generous().with_max_tokens(300).with_preserve_last_n(2);

        // tail alone costs 200, so one 100-token evaluated message must go
        let result = prune(&messages, &config);
        assert_eq!(result.remaining_count, 3);
        assert_eq!(result.pruned_messages, vec![messages[0].clone()]);
    }

    #[test]
    fn test_later_stage_supersedes_reason() {
        let now = Utc::now();
        let mut messages = vec![Message::user("stale").with_timestamp(now - Duration::hours(30))];
        messages.extend(plain(6));

        let config = generous().with_max_age_hours(24.0).with_max_messages(3);
        let result = prune_at(&messages, &config, now);

        assert_eq!(result.stages.len(), 2);
        assert_eq!(result.removed_by(PruneStage::Age), 1);
        assert_eq!(result.removed_by(PruneStage::Count), 3);
        assert!(result.reason.contains("3 message limit"));
    }

    #[test]
    fn test_duplicates_are_disambiguated_by_index() {
        let messages: Vec<Message> = (0..4).map(|_| Message::user("same")).collect();
        let config = generous().with_max_messages(1);

        let result = prune(&messages, &config);
        assert_eq!(result.pruned_messages.len(), 3);
        assert_eq!(result.remaining_count, 1);
    }

    #[test]
    fn test_age_cutoff_edges() {
        let now = Utc::now();
        assert!(age_cutoff(now, f64::INFINITY).is_none());
        assert!(age_cutoff(now, f64::NAN).is_none());
        assert_eq!(age_cutoff(now, 1.0), Some(now - Duration::hours(1)));
        assert!(age_cutoff(now, -1.0).is_some_and(|c| c > now));
        assert_eq!(age_cutoff(now, -1e300), Some(DateTime::<Utc>::MAX_UTC));
        assert_eq!(age_cutoff(now, f64::NEG_INFINITY), Some(DateTime::<Utc>::MAX_UTC));
        assert!(age_cutoff(now, 1e300).is_none());
    }

    #[test]
    fn test_negative_age_always_drops_evaluated() {
        let messages = plain(5);

        for hours in [-1.0, -1e6, -1e300, f64::NEG_INFINITY] {
            let result = prune(&messages, &generous().with_max_age_hours(hours));
            assert_eq!(result.remaining_count, 0, "max_age_hours = {}", hours);
            assert_eq!(result.removed_by(PruneStage::Age), 5);
        }
    }
}
