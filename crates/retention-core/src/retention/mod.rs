//! # Conversation Retention
//!
//! Decides which messages of a growing chat transcript are kept before the
//! transcript goes to a downstream model.
//!
//! ## Architecture
//!
//! ```text
//! Transcript ──► needs_pruning ──no──► forward unchanged
//!                     │
//!                    yes
//!                     ▼
//!               select_config ──► prune ──► PruningResult
//!                                   │
//!                        ┌──────────┼──────────────┐
//!                       Age       Count      Token budget
//!                                              (importance)
//! ```
//!
//! Every operation is a pure function over a borrowed slice. The newest
//! `preserve_last_n` messages are never removed by any filter.
//!
//! ## Example
//!
//! ```rust
//! use retention_core::retention::{needs_pruning, prune, select_config, Message};
//!
//! let transcript: Vec<Message> = (0..80)
//!     .map(|i| Message::user(format!("turn {}", i)))
//!     .collect();
//!
//! if needs_pruning(&transcript) {
//!     let config = select_config(&transcript);
//!     let result = prune(&transcript, &config);
//!     println!("{} -> {}: {}", result.original_count, result.remaining_count, result.reason);
//! }
//! ```

pub mod engine;
pub mod importance;
pub mod message;
pub mod policy;
pub mod pruner;
pub mod stats;
pub mod tokens;

pub use engine::RetentionEngine;
pub use importance::{is_important, ImportanceRules, IMPORTANT_ACTIONS, IMPORTANT_KEYWORDS};
pub use message::{parse_transcript, Message, MessageRole};
pub use policy::{recommended_config, select_config, PolicyStrategy, PruningConfig};
pub use pruner::{
    prune, prune_at, prune_chronological, prune_chronological_at, prune_with, PruneStage,
    PruningResult, StageOutcome, TokenOrdering, NO_PRUNING_REASON,
};
pub use stats::{conversation_age_hours, needs_pruning, stats, ConversationStats};
pub use tokens::{estimate_message_tokens, estimate_tokens, estimate_transcript_tokens};
