//! Retention Core - budget-constrained pruning for chat transcripts
//!
//! Retention Core decides which messages of a conversation must be kept,
//! trimmed, or dropped before the transcript is forwarded to a language
//! model.
//!
//! # Architecture
//!
//! The engine has four cooperating parts, each a pure function over the
//! transcript:
//!
//! 1. **Token Estimator** (`retention::tokens`): ~4 characters per token
//! 2. **Importance Classifier** (`retention::importance`): messages the
//!    token-budget filter must keep
//! 3. **Multi-Strategy Pruner** (`retention::pruner`): age, count, and token
//!    filters around an inviolable tail
//! 4. **Policy & Stats** (`retention::policy`, `retention::stats`): adaptive
//!    config selection and the fixed pruning trigger
//!
//! # Quick Start
//!
//! ```
//! use retention_core::retention::{Message, PruningConfig, RetentionEngine};
//!
//! let transcript = vec![
//!     Message::user("Create a contact for Jane Doe"),
//!     Message::assistant("Contact created for Jane Doe").with_action("contact_created"),
//!     Message::user("Thanks!"),
//! ];
//!
//! let engine = RetentionEngine::new();
//! let config = PruningConfig::standard().with_max_messages(2).with_preserve_last_n(1);
//! let result = engine.prune(&transcript, &config);
//!
//! assert_eq!(result.remaining_count, 2);
//! assert_eq!(result.pruned_count, 1);
//! ```
//!
//! # Design Principles
//!
//! 1. **No mutation**: inputs are borrowed, outputs are new transcripts
//! 2. **Trusted configs**: pruning never validates; `PruningConfig::validate`
//!    is opt-in
//! 3. **No I/O**: parsing helpers take strings, never paths

#![deny(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod error;
pub mod retention;

pub use error::{Result, RetentionError, ResultExt};
pub use retention::{
    ConversationStats, ImportanceRules, Message, MessageRole, PolicyStrategy, PruningConfig,
    PruningResult, RetentionEngine,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
