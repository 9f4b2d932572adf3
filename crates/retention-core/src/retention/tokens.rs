//! # Token Estimation
//!
//! Approximates token cost at roughly one token per four characters,
//! without a real tokenizer.

use crate::retention::message::Message;

/// Characters per estimated token
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate tokens for a piece of text: `ceil(chars / 4)`
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Estimate tokens for a single message's content
pub fn estimate_message_tokens(message: &Message) -> usize {
    estimate_tokens(&message.content)
}

/// Sum of per-message estimates
pub fn estimate_transcript_tokens<'a, I>(messages: I) -> usize
where
    I: IntoIterator<Item = &'a Message>,
{
    messages.into_iter().map(estimate_message_tokens).sum()
}
