//! Human-readable output

use colored::Colorize;
use retention_core::retention::{ConversationStats, Message, PruningConfig, PruningResult};

const PREVIEW_CHARS: usize = 60;

pub fn print_stats(stats: &ConversationStats) {
    println!("{}", "CONVERSATION".bold());
    println!("   ├─ messages:    {}", stats.total_messages);
    println!("   ├─ characters:  {}", stats.total_characters);
    println!("   ├─ avg length:  {}", stats.avg_message_length);
    println!("   ├─ est. tokens: {}", stats.estimated_tokens);
    println!("   └─ span:        {:.1}h", stats.conversation_age_hours);

    if stats.needs_pruning {
        println!("{}", "Pruning needed".yellow());
    } else {
        println!("{}", "Within limits".green());
    }
}

pub fn print_result(config: &PruningConfig, result: &PruningResult) {
    println!("{}", "POLICY".bold());
    println!(
        "   max {} messages, {} tokens, {}h, keep last {}, importance {}",
        config.max_messages,
        config.max_tokens,
        config.max_age_hours,
        config.preserve_last_n,
        if config.preserve_important { "on" } else { "off" }
    );

    println!("{}", "RESULT".bold());
    println!(
        "   {} -> {} messages ({} pruned)",
        result.original_count, result.remaining_count, result.pruned_count
    );

    if !result.was_pruned() {
        println!("   {}", result.reason.green());
        return;
    }

    for stage in &result.stages {
        println!("   ├─ {:<12} {}", stage.stage.to_string(), stage.reason.yellow());
    }
    println!("   └─ {}", result.reason);

    println!("{}", "PRUNED".bold());
    for msg in &result.pruned_messages {
        println!("   - {}", preview(msg).dimmed());
    }
}

fn preview(msg: &Message) -> String {
    let mut text: String = msg.content.chars().take(PREVIEW_CHARS).collect();
    if msg.content.chars().count() > PREVIEW_CHARS {
        text.push_str("...");
    }
    match msg.timestamp {
        Some(ts) => format!("[{:?} {}] {}", msg.role, ts.format("%Y-%m-%d %H:%M"), text),
        None => format!("[{:?}] {}", msg.role, text),
    }
}
