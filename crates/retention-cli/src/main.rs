use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use retention_core::retention::{
    parse_transcript, Message, PolicyStrategy, PruningConfig, RetentionEngine, TokenOrdering,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod report;

/// Retention CLI - trim chat transcripts to fit a model budget
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show transcript statistics
    Stats {
        /// JSON transcript file
        file: PathBuf,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Report whether the transcript exceeds the default limits
    Check {
        /// JSON transcript file
        file: PathBuf,
    },

    /// Prune the transcript
    Prune(PruneArgs),
}

#[derive(clap::Args)]
struct PruneArgs {
    /// JSON transcript file
    file: PathBuf,

    /// Adaptive table used when no config file is given
    #[arg(long, value_enum, default_value_t = StrategyArg::Adaptive)]
    strategy: StrategyArg,

    /// TOML or JSON pruning config, replaces adaptive selection
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long)]
    max_messages: Option<usize>,

    #[arg(long)]
    max_tokens: Option<usize>,

    #[arg(long)]
    max_age_hours: Option<f64>,

    #[arg(long)]
    preserve_last_n: Option<usize>,

    /// Let the token budget drop important messages too
    #[arg(long)]
    no_preserve_important: bool,

    /// Keep survivors in original order
    #[arg(long)]
    chronological: bool,

    /// Prune even when the transcript is within the default limits
    #[arg(short, long)]
    force: bool,

    /// Print the retained transcript as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Adaptive,
    Recommended,
}

impl From<StrategyArg> for PolicyStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Adaptive => PolicyStrategy::Adaptive,
            StrategyArg::Recommended => PolicyStrategy::Recommended,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Stats { file, json } => {
            let transcript = load_transcript(&file)?;
            let stats = RetentionEngine::new().stats(&transcript);

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                report::print_stats(&stats);
            }
        }
        Commands::Check { file } => {
            let transcript = load_transcript(&file)?;
            if RetentionEngine::new().needs_pruning(&transcript) {
                println!("Pruning needed ({} messages)", transcript.len());
            } else {
                println!("Within limits ({} messages)", transcript.len());
            }
        }
        Commands::Prune(args) => run_prune(args)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    } else if verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn run_prune(args: PruneArgs) -> anyhow::Result<()> {
    let transcript = load_transcript(&args.file)?;
    let ordering = if args.chronological {
        TokenOrdering::Chronological
    } else {
        TokenOrdering::Reference
    };
    let engine = RetentionEngine::new()
        .with_strategy(args.strategy.into())
        .with_ordering(ordering);

    if !args.force && !engine.needs_pruning(&transcript) {
        tracing::info!("Transcript within default limits, nothing to prune");
        if args.json {
            println!("{}", serde_json::to_string_pretty(&transcript)?);
        }
        return Ok(());
    }

    let config = resolve_config(&args, &engine, &transcript)?;
    tracing::debug!("Pruning with {:?}", config);

    let result = engine.prune(&transcript, &config);
    tracing::info!("{}", result.reason);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.messages)?);
    } else {
        report::print_result(&config, &result);
    }
    Ok(())
}

fn resolve_config(
    args: &PruneArgs,
    engine: &RetentionEngine,
    transcript: &[Message],
) -> anyhow::Result<PruningConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => engine.select_config(transcript),
    };

    if let Some(n) = args.max_messages {
        config = config.with_max_messages(n);
    }
    if let Some(n) = args.max_tokens {
        config = config.with_max_tokens(n);
    }
    if let Some(h) = args.max_age_hours {
        config = config.with_max_age_hours(h);
    }
    if let Some(n) = args.preserve_last_n {
        config = config.with_preserve_last_n(n);
    }
    if args.no_preserve_important {
        config = config.with_preserve_important(false);
    }

    config.validate()?;
    Ok(config)
}

fn load_transcript(path: &Path) -> anyhow::Result<Vec<Message>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript {:?}", path))?;
    let transcript = parse_transcript(&content)
        .with_context(|| format!("Failed to parse transcript {:?}", path))?;
    tracing::debug!("Loaded {} messages from {:?}", transcript.len(), path);
    Ok(transcript)
}

fn load_config(path: &Path) -> anyhow::Result<PruningConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;

    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let config = if is_json {
        PruningConfig::from_json_str(&content)
    } else {
        PruningConfig::from_toml_str(&content)
    };
    config.with_context(|| format!("Failed to parse config {:?}", path))
}
