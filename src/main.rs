use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use futures_util::StreamExt;
use research_stream::config::{find_config_file, get_config, load_config};
use research_stream::llm::ChatClient;
use research_stream::models::SnapshotEvent;
use research_stream::producers::{GoogleSearchProvider, OpenAiTermSource, PdfSummarizer};
use research_stream::research::{sequence_snapshots, ResearchOptions, Researcher};
use research_stream::ui;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sentinel line written after the last JSON record
const END_STREAM_SENTINEL: &str = "<<HALT>>";

/// Research a topic and stream the growing result tree
#[derive(Parser, Debug)]
#[command(name = "research-stream")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate search terms for a topic, search the web, summarize documents, and stream the growing result tree", long_about = None)]
struct Cli {
    /// Topic to research
    topic: String,

    /// Enable verbose logging (can be used multiple times: -v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of search terms to generate
    #[arg(long)]
    terms: Option<usize>,

    /// Number of search results to process per term
    #[arg(long)]
    results: Option<usize>,

    /// Emit a snapshot for every document that starts processing
    #[arg(long, default_value_t = false)]
    heartbeats: bool,
}

/// Output format for snapshot delivery
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (tree if TTY, NDJSON otherwise)
    Auto,
    /// NDJSON snapshot records terminated by the <<HALT>> sentinel
    Json,
    /// Rendered tree once the run completes
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let mut config = match cli.config.clone().or_else(find_config_file) {
        Some(path) => load_config(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => get_config(),
    };
    if let Some(terms) = cli.terms {
        config.research.terms_per_research = terms;
    }
    if let Some(results) = cli.results {
        config.research.results_per_term = results;
    }
    if cli.heartbeats {
        config.research.emit_heartbeats = true;
    }

    let llm = Arc::new(ChatClient::new(&config.llm));
    let researcher = Researcher::new(
        Arc::new(OpenAiTermSource::new(llm.clone())),
        Arc::new(GoogleSearchProvider::new(&config.search)),
        Arc::new(PdfSummarizer::new(llm, &config.llm, &config.downloads)),
    )
    .with_options(ResearchOptions {
        terms_per_research: config.research.terms_per_research,
        results_per_term: config.research.results_per_term,
        emit_heartbeats: config.research.emit_heartbeats,
    });

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping research");
            signal_cancel.cancel();
        }
    });

    let json_output = match cli.output {
        OutputFormat::Json => true,
        OutputFormat::Text => false,
        OutputFormat::Auto => !ui::is_terminal(),
    };

    let events = sequence_snapshots(researcher.run_with_cancel(&cli.topic, cancel));
    futures_util::pin_mut!(events);

    let mut last = None;
    while let Some(event) = events.next().await {
        match event {
            SnapshotEvent::Snapshot(snapshot) => {
                if json_output {
                    println!("{}", serde_json::to_string(&snapshot)?);
                }
                last = Some(snapshot.research);
            }
            SnapshotEvent::Failed { message } => {
                if json_output {
                    println!("{}", serde_json::json!({ "error": message }));
                }
                anyhow::bail!("research failed: {message}");
            }
            SnapshotEvent::Done => {
                if json_output {
                    println!("{END_STREAM_SENTINEL}");
                }
            }
        }
    }

    if !json_output {
        if let Some(research) = last {
            println!("{}", ui::render_research(&research, ui::is_terminal()));
        }
    }

    Ok(())
}

fn init_tracing(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
