mod agent;
mod analysis;
mod config;
mod error;
mod loader;
mod llm;
mod models;
mod peers;
mod scraper;
mod snapshot;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::agent::{analysis_tools, ReactAgent};
use crate::analysis::{AnalysisKind, Analyst};
use crate::config::{AppConfig, DiscoveryStrategy};
use crate::llm::{NarrativeClient, OpenAiClient};
use crate::loader::CsvStatementSource;
use crate::models::StatementKind;
use crate::peers::discovery::{LlmPeerDiscovery, StaticPeers};
use crate::peers::PeerAggregator;
use crate::scraper::{
    collect_statements, fetch_statement_or_empty, PeerDiscovery, ScreenerScraper, StatementSource,
};
use crate::snapshot::lookup::{coerce_number, find_row, last_n_periods, LinePattern};
use crate::snapshot::{assemble_from_set, render_peers, render_snapshot, MISSING};

#[derive(Parser)]
#[command(name = "screener-analyst", about = "Financial statement snapshots and LLM analysis", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Read statements from <DIR>/<TICKER>/*.csv instead of scraping
    #[arg(long, global = true, value_name = "DIR")]
    offline: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build and print the financial snapshot for a ticker
    Snapshot { ticker: String },

    /// Look up a single line item in one statement
    Lookup {
        ticker: String,

        #[arg(short, long, value_enum)]
        statement: StatementKind,

        /// Case-insensitive substrings; the first row matching any of them wins
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Run a fundamental analysis or forensic audit through the model
    Analyze {
        ticker: String,

        #[arg(short, long, value_enum, default_value = "fundamental")]
        mode: AnalysisKind,
    },

    /// Compare a ticker against its peers
    Peers {
        ticker: String,

        /// Maximum number of peers (default from config)
        #[arg(long)]
        max: Option<usize>,

        /// How to find peers (default from config)
        #[arg(long, value_enum)]
        discovery: Option<DiscoveryStrategy>,

        /// Explicit comma-separated peer list; overrides discovery
        #[arg(long, value_delimiter = ',')]
        peers: Vec<String>,

        /// Only build the bundle, skip the model call
        #[arg(long)]
        no_narrative: bool,
    },

    /// Let the model pick analysis tools to answer a question
    Agent {
        ticker: String,

        #[arg(short, long, default_value = "Check for red flags and financial health.")]
        query: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "screener_analyst=info,warn",
        1 => "screener_analyst=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    let scraper = Arc::new(
        ScreenerScraper::new(&config.scraper).context("Failed to build scraper")?,
    );
    let source: Arc<dyn StatementSource> = match &cli.offline {
        Some(dir) => {
            info!("Reading statements from {:?}", dir);
            Arc::new(CsvStatementSource::new(dir))
        }
        None => scraper.clone(),
    };
    let narrative_client = || -> Result<Arc<dyn NarrativeClient>> {
        Ok(Arc::new(
            OpenAiClient::new(&config.llm).context("Failed to build chat client")?,
        ))
    };

    match cli.command {
        Command::Snapshot { ticker } => {
            let _t = utils::Timer::start(format!("Snapshot {}", ticker));
            let set = collect_statements(source.as_ref(), &ticker).await;
            let snap = assemble_from_set(&set);

            if cli.json {
                print_json(&snap)?;
            } else {
                println!("{}", render_snapshot(&snap));
                let missing = snap.missing_fields();
                if !missing.is_empty() {
                    println!("⚠️  Unavailable: {}", missing.join(", "));
                }
            }
        }

        Command::Lookup { ticker, statement, items } => {
            let table = fetch_statement_or_empty(source.as_ref(), &ticker, statement).await;
            let needles: Vec<&str> = items.iter().map(String::as_str).collect();
            let row = find_row(&table, &LinePattern::any(&needles));
            if row.is_missing() {
                warn!("{}: no {} row matching {:?}", ticker, statement, items);
            }
            let latest = row.periods().last().copied().flatten();

            println!("─────────────────────────────────");
            println!("  {} | {}", ticker.to_uppercase(), statement);
            println!("─────────────────────────────────");
            println!("  Row      : {}", row.label().unwrap_or(MISSING));
            println!("  Latest   : {}", latest.unwrap_or(MISSING));
            println!(
                "  Numeric  : {}",
                coerce_number(latest).map(|v| v.to_string()).unwrap_or(MISSING.into())
            );
            let series: Vec<String> = last_n_periods(&row, 5)
                .into_iter()
                .map(|c| c.unwrap_or_else(|| MISSING.to_string()))
                .collect();
            println!("  Last 5   : {}", series.join(" | "));
            println!("─────────────────────────────────");
        }

        Command::Analyze { ticker, mode } => {
            let _t = utils::Timer::start(format!("{} of {}", mode, ticker));
            let analyst = Analyst::new(source, narrative_client()?);
            let report = analyst.analyze(&ticker, mode).await?;

            if cli.json {
                print_json(&report)?;
            } else {
                println!("{}", report.narrative);
            }
        }

        Command::Peers { ticker, max, discovery, peers, no_narrative } => {
            let _t = utils::Timer::start(format!("Peer comparison for {}", ticker));
            let max_peers = max.unwrap_or(config.peers.max_peers);

            let discovery: Arc<dyn PeerDiscovery> = if !peers.is_empty() {
                Arc::new(StaticPeers::new(peers))
            } else {
                match discovery.unwrap_or(config.peers.discovery) {
                    DiscoveryStrategy::Scrape => scraper.clone(),
                    DiscoveryStrategy::Llm => Arc::new(LlmPeerDiscovery::new(narrative_client()?)),
                }
            };

            if no_narrative {
                let aggregator = PeerAggregator::new(source, config.peers.concurrency);
                let bundle = aggregator
                    .build_peer_bundle(&ticker, discovery.as_ref(), max_peers)
                    .await;
                if cli.json {
                    print_json(&bundle)?;
                } else {
                    println!("{}:\n{}", bundle.target.ticker, render_snapshot(&bundle.target.snapshot));
                    println!("{}", render_peers(&bundle));
                    for s in &bundle.skipped {
                        println!("⚠️  Skipped {}: {}", s.ticker, s.reason);
                    }
                }
                return Ok(());
            }

            let analyst = Analyst::new(source, narrative_client()?);
            let report = analyst
                .compare_peers(&ticker, discovery.as_ref(), max_peers, config.peers.concurrency)
                .await?;

            if cli.json {
                print_json(&report)?;
            } else {
                println!("{}", report.narrative);
            }
        }

        Command::Agent { ticker, query } => {
            let _t = utils::Timer::start(format!("Agent run for {}", ticker));
            let client = narrative_client()?;
            let analyst = Arc::new(Analyst::new(source, Arc::clone(&client)));
            let agent = ReactAgent::new(
                client,
                analysis_tools(analyst),
                config.agent.max_iterations,
                config.agent.temperature,
            );
            let outcome = agent.run(&query, &ticker.to_uppercase()).await?;

            if cli.json {
                print_json(&outcome)?;
            } else {
                println!("📋 Final Answer\n{}\n", outcome.output);
                println!("🔍 Agent Trace");
                for step in &outcome.steps {
                    println!("🛠️  Tool Used: {}", step.tool);
                    println!("🧾 Tool Input: {}", step.input);
                    println!("📤 Tool Output:\n{}\n---", step.observation);
                }
            }
        }
    }

    Ok(())
}
