//! Narrative flows: fetch → snapshot → prompt → model.

pub mod prompts;

use crate::llm::{ChatMessage, CompletionOptions, NarrativeClient};
use crate::models::{FinancialSnapshot, PeerBundle, StatementKind};
use crate::peers::PeerAggregator;
use crate::scraper::cleaner::normalise_ticker;
use crate::scraper::{collect_statements, PeerDiscovery, StatementSource};
use crate::snapshot::{assemble_from_set, render_peers, render_snapshot};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Fundamental,
    Forensic,
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnalysisKind::Fundamental => "fundamental analysis",
            AnalysisKind::Forensic => "forensic audit",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub ticker: String,
    pub kind: AnalysisKind,
    pub generated_at: DateTime<Utc>,
    pub missing_sections: Vec<StatementKind>,
    pub snapshot: FinancialSnapshot,
    pub narrative: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub generated_at: DateTime<Utc>,
    pub bundle: PeerBundle,
    pub narrative: String,
}

/// Runs analysis flows against explicitly supplied collaborators.
pub struct Analyst {
    source: Arc<dyn StatementSource>,
    client: Arc<dyn NarrativeClient>,
}

impl Analyst {
    pub fn new(source: Arc<dyn StatementSource>, client: Arc<dyn NarrativeClient>) -> Self {
        Self { source, client }
    }

    pub async fn analyze(&self, ticker: &str, kind: AnalysisKind) -> Result<AnalysisReport> {
        let ticker = normalise_ticker(ticker);
        info!("Running {} for {}", kind, ticker);

        let set = collect_statements(self.source.as_ref(), &ticker).await;
        let missing_sections = set.missing_sections();
        if !missing_sections.is_empty() {
            let names: Vec<String> = missing_sections.iter().map(|k| k.to_string()).collect();
            warn!(
                "⚠️ Missing data: {}. Proceeding with available information.",
                names.join(", ")
            );
        }

        let snapshot = assemble_from_set(&set);
        let summary = render_snapshot(&snapshot);
        let prompt = match kind {
            AnalysisKind::Fundamental => prompts::fundamental_prompt(&ticker, &summary, &missing_sections),
            AnalysisKind::Forensic => prompts::forensic_prompt(&ticker, &summary, &missing_sections),
        };

        let messages = [
            ChatMessage::system(prompts::ANALYST_SYSTEM),
            ChatMessage::user(prompt),
        ];
        let narrative = self
            .client
            .complete(&messages, &CompletionOptions::default())
            .await
            .with_context(|| format!("{} for {}", kind, ticker))?;

        Ok(AnalysisReport {
            ticker,
            kind,
            generated_at: Utc::now(),
            missing_sections,
            snapshot,
            narrative,
        })
    }

    pub async fn compare_peers(
        &self,
        ticker: &str,
        discovery: &dyn PeerDiscovery,
        max_peers: usize,
        concurrency: usize,
    ) -> Result<ComparisonReport> {
        let aggregator = PeerAggregator::new(Arc::clone(&self.source), concurrency);
        let bundle = aggregator.build_peer_bundle(ticker, discovery, max_peers).await;

        let prompt = prompts::comparison_prompt(
            &bundle.target.ticker,
            &bundle.peer_tickers(),
            &render_snapshot(&bundle.target.snapshot),
            &render_peers(&bundle),
        );
        let messages = [
            ChatMessage::system(prompts::COMPARISON_SYSTEM),
            ChatMessage::user(prompt),
        ];
        let narrative = self
            .client
            .complete(&messages, &CompletionOptions::default())
            .await
            .with_context(|| format!("peer comparison for {}", bundle.target.ticker))?;

        Ok(ComparisonReport {
            generated_at: Utc::now(),
            bundle,
            narrative,
        })
    }
}
