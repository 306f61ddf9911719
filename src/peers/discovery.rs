use crate::llm::{ChatMessage, CompletionOptions, NarrativeClient};
use crate::scraper::{finalize_peers, PeerDiscovery};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Asks the chat model to name listed competitors.
pub struct LlmPeerDiscovery {
    client: Arc<dyn NarrativeClient>,
}

impl LlmPeerDiscovery {
    pub fn new(client: Arc<dyn NarrativeClient>) -> Self {
        Self { client }
    }
}

const DISCOVERY_SYSTEM: &str =
    "You are a stock market assistant. Reply with peer tickers only, nothing else.";

fn discovery_prompt(ticker: &str) -> String {
    format!(
        "List 3 to 5 companies listed on NSE or BSE that compete directly with the company below: \
same sector, overlapping products, similar customers or business model.\n\
Exclude the company itself, conglomerates, indices and numeric security codes.\n\
Answer with a single comma-separated list of tickers or company names.\n\n\
Example\nInput company: TITAN\nOutput: TBZ, KALYANKJIL, PCJEWELLER, SENCO\n\n\
Input company: {ticker}\nOutput:"
    )
}

/// Split a comma-separated model reply into candidate tickers.
pub fn parse_peer_reply(reply: &str) -> Vec<String> {
    let reply = reply.trim();
    let reply = reply.strip_prefix("Output:").unwrap_or(reply);
    reply
        .split([',', '\n'])
        .map(|p| p.trim().trim_matches(|c: char| c == '.' || c == '*' || c == '-').trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl PeerDiscovery for LlmPeerDiscovery {
    async fn discover_peers(&self, ticker: &str, max_peers: usize) -> anyhow::Result<Vec<String>> {
        info!("🔎 Asking {} for peers of {}", self.client.model(), ticker);
        let messages = [
            ChatMessage::system(DISCOVERY_SYSTEM),
            ChatMessage::user(discovery_prompt(ticker)),
        ];
        let reply = self
            .client
            .complete(&messages, &CompletionOptions::default())
            .await?;
        debug!("peer reply: {}", reply);

        Ok(finalize_peers(ticker, parse_peer_reply(&reply), max_peers))
    }
}

/// Fixed peer list, e.g. from the command line.
pub struct StaticPeers {
    peers: Vec<String>,
}

impl StaticPeers {
    pub fn new(peers: Vec<String>) -> Self {
        Self { peers }
    }
}

#[async_trait]
impl PeerDiscovery for StaticPeers {
    async fn discover_peers(&self, ticker: &str, max_peers: usize) -> anyhow::Result<Vec<String>> {
        Ok(finalize_peers(ticker, self.peers.iter().cloned(), max_peers))
    }
}
