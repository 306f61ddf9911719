pub mod cleaner;
pub mod http_client;
pub mod parsers;

use crate::config::ScraperConfig;
use crate::error::FetchError;
use crate::models::{RawStatementTable, StatementKind, StatementSet};
use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use self::cleaner::normalise_ticker;
use self::http_client::HttpClient;
use self::parsers::{parse_company_page, parse_peer_links};

// ── Source traits ─────────────────────────────────────────────────────────────

/// Swappable provider of raw statements for a ticker.
#[async_trait]
pub trait StatementSource: Send + Sync {
    async fn fetch_statement(
        &self,
        ticker: &str,
        kind: StatementKind,
    ) -> Result<RawStatementTable, FetchError>;

    /// All four statements. Each kind is fetched on its own and a failing
    /// kind stays empty. Sources backed by a single document override this to
    /// fetch it once.
    async fn fetch_statements(&self, ticker: &str) -> Result<StatementSet, FetchError> {
        let mut set = StatementSet::empty();
        for kind in StatementKind::ALL {
            match self.fetch_statement(ticker, kind).await {
                Ok(table) => set.set(table),
                Err(e) => warn!("{}: {} unavailable: {}", ticker, kind, e),
            }
        }
        Ok(set)
    }
}

/// Capability: ticker → comparable tickers.
#[async_trait]
pub trait PeerDiscovery: Send + Sync {
    /// Ordered peers, without the target, at most `max_peers` long.
    async fn discover_peers(&self, ticker: &str, max_peers: usize) -> anyhow::Result<Vec<String>>;
}

/// Fetch all four statements, degrading any failure to empty tables.
pub async fn collect_statements(source: &dyn StatementSource, ticker: &str) -> StatementSet {
    match source.fetch_statements(ticker).await {
        Ok(set) => {
            for kind in set.missing_sections() {
                warn!("{}: no {} data", ticker, kind);
            }
            set
        }
        Err(e) => {
            warn!("{}: statements unavailable: {}", ticker, e);
            StatementSet::empty()
        }
    }
}

/// Fetch a single statement, degrading failure to the empty table.
pub async fn fetch_statement_or_empty(
    source: &dyn StatementSource,
    ticker: &str,
    kind: StatementKind,
) -> RawStatementTable {
    source.fetch_statement(ticker, kind).await.unwrap_or_else(|e| {
        warn!("{}: {} unavailable: {}", ticker, kind, e);
        RawStatementTable::empty(kind)
    })
}

/// Applies the discovery contract to raw candidates: normalised, target
/// excluded, first occurrence kept, capped at `max_peers`.
pub fn finalize_peers<I>(target: &str, candidates: I, max_peers: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let target = normalise_ticker(target);
    let mut peers: Vec<String> = Vec::new();
    for candidate in candidates {
        let t = normalise_ticker(&candidate);
        if t.is_empty() || t == target || peers.contains(&t) {
            continue;
        }
        if peers.len() >= max_peers {
            break;
        }
        peers.push(t);
    }
    peers
}

// ── screener.in scraper ───────────────────────────────────────────────────────

pub struct ScreenerScraper {
    client: HttpClient,
    base_url: Url,
    consolidated: bool,
}

impl ScreenerScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: HttpClient::new(config)?,
            base_url: Url::parse(&format!("{}/", config.base_url.trim_end_matches('/')))?,
            consolidated: config.consolidated,
        })
    }

    /// e.g. ITC → https://www.screener.in/company/ITC/consolidated/
    fn company_url(&self, ticker: &str) -> Result<Url, FetchError> {
        let suffix = if self.consolidated { "consolidated/" } else { "" };
        let path = format!("company/{}/{}", normalise_ticker(ticker), suffix);
        Ok(self.base_url.join(&path)?)
    }

    fn peers_url(&self, ticker: &str) -> Result<Url, FetchError> {
        Ok(self
            .base_url
            .join(&format!("company/{}/peers/", normalise_ticker(ticker)))?)
    }

    async fn fetch_tables(
        &self,
        ticker: &str,
        kinds: &[StatementKind],
    ) -> Result<Vec<RawStatementTable>, FetchError> {
        let url = self.company_url(ticker)?;
        info!("📥 Fetching statements for {} ({})", ticker, url);

        let html = self.client.get_text(url.as_str()).await?;
        let tables = parse_company_page(&html, kinds)?;

        debug!(
            "{}: parsed {} statements ({} empty)",
            ticker,
            tables.len(),
            tables.iter().filter(|t| t.is_empty()).count()
        );
        Ok(tables)
    }
}

#[async_trait]
impl StatementSource for ScreenerScraper {
    async fn fetch_statement(
        &self,
        ticker: &str,
        kind: StatementKind,
    ) -> Result<RawStatementTable, FetchError> {
        let mut tables = self.fetch_tables(ticker, &[kind]).await?;
        Ok(tables.pop().unwrap_or_else(|| RawStatementTable::empty(kind)))
    }

    async fn fetch_statements(&self, ticker: &str) -> Result<StatementSet, FetchError> {
        let mut set = StatementSet::empty();
        for table in self.fetch_tables(ticker, &StatementKind::ALL).await? {
            set.set(table);
        }
        Ok(set)
    }
}

#[async_trait]
impl PeerDiscovery for ScreenerScraper {
    async fn discover_peers(&self, ticker: &str, max_peers: usize) -> anyhow::Result<Vec<String>> {
        let url = self.peers_url(ticker)?;
        info!("🔎 Discovering peers of {} ({})", ticker, url);

        let html = self.client.get_text(url.as_str()).await?;
        let links = parse_peer_links(&html, ticker)?;
        Ok(finalize_peers(ticker, links, max_peers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_peers_dedupes_excludes_and_caps() {
        let raw = ["tcs", "INFY", "TCS", "wipro", "Infy", "HCLTECH", "TECHM"]
            .map(String::from);
        assert_eq!(finalize_peers("wipro", raw.clone(), 3), vec!["TCS", "INFY", "HCLTECH"]);
        assert_eq!(finalize_peers("wipro", raw, 0), Vec::<String>::new());
    }

    #[test]
    fn company_urls() {
        let mut cfg = ScraperConfig::default();
        let s = ScreenerScraper::new(&cfg).unwrap();
        assert_eq!(
            s.company_url("itc").unwrap().as_str(),
            "https://www.screener.in/company/ITC/consolidated/"
        );
        assert_eq!(
            s.peers_url("ITC").unwrap().as_str(),
            "https://www.screener.in/company/ITC/peers/"
        );

        cfg.consolidated = false;
        cfg.base_url = "http://localhost:8080/".into();
        let s = ScreenerScraper::new(&cfg).unwrap();
        assert_eq!(s.company_url("ITC").unwrap().as_str(), "http://localhost:8080/company/ITC/");
    }
}
