//! Peer aggregation: the same snapshot pipeline applied to a target and its peers.
//!
//! The target always gets a snapshot (degraded to missing fields if its
//! statements are unavailable). Each peer is fetched independently; a peer
//! whose fetch fails or whose statements are all empty is left out of the
//! bundle and recorded in `skipped`.

pub mod discovery;

use crate::models::{CompanySnapshot, PeerBundle, SkippedPeer};
use crate::scraper::cleaner::normalise_ticker;
use crate::scraper::{collect_statements, PeerDiscovery, StatementSource};
use crate::snapshot::assemble_from_set;
use anyhow::{anyhow, Context};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

pub struct PeerAggregator {
    source: Arc<dyn StatementSource>,
    concurrency: usize,
}

impl PeerAggregator {
    pub fn new(source: Arc<dyn StatementSource>, concurrency: usize) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn build_peer_bundle(
        &self,
        target: &str,
        discovery: &dyn PeerDiscovery,
        max_peers: usize,
    ) -> PeerBundle {
        let target = normalise_ticker(target);

        let target_set = collect_statements(self.source.as_ref(), &target).await;
        let target_snapshot = CompanySnapshot {
            ticker: target.clone(),
            snapshot: assemble_from_set(&target_set),
        };

        let mut tickers = match discovery.discover_peers(&target, max_peers).await {
            Ok(t) => t,
            Err(e) => {
                warn!("{}: peer discovery failed: {:#}", target, e);
                Vec::new()
            }
        };
        tickers.truncate(max_peers);
        info!("{}: {} peers to compare: {:?}", target, tickers.len(), tickers);

        let sem = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::new();

        for ticker in tickers {
            let source = Arc::clone(&self.source);
            let sem = Arc::clone(&sem);
            let symbol = ticker.clone();

            let handle = tokio::spawn(async move {
                let _permit = sem.acquire().await?;

                let set = source
                    .fetch_statements(&symbol)
                    .await
                    .with_context(|| format!("fetch_statements({})", symbol))?;

                if set.all_empty() {
                    return Err(anyhow!("no statement data for {}", symbol));
                }

                Ok::<_, anyhow::Error>(assemble_from_set(&set))
            });

            handles.push((ticker, handle));
        }

        let mut peers = Vec::new();
        let mut skipped = Vec::new();
        for (ticker, handle) in handles {
            match handle.await {
                Ok(Ok(snapshot)) => peers.push(CompanySnapshot { ticker, snapshot }),
                Ok(Err(e)) => {
                    warn!("Skipping {}: {:#}", ticker, e);
                    skipped.push(SkippedPeer { ticker, reason: format!("{:#}", e) });
                }
                Err(e) => {
                    error!("Task panic for {}: {}", ticker, e);
                    skipped.push(SkippedPeer { ticker, reason: e.to_string() });
                }
            }
        }

        info!(
            "{}: bundle has {} peers ({} skipped)",
            target,
            peers.len(),
            skipped.len()
        );

        PeerBundle {
            target: target_snapshot,
            peers,
            skipped,
        }
    }
}
