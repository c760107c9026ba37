// src/harvest/aggregator.rs
use std::collections::HashSet;

use metrics::counter;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::harvest::types::Listing;
use crate::metrics as m;

/// What the aggregator hands back once the channel closes.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub listings: Vec<Listing>,
    /// Listings dropped because an earlier one (from any source) had the same fingerprint.
    pub repeats: usize,
}

/// Sole consumer of the harvest channel. Owns the batch; producers only ever
/// hold a `Sender`.
pub struct Aggregator {
    task: JoinHandle<Collected>,
}

impl Aggregator {
    pub fn spawn(mut rx: mpsc::Receiver<Listing>) -> Self {
        let task = tokio::spawn(async move {
            let mut out = Collected::default();
            // one offer can be listed by several sources (e.g. two category tabs)
            let mut seen: HashSet<String> = HashSet::new();
            while let Some(listing) = rx.recv().await {
                if !seen.insert(listing.fingerprint.clone()) {
                    tracing::debug!(fingerprint = %listing.fingerprint, "repeat across sources dropped");
                    out.repeats += 1;
                    continue;
                }
                out.listings.push(listing);
            }
            counter!(m::BATCH_REPEATS).increment(out.repeats as u64);
            out
        });
        Self { task }
    }

    /// Resolves once every `Sender` is dropped and the channel is drained.
    /// Batch order is receipt order; the first listing per fingerprint wins.
    pub async fn finish(self) -> Collected {
        match self.task.await {
            Ok(collected) => collected,
            Err(e) => {
                tracing::error!(error = ?e, "aggregator task failed; batch lost");
                Collected::default()
            }
        }
    }
}
