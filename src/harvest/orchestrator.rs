// src/harvest/orchestrator.rs
use std::sync::Arc;

use metrics::{counter, gauge};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use crate::harvest::aggregator::Aggregator;
use crate::harvest::fetch::PageFetcher;
use crate::harvest::harvester::{harvest_source, HarvestOutcome};
use crate::harvest::types::{Listing, SourceRule};
use crate::metrics as m;
use crate::store::{DedupOracle, DocumentMirror, RecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestPhase {
    Idle,
    Harvesting,
    Draining,
    Persisting,
    Done,
}

/// Collaborators shared by every task of a run.
#[derive(Clone)]
pub struct Backends {
    pub fetcher: Arc<dyn PageFetcher>,
    pub oracle: Arc<dyn DedupOracle>,
    /// `None` skips mirroring; document listings keep an empty `document_url`.
    pub mirror: Option<Arc<dyn DocumentMirror>>,
    /// `None` means dry-run: the batch is collected but not written.
    pub store: Option<Arc<dyn RecordStore>>,
}

#[derive(Debug, Clone, Default)]
pub struct HarvestReport {
    pub harvesters_started: usize,
    pub harvesters_completed: usize,
    pub fetch_failures: usize,
    pub outcomes: Vec<HarvestOutcome>,
    pub batch: Vec<Listing>,
    /// Listings dropped because another source already emitted their fingerprint.
    pub batch_repeats: usize,
    pub persisted: usize,
    pub persist_failures: usize,
    pub persistence_skipped: bool,
}

/// Runs one batch: harvest every source concurrently, then persist the
/// complete batch concurrently. Writes never start before the batch is final.
pub struct Orchestrator {
    backends: Backends,
    channel_capacity: usize,
    phase_tx: watch::Sender<HarvestPhase>,
}

impl Orchestrator {
    pub fn new(backends: Backends, channel_capacity: usize) -> Self {
        let (phase_tx, _) = watch::channel(HarvestPhase::Idle);
        Self {
            backends,
            channel_capacity: channel_capacity.max(1),
            phase_tx,
        }
    }

    /// Observe phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<HarvestPhase> {
        self.phase_tx.subscribe()
    }

    pub fn phase(&self) -> HarvestPhase {
        *self.phase_tx.borrow()
    }

    fn enter(&self, phase: HarvestPhase) {
        tracing::debug!(?phase, "harvest phase");
        self.phase_tx.send_replace(phase);
    }

    pub async fn run(&self, sources: &[SourceRule]) -> HarvestReport {
        m::ensure_described();
        let mut report = HarvestReport::default();

        // Idle -> Harvesting
        self.enter(HarvestPhase::Harvesting);
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let aggregator = Aggregator::spawn(rx);

        let mut harvesters = JoinSet::new();
        for rule in sources.iter().cloned() {
            let b = self.backends.clone();
            let sink = tx.clone();
            harvesters.spawn(async move {
                harvest_source(
                    &rule,
                    b.fetcher.as_ref(),
                    b.oracle.as_ref(),
                    b.mirror.as_deref(),
                    sink,
                )
                .await
            });
            report.harvesters_started += 1;
        }

        // Harvesting -> Draining: every harvester must have completed
        while let Some(joined) = harvesters.join_next().await {
            report.harvesters_completed += 1;
            match joined {
                Ok(outcome) => {
                    if outcome.fetch_failed {
                        report.fetch_failures += 1;
                    }
                    report.outcomes.push(outcome);
                }
                Err(e) => {
                    // its Sender was dropped with the task, so the channel still closes
                    tracing::error!(error = ?e, "harvester task aborted");
                    report.fetch_failures += 1;
                }
            }
        }
        self.enter(HarvestPhase::Draining);

        // Draining -> Persisting: close our Sender, wait for the batch
        drop(tx);
        let collected = aggregator.finish().await;
        report.batch = collected.listings;
        report.batch_repeats = collected.repeats;
        tracing::info!(
            sources = report.harvesters_started,
            listings = report.batch.len(),
            repeats = report.batch_repeats,
            "harvest collected"
        );

        self.enter(HarvestPhase::Persisting);
        match &self.backends.store {
            Some(store) => {
                let (ok, failed) = persist_all(store, &report.batch).await;
                report.persisted = ok;
                report.persist_failures = failed;
            }
            None => {
                tracing::info!("no record store configured; skipping persistence");
                report.persistence_skipped = true;
            }
        }

        // Persisting -> Done
        self.enter(HarvestPhase::Done);
        gauge!(m::LAST_RUN_TS).set(chrono::Utc::now().timestamp().max(0) as f64);
        report
    }
}

/// One write task per listing; a failed write never affects its siblings.
async fn persist_all(store: &Arc<dyn RecordStore>, batch: &[Listing]) -> (usize, usize) {
    let mut writes = JoinSet::new();
    for listing in batch.iter().cloned() {
        let store = Arc::clone(store);
        writes.spawn(async move {
            let res = store.insert(&listing).await;
            (listing.fingerprint, res)
        });
    }

    let (mut ok, mut failed) = (0usize, 0usize);
    while let Some(joined) = writes.join_next().await {
        match joined {
            Ok((_, Ok(()))) => ok += 1,
            Ok((fingerprint, Err(e))) => {
                tracing::warn!(error = ?e, fingerprint = %fingerprint, "persist failed");
                failed += 1;
            }
            Err(e) => {
                tracing::error!(error = ?e, "persist task aborted");
                failed += 1;
            }
        }
    }
    counter!(m::PERSISTED).increment(ok as u64);
    counter!(m::PERSIST_ERRORS).increment(failed as u64);
    (ok, failed)
}
