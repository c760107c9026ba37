// src/harvest/mod.rs
pub mod aggregator;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod harvester;
pub mod orchestrator;
pub mod types;

use std::sync::Arc;

use anyhow::Result;

use crate::harvest::config::HarvestConfig;
use crate::harvest::fetch::HttpFetcher;
use crate::harvest::orchestrator::{Backends, HarvestReport, Orchestrator};
use crate::store::firestore::FirestoreStore;
use crate::store::memory::MemoryStore;
use crate::store::storage::CloudStorageMirror;
use crate::store::GcpHandle;

/// Wire the real backends from config. Without a store section the run is a
/// dry-run: empty in-memory oracle, no mirror, no writes.
pub fn backends_from_config(cfg: &HarvestConfig) -> Result<Backends> {
    let fetcher = Arc::new(HttpFetcher::new(&cfg.user_agent, cfg.request_timeout())?);

    match &cfg.store {
        Some(store_cfg) => {
            let handle = GcpHandle::connect(store_cfg, cfg.request_timeout())?;
            let store = Arc::new(FirestoreStore::new(Arc::clone(&handle)));
            Ok(Backends {
                fetcher,
                oracle: store.clone(),
                mirror: Some(Arc::new(CloudStorageMirror::new(handle))),
                store: Some(store),
            })
        }
        None => Ok(Backends {
            fetcher,
            oracle: Arc::new(MemoryStore::new()),
            mirror: None,
            store: None,
        }),
    }
}

/// Run one full harvest batch with the given config.
pub async fn run_once(cfg: &HarvestConfig) -> Result<HarvestReport> {
    let backends = backends_from_config(cfg)?;
    let orchestrator = Orchestrator::new(backends, cfg.channel_capacity);
    Ok(orchestrator.run(&cfg.sources).await)
}
