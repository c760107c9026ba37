// src/store/mod.rs
//! Record store, dedup oracle, and document mirror seams.
//!
//! The harvest core only sees the three traits below. Concrete backends:
//! - `firestore::FirestoreStore` (oracle + record store over Firestore REST)
//! - `storage::CloudStorageMirror` (leaflet mirror over the GCS JSON API)
//! - `memory::MemoryStore` (dry-run and tests)

pub mod firestore;
pub mod memory;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::harvest::config::StoreConfig;
use crate::harvest::types::Listing;

/// Lookup of previously recorded listings by fingerprint.
#[async_trait]
pub trait DedupOracle: Send + Sync {
    /// `Ok(None)` when nothing matches; errors are transport/decoding failures only.
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<Listing>>;
}

/// Final resting place of accepted listings.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, listing: &Listing) -> Result<()>;
}

/// Copies a linked document into durable storage.
#[async_trait]
pub trait DocumentMirror: Send + Sync {
    /// Download `source_link`, store it under a sanitized `key`, return its public URL.
    async fn mirror(&self, source_link: &str, key: &str) -> Result<String>;
}

/// Process-wide connection to the Google project backing the store and the bucket.
///
/// Built once in `main` and handed out by `Arc`; there is no global instance.
pub struct GcpHandle {
    pub http: reqwest::Client,
    pub project_id: String,
    pub collection: String,
    pub bucket: String,
    access_token: String,
}

impl GcpHandle {
    pub fn connect(cfg: &StoreConfig, timeout: Duration) -> Result<Arc<Self>> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building store http client")?;
        Ok(Arc::new(Self {
            http,
            project_id: cfg.project_id.clone(),
            collection: cfg.collection.clone(),
            bucket: cfg.bucket.clone(),
            access_token: cfg.access_token.clone(),
        }))
    }

    pub(crate) fn bearer(&self) -> &str {
        &self.access_token
    }
}
