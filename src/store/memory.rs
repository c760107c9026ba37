// src/store/memory.rs
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use async_trait::async_trait;

use super::{DedupOracle, RecordStore};
use crate::harvest::types::Listing;

/// In-process oracle + record store keyed by fingerprint.
///
/// Backs dry-runs (no credentials) and tests. Inserting a fingerprint twice
/// keeps the later record, matching a store that does not enforce uniqueness.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Listing>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records<I: IntoIterator<Item = Listing>>(records: I) -> Self {
        let map = records
            .into_iter()
            .map(|l| (l.fingerprint.clone(), l))
            .collect();
        Self {
            records: Mutex::new(map),
        }
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DedupOracle for MemoryStore {
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<Listing>> {
        let map = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(fingerprint).cloned())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, listing: &Listing) -> Result<()> {
        let mut map = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        map.insert(listing.fingerprint.clone(), listing.clone());
        Ok(())
    }
}
