// tests/common/mod.rs
// Shared fakes for the harvest integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use specials_harvester::harvest::fetch::{FixtureFetcher, PageFetcher};
use specials_harvester::store::{DedupOracle, DocumentMirror, RecordStore};
use specials_harvester::{Listing, SourceKind, SourceRule};

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{name}")).expect("fixture")
}

pub fn rule(name: &str, url: &str, kind: SourceKind) -> SourceRule {
    SourceRule {
        name: name.to_string(),
        url: url.to_string(),
        category: "Groceries".to_string(),
        kind,
    }
}

pub fn groceries_tab() -> SourceKind {
    SourceKind::SpecialsNamibia {
        tab_selector: "#nav-groceries".to_string(),
    }
}

/// Every layout with its fixture page, served from memory.
pub fn all_sources() -> (Vec<SourceRule>, FixtureFetcher) {
    let sources = vec![
        rule("Specials Namibia", "https://specials.test/", groceries_tab()),
        rule("Pick n Pay", "https://pnp.test/", SourceKind::PickNPay),
        rule("Shoprite", "https://shoprite.test/", SourceKind::Shoprite),
        rule("Spar Marua", "https://spar.test/", SourceKind::SparMaerua),
        rule("Checkers", "https://checkers.test/", SourceKind::Checkers),
        rule(
            "OK Foods",
            "https://ok.test/",
            SourceKind::OkFoods {
                base_url: "https://www.okfoods.co.za".to_string(),
            },
        ),
    ];
    let fetcher = FixtureFetcher::new()
        .with_page("https://specials.test/", fixture("specials_namibia.html"))
        .with_page("https://pnp.test/", fixture("pick_n_pay.html"))
        .with_page("https://shoprite.test/", fixture("shoprite.html"))
        .with_page("https://spar.test/", fixture("spar_maerua.html"))
        .with_page("https://checkers.test/", fixture("checkers.html"))
        .with_page("https://ok.test/", fixture("ok_foods.html"));
    (sources, fetcher)
}

/// Oracle whose every lookup fails.
pub struct FailingOracle;

#[async_trait]
impl DedupOracle for FailingOracle {
    async fn find_by_fingerprint(&self, _fingerprint: &str) -> Result<Option<Listing>> {
        Err(anyhow!("store unavailable"))
    }
}

/// Mirror that records calls and either succeeds or fails.
pub struct RecordingMirror {
    pub fail: bool,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl RecordingMirror {
    pub fn ok() -> Self {
        Self {
            fail: false,
            calls: Mutex::new(vec![]),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl DocumentMirror for RecordingMirror {
    async fn mirror(&self, source_link: &str, key: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((source_link.to_string(), key.to_string()));
        if self.fail {
            Err(anyhow!("upload refused"))
        } else {
            Ok(format!("https://mirror.test/{}", key.len()))
        }
    }
}

/// Delays one URL, then flags that its fetch finished.
pub struct SlowFetcher {
    pub inner: FixtureFetcher,
    pub slow_url: String,
    pub delay: Duration,
    pub slow_done: Arc<AtomicBool>,
}

#[async_trait]
impl PageFetcher for SlowFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let res = self.inner.fetch(url).await;
        if url == self.slow_url {
            tokio::time::sleep(self.delay).await;
            self.slow_done.store(true, Ordering::SeqCst);
        }
        res
    }
}

/// Record store that notes whether each write started after `gate` was set,
/// and fails writes whose fingerprint contains `fail_on`.
pub struct GatedStore {
    pub gate: Arc<AtomicBool>,
    pub early_writes: AtomicUsize,
    pub writes: Mutex<Vec<Listing>>,
    pub fail_on: Option<String>,
}

impl GatedStore {
    pub fn new(gate: Arc<AtomicBool>) -> Self {
        Self {
            gate,
            early_writes: AtomicUsize::new(0),
            writes: Mutex::new(vec![]),
            fail_on: None,
        }
    }
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn insert(&self, listing: &Listing) -> Result<()> {
        if !self.gate.load(Ordering::SeqCst) {
            self.early_writes.fetch_add(1, Ordering::SeqCst);
        }
        if let Some(needle) = &self.fail_on {
            if listing.fingerprint.contains(needle.as_str()) {
                return Err(anyhow!("write rejected"));
            }
        }
        self.writes.lock().unwrap().push(listing.clone());
        Ok(())
    }
}
