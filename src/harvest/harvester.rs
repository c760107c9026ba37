// src/harvest/harvester.rs
use std::collections::HashSet;

use metrics::{counter, histogram};
use tokio::sync::mpsc;

use crate::harvest::fetch::PageFetcher;
use crate::harvest::types::{Candidate, Listing, SourceRule};
use crate::metrics as m;
use crate::store::{DedupOracle, DocumentMirror};

/// What one source contributed to the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestOutcome {
    pub source: String,
    pub fetch_failed: bool,
    pub candidates: usize,
    pub skipped: usize,
    pub repeated: usize,
    pub known: usize,
    pub emitted: usize,
    pub oracle_errors: usize,
    pub mirror_errors: usize,
}

impl HarvestOutcome {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ..Self::default()
        }
    }
}

/// Harvest one source into `sink`.
///
/// Never fails: a fetch/parse error yields an outcome with `fetch_failed` and
/// zero listings. The caller observes completion when this future resolves;
/// `sink` is dropped on every return path. With no `mirror`, document sources
/// emit listings with an empty `document_url`.
pub async fn harvest_source(
    rule: &SourceRule,
    fetcher: &dyn PageFetcher,
    oracle: &dyn DedupOracle,
    mirror: Option<&dyn DocumentMirror>,
    sink: mpsc::Sender<Listing>,
) -> HarvestOutcome {
    let mut out = HarvestOutcome::new(&rule.name);
    let source = rule.name.clone();

    let t0 = std::time::Instant::now();
    let page = match fetcher.fetch(&rule.url).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = ?e, source = %source, url = %rule.url, "source fetch failed");
            counter!(m::FETCH_ERRORS, "source" => source).increment(1);
            out.fetch_failed = true;
            return out;
        }
    };
    histogram!(m::FETCH_MS, "source" => source.clone())
        .record(t0.elapsed().as_secs_f64() * 1_000.0);

    let raws = match rule.kind.extract(&page) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = ?e, source = %source, "source extraction failed");
            counter!(m::FETCH_ERRORS, "source" => source).increment(1);
            out.fetch_failed = true;
            return out;
        }
    };
    out.candidates = raws.len();
    counter!(m::CANDIDATES, "source" => source.clone()).increment(raws.len() as u64);

    // a page can repeat a block (nested containers); emit each fingerprint once
    let mut seen: HashSet<String> = HashSet::new();

    for raw in raws {
        let Some(candidate) = rule.kind.candidate(raw, &rule.category) else {
            out.skipped += 1;
            continue;
        };
        if !seen.insert(candidate.fingerprint.clone()) {
            out.repeated += 1;
            continue;
        }

        if is_known(oracle, &candidate, &source, &mut out).await {
            out.known += 1;
            continue;
        }

        let document_url = match (candidate.document_link.as_deref(), mirror) {
            (Some(link), Some(mirror)) => match mirror.mirror(link, &candidate.fingerprint).await {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(
                        error = ?e,
                        source = %source,
                        fingerprint = %candidate.fingerprint,
                        "document mirror failed; keeping listing without document"
                    );
                    counter!(m::MIRROR_ERRORS, "source" => source.clone()).increment(1);
                    out.mirror_errors += 1;
                    String::new()
                }
            },
            _ => String::new(),
        };

        let listing = Listing::from_candidate(candidate, document_url, chrono::Utc::now().timestamp());
        if sink.send(listing).await.is_err() {
            // aggregator gone; nothing left to deliver to
            tracing::error!(source = %source, "aggregator channel closed early");
            break;
        }
        out.emitted += 1;
    }

    counter!(m::SKIPPED, "source" => source.clone()).increment(out.skipped as u64);
    counter!(m::REPEATED, "source" => source.clone()).increment(out.repeated as u64);
    counter!(m::KNOWN, "source" => source.clone()).increment(out.known as u64);
    counter!(m::EMITTED, "source" => source.clone()).increment(out.emitted as u64);
    tracing::info!(
        source = %source,
        candidates = out.candidates,
        emitted = out.emitted,
        known = out.known,
        skipped = out.skipped,
        repeated = out.repeated,
        "finished scraping"
    );
    out
}

/// Dedup check. A lookup error counts as "not found": a transient store
/// failure must not drop a real listing, at the price of a possible duplicate.
async fn is_known(
    oracle: &dyn DedupOracle,
    candidate: &Candidate,
    source: &str,
    out: &mut HarvestOutcome,
) -> bool {
    match oracle.find_by_fingerprint(&candidate.fingerprint).await {
        Ok(Some(existing)) => existing.title == candidate.title,
        Ok(None) => false,
        Err(e) => {
            tracing::warn!(
                error = ?e,
                source = %source,
                fingerprint = %candidate.fingerprint,
                "dedup lookup failed; treating as new"
            );
            counter!(m::ORACLE_ERRORS, "source" => source.to_string()).increment(1);
            out.oracle_errors += 1;
            false
        }
    }
}
