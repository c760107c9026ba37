// src/metrics.rs
//! Harvest metric names. Recording goes through the `metrics` facade; the
//! binary installs no exporter, so these are no-ops unless a recorder is set.

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

pub const CANDIDATES: &str = "harvest_candidates_total";
pub const SKIPPED: &str = "harvest_skipped_total";
pub const REPEATED: &str = "harvest_repeated_total";
pub const BATCH_REPEATS: &str = "harvest_batch_repeats_total";
pub const KNOWN: &str = "harvest_known_total";
pub const EMITTED: &str = "harvest_emitted_total";
pub const ORACLE_ERRORS: &str = "harvest_oracle_errors_total";
pub const MIRROR_ERRORS: &str = "harvest_mirror_errors_total";
pub const FETCH_ERRORS: &str = "harvest_fetch_errors_total";
pub const PERSISTED: &str = "harvest_persisted_total";
pub const PERSIST_ERRORS: &str = "harvest_persist_errors_total";
pub const FETCH_MS: &str = "harvest_fetch_ms";
pub const LAST_RUN_TS: &str = "harvest_last_run_ts";

/// One-time metrics registration (so series carry descriptions once a recorder exists).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(CANDIDATES, "Candidate blocks surfaced by page extraction.");
        describe_counter!(SKIPPED, "Candidates missing a required field.");
        describe_counter!(REPEATED, "Candidates repeating a fingerprint already seen on the same page.");
        describe_counter!(
            BATCH_REPEATS,
            "Listings dropped from the batch because another source emitted the same fingerprint."
        );
        describe_counter!(KNOWN, "Candidates already recorded in the store.");
        describe_counter!(EMITTED, "Listings sent to the aggregator.");
        describe_counter!(
            ORACLE_ERRORS,
            "Dedup lookups that failed (candidate kept, fail-open)."
        );
        describe_counter!(MIRROR_ERRORS, "Document mirror failures.");
        describe_counter!(FETCH_ERRORS, "Source page fetch/parse errors.");
        describe_counter!(PERSISTED, "Listings written to the record store.");
        describe_counter!(PERSIST_ERRORS, "Record store write failures.");
        describe_histogram!(FETCH_MS, "Source page fetch time in milliseconds.");
        describe_gauge!(LAST_RUN_TS, "Unix ts when the harvest last finished.");
    });
}
