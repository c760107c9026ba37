//! Specials harvester: binary entrypoint.
//! Runs one harvest batch, prints the collected listings, and exits.

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use specials_harvester::{harvest, load_config_default};

/// Compact logs by default; `HARVEST_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("specials_harvester=info,warn"));

    let json = std::env::var("HARVEST_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = load_config_default()?;
    tracing::info!(
        sources = cfg.sources.len(),
        store = cfg.store.is_some(),
        "harvest config loaded"
    );

    let report = harvest::run_once(&cfg).await?;

    println!("Collected Items:");
    println!("{}", serde_json::to_string_pretty(&report.batch)?);

    tracing::info!(
        started = report.harvesters_started,
        completed = report.harvesters_completed,
        fetch_failures = report.fetch_failures,
        listings = report.batch.len(),
        persisted = report.persisted,
        persist_failures = report.persist_failures,
        dry_run = report.persistence_skipped,
        "harvest done"
    );
    Ok(())
}
