// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod harvest;
pub mod metrics;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::harvest::config::{load_config_default, HarvestConfig};
pub use crate::harvest::orchestrator::{Backends, HarvestPhase, HarvestReport, Orchestrator};
pub use crate::harvest::types::{Listing, SourceKind, SourceRule};
