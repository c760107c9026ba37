// src/harvest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::harvest::types::{SourceKind, SourceRule};

pub const ENV_CONFIG_PATH: &str = "HARVEST_CONFIG_PATH";
pub const ENV_ACCESS_TOKEN: &str = "HARVEST_ACCESS_TOKEN";

const DEFAULT_TOML_PATH: &str = "config/harvest.toml";
const DEFAULT_JSON_PATH: &str = "config/harvest.json";

fn default_channel_capacity() -> usize {
    100
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

/// Connection settings for the Firestore collection and leaflet bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    pub project_id: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    pub bucket: String,
    /// "ENV" means: read from HARVEST_ACCESS_TOKEN
    #[serde(default)]
    pub access_token: String,
}

fn default_collection() -> String {
    "specials".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HarvestConfig {
    /// Capacity of the harvester → aggregator channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub sources: Vec<SourceRule>,
    #[serde(default)]
    pub store: Option<StoreConfig>,
}

impl HarvestConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Built-in sources, used when no config file is found.
    pub fn default_seed() -> Self {
        let groceries = "Groceries".to_string();
        let mut sources: Vec<SourceRule> = [
            ("Groceries", "#nav-groceries"),
            ("Clothing", "#nav-clothing"),
            ("Hardware", "#nav-hardware"),
            ("Restaurants", "#nav-restaurants"),
        ]
        .into_iter()
        .map(|(category, tab)| SourceRule {
            name: format!("Specials Namibia ({category})"),
            url: "https://specials.com.na/".to_string(),
            category: category.to_string(),
            kind: SourceKind::SpecialsNamibia {
                tab_selector: tab.to_string(),
            },
        })
        .collect();

        for (name, url, kind) in [
            ("Pick n Pay", "https://pnp.na/specials-2/", SourceKind::PickNPay),
            (
                "Shoprite",
                "https://www.shoprite.com.na/specials.html?storeId=42&provinceId=175",
                SourceKind::Shoprite,
            ),
            (
                "Spar Marua",
                "https://www.spar.co.za/Home/Store-View/SUPERSPAR-Maerua-Namibia",
                SourceKind::SparMaerua,
            ),
            (
                "Checkers",
                "https://www.checkers.com.na/promotions.html",
                SourceKind::Checkers,
            ),
            (
                "OK Foods",
                "https://www.okfoods.co.za/content/okfoods/na/en_NA/specials.html",
                SourceKind::OkFoods {
                    base_url: "https://www.okfoods.co.za".to_string(),
                },
            ),
        ] {
            sources.push(SourceRule {
                name: name.to_string(),
                url: url.to_string(),
                category: groceries.clone(),
                kind,
            });
        }

        Self {
            channel_capacity: default_channel_capacity(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            sources,
            store: None,
        }
    }

    /// Drop unusable sources, clamp capacity, resolve the "ENV" token.
    ///
    /// A store whose token cannot be resolved is removed: the run becomes a dry-run.
    fn sanitize(mut self) -> Self {
        self.channel_capacity = self.channel_capacity.max(1);
        self.sources.retain(|s| {
            let ok = !s.name.trim().is_empty() && !s.url.trim().is_empty();
            if !ok {
                tracing::warn!(source = %s.name, url = %s.url, "dropping source without name/url");
            }
            ok
        });

        if let Some(store) = self.store.as_mut() {
            if store.access_token.trim().eq_ignore_ascii_case("env") {
                store.access_token = std::env::var(ENV_ACCESS_TOKEN).unwrap_or_default();
            }
        }
        if self
            .store
            .as_ref()
            .is_some_and(|s| s.access_token.trim().is_empty())
        {
            tracing::warn!("store configured without access token; running dry");
            self.store = None;
        }
        self
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<HarvestConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading harvest config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
}

/// Load config using env var + fallbacks:
/// 1) $HARVEST_CONFIG_PATH
/// 2) config/harvest.toml
/// 3) config/harvest.json
/// 4) built-in seed
pub fn load_config_default() -> Result<HarvestConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_JSON_PATH);
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Ok(HarvestConfig::default_seed().sanitize())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<HarvestConfig> {
    let cfg: HarvestConfig = match hint_ext {
        "json" => serde_json::from_str(s).context("parsing harvest config json")?,
        "toml" => toml::from_str(s).context("parsing harvest config toml")?,
        _ => match toml::from_str(s) {
            Ok(v) => v,
            Err(_) => serde_json::from_str(s)
                .map_err(|_| anyhow!("unsupported harvest config format"))?,
        },
    };
    Ok(cfg.sanitize())
}
