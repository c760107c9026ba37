// src/harvest/types.rs
use serde::{Deserialize, Serialize};

/// A single promotional offer found on a source page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listing {
    pub active: bool,
    pub title: String,
    pub category: String,
    pub source_url: String,
    pub document_url: String, // only set when a mirror step succeeded
    pub fingerprint: String,  // sole dedup key
    pub notified: bool,
    pub created_at: i64, // unix seconds
}

impl Listing {
    /// Fresh listing from an accepted candidate: active, not yet notified.
    pub fn from_candidate(candidate: Candidate, document_url: String, created_at: i64) -> Self {
        Self {
            active: true,
            title: candidate.title,
            category: candidate.category,
            source_url: candidate.source_url,
            document_url,
            fingerprint: candidate.fingerprint,
            notified: false,
            created_at,
        }
    }
}

/// Trimmed field tuple surfaced by page extraction. Empty string = field absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    pub title: String,
    pub dates: String,
    pub link: String,
    pub preview: String,
}

/// A candidate that passed the required-field check and carries its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    pub category: String,
    pub source_url: String,
    /// Link to a leaflet to mirror, for sources that publish documents.
    pub document_link: Option<String>,
    pub fingerprint: String,
}

/// Immutable per-source configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceRule {
    pub name: String,
    pub url: String,
    pub category: String,
    pub kind: SourceKind,
}

/// Closed set of page layouts the harvester understands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceKind {
    /// Aggregator site with one tab per category.
    SpecialsNamibia { tab_selector: String },
    PickNPay,
    Shoprite,
    SparMaerua,
    Checkers,
    OkFoods { base_url: String },
}

// Fixed titles. Trailing spaces are part of the stored fingerprints, keep them.
pub const SHOPRITE_TITLE: &str = "Shoprite Specials ";
pub const SPAR_MAERUA_TITLE: &str = "Spar Marua ";
pub const CHECKERS_TITLE: &str = "Checkers ";
pub const OK_FOODS_TITLE: &str = "OK Foods";

impl SourceKind {
    /// Whether listings from this layout link to a leaflet worth mirroring.
    pub fn mirrors_document(&self) -> bool {
        matches!(self, SourceKind::PickNPay | SourceKind::OkFoods { .. })
    }

    /// Check required fields and compose the fingerprint.
    ///
    /// Returns `None` when a required field is empty. The composition per layout
    /// must never change: it is the key of every record already in the store.
    pub fn candidate(&self, raw: RawFields, category: &str) -> Option<Candidate> {
        let RawFields {
            title,
            dates,
            link,
            preview,
        } = raw;

        let (title, fingerprint, document_link) = match self {
            SourceKind::SpecialsNamibia { .. } => {
                if title.is_empty() || dates.is_empty() {
                    return None;
                }
                let fp = format!("{title}{dates}");
                (title, fp, None)
            }
            SourceKind::PickNPay => {
                if title.is_empty() || dates.is_empty() {
                    return None;
                }
                let fp = format!("{title} {dates}");
                (title, fp, Some(link.clone()))
            }
            SourceKind::Shoprite => {
                if dates.is_empty() {
                    return None;
                }
                let fp = format!("{SHOPRITE_TITLE} {dates} {preview}");
                (SHOPRITE_TITLE.to_string(), fp, None)
            }
            SourceKind::SparMaerua => {
                if dates.is_empty() {
                    return None;
                }
                let fp = format!("{SPAR_MAERUA_TITLE} {dates} {link}");
                (SPAR_MAERUA_TITLE.to_string(), fp, None)
            }
            SourceKind::Checkers => {
                if link.is_empty() {
                    return None;
                }
                let fp = format!("{CHECKERS_TITLE}{link}");
                (CHECKERS_TITLE.to_string(), fp, None)
            }
            SourceKind::OkFoods { .. } => {
                // extractor already joined base_url + relative path into `link`
                if link.is_empty() {
                    return None;
                }
                let fp = format!("{OK_FOODS_TITLE}{link}");
                (OK_FOODS_TITLE.to_string(), fp, Some(link.clone()))
            }
        };

        Some(Candidate {
            title,
            category: category.to_string(),
            source_url: link,
            document_link: document_link.filter(|l| !l.is_empty()),
            fingerprint,
        })
    }
}
