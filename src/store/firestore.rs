// src/store/firestore.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{DedupOracle, GcpHandle, RecordStore};
use crate::harvest::types::Listing;

const FIRESTORE_BASE: &str = "https://firestore.googleapis.com/v1";

/// Field the fingerprint is stored under. Document field names predate this
/// crate and are shared with the notification process, so they stay as-is.
pub const FINGERPRINT_FIELD: &str = "ScrapingID";

/// Firestore-backed dedup oracle and record store (REST, `(default)` database).
#[derive(Clone)]
pub struct FirestoreStore {
    handle: Arc<GcpHandle>,
}

impl FirestoreStore {
    pub fn new(handle: Arc<GcpHandle>) -> Self {
        Self { handle }
    }

    fn documents_url(&self) -> String {
        format!(
            "{FIRESTORE_BASE}/projects/{}/databases/(default)/documents",
            self.handle.project_id
        )
    }
}

/// `structuredQuery` for a single document whose `field` equals `value`.
pub(crate) fn query_by_field(collection: &str, field: &str, value: &str) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": "EQUAL",
                    "value": { "stringValue": value }
                }
            },
            "limit": 1
        }
    })
}

pub(crate) fn encode_listing(l: &Listing) -> Value {
    json!({
        "fields": {
            "IsActive": { "booleanValue": l.active },
            "DownloadLink": { "stringValue": l.document_url },
            "WebsiteLink": { "stringValue": l.source_url },
            "Title": { "stringValue": l.title },
            "Category": { "stringValue": l.category },
            "BeenSent": { "booleanValue": l.notified },
            "ScrapingID": { "stringValue": l.fingerprint },
            // int64 travels as a decimal string
            "DateAdded": { "integerValue": l.created_at.to_string() }
        }
    })
}

fn str_field(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(|v| v.get("stringValue"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn bool_field(fields: &Map<String, Value>, key: &str) -> bool {
    fields
        .get(key)
        .and_then(|v| v.get("booleanValue"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn int_field(fields: &Map<String, Value>, key: &str) -> i64 {
    match fields.get(key).and_then(|v| v.get("integerValue")) {
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        Some(v) => v.as_i64().unwrap_or(0),
        None => 0,
    }
}

/// Decode a `runQuery` response. Rows without a `document` (the read-time-only
/// row Firestore sends for an empty result) are ignored.
pub(crate) fn decode_first_document(rows: &Value) -> Option<Listing> {
    let fields = rows
        .as_array()?
        .iter()
        .find_map(|row| row.get("document")?.get("fields")?.as_object())?;

    Some(Listing {
        active: bool_field(fields, "IsActive"),
        title: str_field(fields, "Title"),
        category: str_field(fields, "Category"),
        source_url: str_field(fields, "WebsiteLink"),
        document_url: str_field(fields, "DownloadLink"),
        fingerprint: str_field(fields, FINGERPRINT_FIELD),
        notified: bool_field(fields, "BeenSent"),
        created_at: int_field(fields, "DateAdded"),
    })
}

#[async_trait]
impl DedupOracle for FirestoreStore {
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<Listing>> {
        let url = format!("{}:runQuery", self.documents_url());
        let body = query_by_field(&self.handle.collection, FINGERPRINT_FIELD, fingerprint);

        let rows: Value = self
            .handle
            .http
            .post(&url)
            .bearer_auth(self.handle.bearer())
            .json(&body)
            .send()
            .await
            .context("firestore runQuery")?
            .error_for_status()
            .context("firestore runQuery non-2xx")?
            .json()
            .await
            .context("firestore runQuery body")?;

        Ok(decode_first_document(&rows))
    }
}

#[async_trait]
impl RecordStore for FirestoreStore {
    async fn insert(&self, listing: &Listing) -> Result<()> {
        let url = format!("{}/{}", self.documents_url(), self.handle.collection);
        self.handle
            .http
            .post(&url)
            .bearer_auth(self.handle.bearer())
            .json(&encode_listing(listing))
            .send()
            .await
            .context("firestore create")?
            .error_for_status()
            .with_context(|| format!("firestore create non-2xx for {}", listing.fingerprint))?;
        Ok(())
    }
}
