// src/store/storage.rs
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;

use super::{DocumentMirror, GcpHandle};

const UPLOAD_BASE: &str = "https://storage.googleapis.com/upload/storage/v1";
const PUBLIC_BASE: &str = "https://storage.googleapis.com";

/// Replace anything outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_key(key: &str) -> String {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_\-]").unwrap());
    re.replace_all(key, "_").to_string()
}

/// Leaflets are PDFs; give extension-less names a `.pdf` suffix.
pub fn ensure_pdf_extension(name: &str) -> String {
    if Path::new(name).extension().is_none() {
        format!("{name}.pdf")
    } else {
        name.to_string()
    }
}

/// Object name a key is stored under. Distinct keys may collide after
/// sanitizing; the later upload wins.
pub fn object_name(key: &str) -> String {
    ensure_pdf_extension(&sanitize_key(key))
}

/// Mirrors leaflets into a Cloud Storage bucket with public-read ACL.
#[derive(Clone)]
pub struct CloudStorageMirror {
    handle: Arc<GcpHandle>,
}

impl CloudStorageMirror {
    pub fn new(handle: Arc<GcpHandle>) -> Self {
        Self { handle }
    }

    pub fn public_url(&self, object: &str) -> String {
        format!("{PUBLIC_BASE}/{}/{object}", self.handle.bucket)
    }
}

#[async_trait]
impl DocumentMirror for CloudStorageMirror {
    async fn mirror(&self, source_link: &str, key: &str) -> Result<String> {
        let object = object_name(key);

        let resp = self
            .handle
            .http
            .get(source_link)
            .send()
            .await
            .with_context(|| format!("download {source_link}"))?
            .error_for_status()
            .with_context(|| format!("download {source_link} non-2xx"))?;
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/pdf")
            .to_string();
        let bytes = resp.bytes().await.context("download body")?;

        let url = format!("{UPLOAD_BASE}/b/{}/o", self.handle.bucket);
        self.handle
            .http
            .post(&url)
            .bearer_auth(self.handle.bearer())
            .query(&[
                ("uploadType", "media"),
                ("name", object.as_str()),
                ("predefinedAcl", "publicRead"),
            ])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .context("storage upload")?
            .error_for_status()
            .with_context(|| format!("storage upload non-2xx for {object}"))?;

        tracing::debug!(object = %object, "mirrored document");
        Ok(self.public_url(&object))
    }
}
