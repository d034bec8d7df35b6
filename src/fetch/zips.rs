// src/fetch/zips.rs
use std::io::{Cursor, Read};
use tracing::{info, instrument, warn};
use zip::ZipArchive;

use super::client::HttpClient;
use super::urls::UrlEmt;
use crate::error::FetchError;

impl<C: HttpClient> UrlEmt<C> {
    /// Download the archive for `month`/`year` and return its CSV payload as text.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_csv(&self, month: u32, year: u32) -> Result<String, FetchError> {
        let path = self.get_url(month, year)?;
        let url = self.config().emt.absolute(path);

        let resp = self
            .client()
            .get(&url)
            .await
            .map_err(|e| FetchError::DownloadFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        if !resp.is_success() {
            return Err(FetchError::DownloadFailed {
                url,
                reason: format!("status code {}", resp.status),
            });
        }
        info!(%url, bytes = resp.body.len(), "downloaded archive");

        extract_csv(&resp.body, path)
    }
}

/// Open `bytes` as a ZIP and decode the first `.csv` entry in listing order.
pub fn extract_csv(bytes: &[u8], archive_name: &str) -> Result<String, FetchError> {
    let corrupt = |source: zip::result::ZipError| FetchError::CorruptArchive {
        archive: archive_name.to_string(),
        source,
    };

    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(corrupt)?;

    // Scan names only; entries other than the chosen one are never opened.
    let chosen = (0..archive.len()).find(|&i| {
        archive
            .name_for_index(i)
            .is_some_and(|name| name.to_lowercase().ends_with(".csv"))
    });
    let Some(idx) = chosen else {
        return Err(FetchError::PayloadMissing {
            archive: archive_name.to_string(),
        });
    };

    let mut entry = archive.by_index(idx).map_err(corrupt)?;
    let name = entry.name().to_string();
    let mut buf = Vec::new();
    entry
        .read_to_end(&mut buf)
        .map_err(|e| corrupt(e.into()))?;

    let text = match String::from_utf8(buf) {
        Ok(t) => t,
        Err(e) => {
            warn!(entry = %name, "payload is not valid UTF-8; replacing invalid bytes");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    if text.is_empty() {
        return Err(FetchError::EmptyPayload {
            archive: archive_name.to_string(),
        });
    }

    info!(entry = %name, chars = text.len(), "extracted CSV payload");
    Ok(text)
}
