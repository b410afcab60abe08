//! Source Loader: obtains raw tabular bytes from an ordered list of origins
//! and decodes them into rows.
//!
//! The original scripts differed only in which fallback they hard-coded
//! (URL, uploaded file, or embedded sample); here the fallbacks are one
//! strategy list tried in sequence until a source yields a decodable table.

pub mod cache;
pub mod decode;
pub mod http;

pub use decode::RawTable;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::constants;
use crate::error::LoadError;
use cache::{CacheEntry, CacheStore, Clock, InMemoryCache, SystemClock};
use http::{HttpClientPort, ReqwestHttp};

/// Where raw bytes come from.
#[derive(Debug, Clone)]
pub enum SourceKind {
    RemoteUrl(String),
    /// An already-read payload, e.g. a file the user handed in.
    UploadedBytes { name: String, bytes: Vec<u8> },
    /// The small dataset excerpt bundled into the binary.
    Sample,
}

impl SourceKind {
    fn cache_key(&self) -> Option<String> {
        match self {
            SourceKind::RemoteUrl(url) => Some(format!("url:{url}")),
            // Local payloads are already in memory; caching buys nothing
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SourceKind::RemoteUrl(url) => format!("url {url}"),
            SourceKind::UploadedBytes { name, .. } => format!("upload {name}"),
            SourceKind::Sample => "bundled sample".to_string(),
        }
    }
}

pub struct SourceLoader {
    http: Arc<dyn HttpClientPort>,
    cache: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    cache_ttl: chrono::Duration,
}

impl SourceLoader {
    pub fn new(
        http: Arc<dyn HttpClientPort>,
        cache: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        cache_ttl: chrono::Duration,
    ) -> Self {
        Self { http, cache, clock, cache_ttl }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(ReqwestHttp::new(Duration::from_secs(config.timeout_seconds))),
            Arc::new(InMemoryCache::new()),
            Arc::new(SystemClock),
            chrono::Duration::seconds(config.cache_ttl_seconds),
        )
    }

    /// Tries each source in order and returns the first decodable table.
    ///
    /// Per-source failures are demoted to warnings; only when every source
    /// fails does the loader return an error, carrying all the details.
    pub async fn load(&self, sources: &[SourceKind]) -> Result<RawTable, LoadError> {
        let mut failures = Vec::new();
        for source in sources {
            match self.load_one(source).await {
                Ok(table) => {
                    info!(
                        source = %source.describe(),
                        encoding = table.encoding,
                        rows = table.rows.len(),
                        "loaded raw table"
                    );
                    return Ok(table);
                }
                Err(e) => {
                    warn!(source = %source.describe(), "source failed: {}", e);
                    failures.push(format!("{}: {}", source.describe(), e));
                }
            }
        }
        Err(LoadError::AllSourcesFailed(failures.join("; ")))
    }

    async fn load_one(&self, source: &SourceKind) -> Result<RawTable, LoadError> {
        let bytes = self.fetch_bytes(source).await?;
        decode::decode_table(&bytes)
    }

    async fn fetch_bytes(&self, source: &SourceKind) -> Result<Vec<u8>, LoadError> {
        match source {
            SourceKind::RemoteUrl(url) => {
                let key = source.cache_key().unwrap_or_default();
                if let Some(entry) = self.cache.get(&key) {
                    if entry.expires_at > self.clock.now() {
                        info!(url = %url, "serving cached payload");
                        return Ok(entry.bytes);
                    }
                }
                let bytes = self.http.get(url).await?;
                // Published only once the body has arrived in full
                self.cache.put(
                    &key,
                    CacheEntry {
                        bytes: bytes.clone(),
                        expires_at: self.clock.now() + self.cache_ttl,
                    },
                );
                Ok(bytes)
            }
            SourceKind::UploadedBytes { bytes, .. } => Ok(bytes.clone()),
            SourceKind::Sample => Ok(constants::SAMPLE_CSV.as_bytes().to_vec()),
        }
    }
}
