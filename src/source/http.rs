use async_trait::async_trait;
use std::time::Duration;

use crate::error::LoadError;

/// Boundary for the one network call the pipeline makes.
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>, LoadError>;
}

/// reqwest-backed client with a bounded per-request timeout.
pub struct ReqwestHttp {
    timeout: Duration,
}

impl ReqwestHttp {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    async fn get(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let client = reqwest::Client::new();
        let resp = client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| unreachable_error(url, &e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LoadError::Unreachable {
                url: url.to_string(),
                detail: format!("HTTP {}", status.as_u16()),
            });
        }
        let bytes = resp.bytes().await.map_err(|e| unreachable_error(url, &e))?;
        Ok(bytes.to_vec())
    }
}

fn unreachable_error(url: &str, e: &reqwest::Error) -> LoadError {
    let detail = if e.is_timeout() {
        "request timed out".to_string()
    } else {
        e.to_string()
    };
    LoadError::Unreachable { url: url.to_string(), detail }
}
