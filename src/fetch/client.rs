// src/fetch/client.rs
use async_trait::async_trait;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::error::TransportError;

/// Status and body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The only network surface the resolver and fetcher need.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;

    /// Existence probe; redirects are followed and only the final status is returned.
    async fn head(&self, url: &str, timeout: Duration) -> Result<u16, TransportError>;
}

/// [`HttpClient`] backed by a pooled `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestClient(reqwest::Client);

impl ReqwestClient {
    pub fn new(cfg: &HttpConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .user_agent(cfg.user_agent.clone())
            .build()?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let resp = self.0.get(url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        Ok(HttpResponse { status, body })
    }

    async fn head(&self, url: &str, timeout: Duration) -> Result<u16, TransportError> {
        let resp = self.0.head(url).timeout(timeout).send().await?;
        Ok(resp.status().as_u16())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    /// Canned responses keyed by absolute URL. Unknown URLs fail at the transport level.
    #[derive(Default)]
    pub struct FakeClient {
        gets: Mutex<HashMap<String, HttpResponse>>,
        heads: Mutex<HashMap<String, u16>>,
        pub calls: AtomicUsize,
    }

    impl FakeClient {
        pub fn with_get(self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
            self.gets.lock().unwrap().insert(
                url.to_string(),
                HttpResponse {
                    status,
                    body: body.into(),
                },
            );
            self
        }

        pub fn with_head(self, url: &str, status: u16) -> Self {
            self.heads.lock().unwrap().insert(url.to_string(), status);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpClient for FakeClient {
        async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gets
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| TransportError(format!("connection refused: {url}")))
        }

        async fn head(&self, url: &str, _timeout: Duration) -> Result<u16, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.heads
                .lock()
                .unwrap()
                .get(url)
                .copied()
                .ok_or_else(|| TransportError(format!("timed out: {url}")))
        }
    }
}
