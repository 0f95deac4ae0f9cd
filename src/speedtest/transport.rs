use super::SampleError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use tracing::{trace, warn};

pub type BodyStream = BoxStream<'static, Result<Bytes, SampleError>>;

// No timeouts here; phases bound themselves with deadlines.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn probe(&self, url: &str) -> Result<(), SampleError>;

    async fn fetch(&self, url: &str) -> Result<BodyStream, SampleError>;

    async fn post(&self, url: &str, body: Bytes) -> Result<(), SampleError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, SampleError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("gaugespeed/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SampleError::Unexpected(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn probe(&self, url: &str) -> Result<(), SampleError> {
        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?;
        trace!(status = %response.status(), "probe answered");
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<BodyStream, SampleError> {
        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;
        // A completed response is drained and counted whatever its status.
        if !response.status().is_success() {
            warn!(status = %response.status(), "download answered with error status");
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(SampleError::from))
            .boxed())
    }

    async fn post(&self, url: &str, body: Bytes) -> Result<(), SampleError> {
        let response = self.client.post(url).body(body).send().await?;
        if !response.status().is_success() {
            warn!(status = %response.status(), "upload answered with error status");
        }
        Ok(())
    }
}

#[cfg(test)]
pub use fake::FakeTransport;
