use super::client::{build_client, ClientKind};
use super::headers::to_header_map;
use super::FetchStrategy;
use crate::error::{ProbeError, Result};
use crate::types::{FetchRequest, RawResponse};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use tracing::debug;

/// One GET through a freshly built reqwest client.
///
/// Covers every async transport that only differs in client setup.
pub struct HttpStrategy {
    name: &'static str,
    kind: ClientKind,
}

impl HttpStrategy {
    pub(crate) fn new(name: &'static str, kind: ClientKind) -> Self {
        Self { name, kind }
    }
}

#[async_trait]
impl FetchStrategy for HttpStrategy {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<RawResponse> {
        let client = build_client(self.kind)?;
        let headers = to_header_map(request.headers())?;
        debug!(strategy = self.name, headers = headers.len(), "sending request");
        send(&client, request.url(), headers).await
    }
}

/// Keeps one connection pool alive for the lifetime of the strategy.
pub struct PooledStrategy {
    client: Client,
}

impl PooledStrategy {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_client(ClientKind::Pooled)?,
        })
    }
}

#[async_trait]
impl FetchStrategy for PooledStrategy {
    fn name(&self) -> &str {
        "pooled"
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<RawResponse> {
        let headers = to_header_map(request.headers())?;
        send(&self.client, request.url(), headers).await
    }
}

/// Synchronous client, run on the blocking pool so the runtime keeps going.
pub struct BlockingStrategy;

#[async_trait]
impl FetchStrategy for BlockingStrategy {
    fn name(&self) -> &str {
        "blocking"
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<RawResponse> {
        let url = request.url().to_string();
        let headers = to_header_map(request.headers())?;

        tokio::task::spawn_blocking(move || -> Result<RawResponse> {
            let client = reqwest::blocking::Client::builder()
                .build()
                .map_err(|e| ProbeError::transport(format!("failed to build client: {e}")))?;
            let resp = client
                .get(&url)
                .headers(headers)
                .send()
                .map_err(|e| ProbeError::transport(format!("request failed: {e}")))?;
            let status = resp.status().as_u16();
            let body = resp
                .bytes()
                .map_err(|e| ProbeError::transport(format!("failed to read response: {e}")))?;
            Ok(RawResponse::new(status, body.to_vec()))
        })
        .await
        .map_err(|e| ProbeError::transport(format!("blocking worker failed: {e}")))?
    }
}

async fn send(client: &Client, url: &str, headers: HeaderMap) -> Result<RawResponse> {
    let (status, _, body) = send_raw(client, url, headers).await?;
    Ok(RawResponse::new(status, body))
}

/// One GET, keeping the response headers for callers that inspect them.
pub(super) async fn send_raw(
    client: &Client,
    url: &str,
    headers: HeaderMap,
) -> Result<(u16, HeaderMap, Vec<u8>)> {
    let response = client
        .get(url)
        .headers(headers)
        .send()
        .await
        .map_err(|e| ProbeError::transport(format!("request failed: {e}")))?;

    let status = response.status().as_u16();
    let response_headers = response.headers().clone();
    let body = response
        .bytes()
        .await
        .map_err(|e| ProbeError::transport(format!("failed to read response: {e}")))?;

    Ok((status, response_headers, body.to_vec()))
}
