use crate::error::{ProbeError, Result};
use reqwest::{redirect, Client};
use std::time::Duration;

const REDIRECT_LIMIT: usize = 10;
const POOL_IDLE_TIMEOUT_SEC: u64 = 90;
const POOL_MAX_IDLE_PER_HOST: usize = 32;
const ASYNC_TIMEOUT_SEC: u64 = 60;

/// How a strategy's reqwest client is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClientKind {
    /// reqwest defaults, nothing else.
    Plain,
    /// Cookie jar on, compressed bodies accepted.
    Session,
    /// Session plus bounded redirects, for challenge pages that bounce around.
    Challenge,
    /// HTTP/1.1 only.
    Http1,
    /// Long-lived idle pool, meant to be built once and reused.
    Pooled,
    /// HTTP/1.1 with a cookie jar, like an old scripted browser.
    Legacy,
    /// Fixed overall request timeout.
    Async,
}

/// Build a reqwest client for the given kind.
pub(crate) fn build_client(kind: ClientKind) -> Result<Client> {
    let builder = Client::builder();

    let builder = match kind {
        ClientKind::Plain => builder,
        ClientKind::Session => builder.cookie_store(true).gzip(true).deflate(true),
        ClientKind::Challenge => builder
            .cookie_store(true)
            .redirect(redirect::Policy::limited(REDIRECT_LIMIT))
            .gzip(true)
            .brotli(true)
            .deflate(true),
        ClientKind::Http1 => builder.http1_only(),
        ClientKind::Pooled => builder
            .pool_idle_timeout(Duration::from_secs(POOL_IDLE_TIMEOUT_SEC))
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST),
        ClientKind::Legacy => builder
            .http1_only()
            .cookie_store(true)
            .redirect(redirect::Policy::limited(REDIRECT_LIMIT)),
        ClientKind::Async => builder.timeout(Duration::from_secs(ASYNC_TIMEOUT_SEC)),
    };

    builder
        .build()
        .map_err(|e| ProbeError::transport(format!("failed to build client: {e}")))
}
