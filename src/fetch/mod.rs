mod browser;
mod challenge;
mod client;
mod headers;
mod impersonate;
mod profile;
mod strategies;

#[cfg(test)]
mod tests;

pub use browser::HeadlessChrome;
pub use challenge::ChallengeStrategy;
pub use impersonate::ImpersonateStrategy;
pub use profile::BrowserProfile;
pub use strategies::{BlockingStrategy, HttpStrategy, PooledStrategy};

use crate::config::ProbeConfig;
use crate::error::Result;
use crate::types::{FetchRequest, RawResponse};
use async_trait::async_trait;
use client::ClientKind;

/// One way of getting a URL.
///
/// A strategy performs exactly one fetch per call and reports what came back
/// without judging it: status codes, 403s and errors are all classified later.
/// Strategies hold no state that another strategy can see.
///
/// # Examples
/// ```no_run
/// use scrapeprobe::fetch::{default_strategies, FetchStrategy};
/// use scrapeprobe::{FetchRequest, HeaderSet, ProbeConfig};
///
/// # async fn example() -> scrapeprobe::Result<()> {
/// let strategies = default_strategies(&ProbeConfig::default())?;
/// let request = FetchRequest::new("https://example.com", HeaderSet::empty());
/// let raw = strategies[0].fetch(&request).await?;
/// println!("{} answered {:?}", strategies[0].name(), raw.status);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Unique within a registry; used as the results key and in file names.
    fn name(&self) -> &str;

    async fn fetch(&self, request: &FetchRequest) -> Result<RawResponse>;
}

/// Every built-in strategy, in menu order:
///
/// 1. `reqwest` plain client
/// 2. `cloudflare-headers` browser headers, same-origin Referer, one reload
///    through the cookie jar when a Cloudflare challenge answers
/// 3. `session` cookie jar
/// 4. `tls-profile` Chrome TLS and HTTP/2 fingerprint via `rquest`
/// 5. `http1` HTTP/1.1 only
/// 6. `pooled` reused connection pool
/// 7. `headless-chrome` Chromium over DevTools, serialized DOM
/// 8. `legacy-browser` HTTP/1.1 scripted browser with a cookie jar
/// 9. `blocking` synchronous client
/// 10. `async` async client with a 60s timeout
pub fn default_strategies(config: &ProbeConfig) -> Result<Vec<Box<dyn FetchStrategy>>> {
    Ok(vec![
        Box::new(HttpStrategy::new("reqwest", ClientKind::Plain)),
        Box::new(ChallengeStrategy::new(config.browser_profile)),
        Box::new(HttpStrategy::new("session", ClientKind::Session)),
        Box::new(ImpersonateStrategy::new(config.browser_profile)),
        Box::new(HttpStrategy::new("http1", ClientKind::Http1)),
        Box::new(PooledStrategy::new()?),
        Box::new(HeadlessChrome::new(
            config.browser_binary.clone(),
            config.browser_timeout(),
        )),
        Box::new(HttpStrategy::new("legacy-browser", ClientKind::Legacy)),
        Box::new(BlockingStrategy),
        Box::new(HttpStrategy::new("async", ClientKind::Async)),
    ])
}
