//! User-Agent generation.

use rand::seq::IndexedRandom;
use tracing::warn;

/// Used whenever a provider cannot produce a User-Agent.
pub const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/103.0.0.0 Safari/537.36";

const FIREFOX_LINUX: [&str; 6] = [
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:131.0) Gecko/20100101 Firefox/131.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:132.0) Gecko/20100101 Firefox/132.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (X11; Fedora; Linux x86_64; rv:134.0) Gecko/20100101 Firefox/134.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:135.0) Gecko/20100101 Firefox/135.0",
];

pub trait UserAgentProvider: Send + Sync {
    /// `None` means the generator is unavailable.
    fn generate(&self) -> Option<String>;
}

/// Picks a random Firefox-on-Linux User-Agent.
#[derive(Debug, Clone)]
pub struct RandomUserAgent {
    pool: Vec<String>,
}

impl Default for RandomUserAgent {
    fn default() -> Self {
        Self {
            pool: FIREFOX_LINUX.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl RandomUserAgent {
    pub fn with_pool(pool: Vec<String>) -> Self {
        Self { pool }
    }
}

impl UserAgentProvider for RandomUserAgent {
    fn generate(&self) -> Option<String> {
        self.pool.choose(&mut rand::rng()).cloned()
    }
}

/// Always returns the same string.
#[derive(Debug, Clone)]
pub struct FixedUserAgent(pub String);

impl UserAgentProvider for FixedUserAgent {
    fn generate(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

pub fn resolve_user_agent(provider: &dyn UserAgentProvider) -> String {
    match provider.generate() {
        Some(ua) if !ua.trim().is_empty() => ua,
        _ => {
            warn!("user agent generator unavailable, using fallback");
            FALLBACK_USER_AGENT.to_string()
        }
    }
}
