//! Challenge-aware fetching for Cloudflare-fronted sites.
//!
//! The first GET goes out with a full browser header profile and a
//! same-origin Referer. If the answer is a Cloudflare interstitial, the
//! strategy waits out the challenge delay and asks again through the same
//! cookie jar, the way a browser reloads once the clearance cookies are set.
//! JavaScript challenges are not solved; a challenge that survives the
//! reload is returned as-is for the classifier.

use super::client::{build_client, ClientKind};
use super::headers::{add_referer, merge_profile, to_header_map};
use super::profile::BrowserProfile;
use super::strategies::send_raw;
use super::FetchStrategy;
use crate::error::Result;
use crate::types::{FetchRequest, RawResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, SERVER};
use std::time::Duration;
use tracing::{debug, info};

/// Initial GET plus one challenge round trip.
const MAX_ATTEMPTS: usize = 2;
/// Cloudflare's interstitial asks browsers to wait about this long.
const CHALLENGE_DELAY: Duration = Duration::from_secs(5);

const CHALLENGE_STATUSES: [u16; 3] = [403, 429, 503];
const BODY_MARKERS: [&str; 4] = [
    "cf-browser-verification",
    "/cdn-cgi/challenge-platform/",
    "Just a moment...",
    "Checking your browser",
];

/// Name of the challenge a response carries, if any.
pub(crate) fn detect_challenge(status: u16, headers: &HeaderMap, body: &str) -> Option<&'static str> {
    let header_is = |name: &str, needle: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().contains(needle))
    };

    if header_is("cf-mitigated", "challenge") {
        return Some("managed challenge");
    }
    if !CHALLENGE_STATUSES.contains(&status) {
        return None;
    }
    let from_cloudflare = header_is(SERVER.as_str(), "cloudflare") || headers.contains_key("cf-ray");
    if from_cloudflare && BODY_MARKERS.iter().any(|m| body.contains(m)) {
        return Some("javascript challenge");
    }
    None
}

pub struct ChallengeStrategy {
    profile: BrowserProfile,
    max_attempts: usize,
    delay: Duration,
}

impl ChallengeStrategy {
    pub fn new(profile: BrowserProfile) -> Self {
        Self {
            profile,
            max_attempts: MAX_ATTEMPTS,
            delay: CHALLENGE_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn first_headers(&self, request: &FetchRequest) -> Result<HeaderMap> {
        let mut headers = to_header_map(request.headers())?;
        merge_profile(&mut headers, self.profile);
        if let Some(origin) = request.origin() {
            add_referer(&mut headers, &origin);
        }
        Ok(headers)
    }
}

#[async_trait]
impl FetchStrategy for ChallengeStrategy {
    fn name(&self) -> &str {
        "cloudflare-headers"
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<RawResponse> {
        let client = build_client(ClientKind::Challenge)?;
        let mut headers = self.first_headers(request)?;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let (status, response_headers, body) =
                send_raw(&client, request.url(), headers.clone()).await?;

            let Some(pattern) =
                detect_challenge(status, &response_headers, &String::from_utf8_lossy(&body))
            else {
                return Ok(RawResponse::new(status, body));
            };

            if attempt >= self.max_attempts {
                debug!(pattern, attempt, "challenge persisted");
                return Ok(RawResponse::new(status, body));
            }

            info!(pattern, status, "challenge detected, retrying with cookies");
            tokio::time::sleep(self.delay).await;

            // the reload comes from the challenge page itself
            if let Ok(referer) = HeaderValue::from_str(request.url()) {
                headers.insert(REFERER, referer);
            }
            headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));
        }
    }
}
