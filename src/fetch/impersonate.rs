//! Browser impersonation at the TLS and HTTP/2 layer.
//!
//! `rquest` reproduces a real browser's ClientHello (cipher and extension
//! order, GREASE, ALPN), HTTP/2 SETTINGS and pseudo-header order, and its
//! default header set. The shared request headers are layered on top.

use super::profile::BrowserProfile;
use super::FetchStrategy;
use crate::error::{ProbeError, Result};
use crate::types::{FetchRequest, HeaderSet, RawResponse};
use async_trait::async_trait;
use rquest::header::{HeaderMap, HeaderName, HeaderValue};
use rquest::Client;
use rquest_util::{Emulation, EmulationOS, EmulationOption};
use tracing::debug;

/// Chrome release whose handshake is reproduced.
const EMULATED_BROWSER: Emulation = Emulation::Chrome131;

impl BrowserProfile {
    pub(crate) fn emulation(self) -> EmulationOption {
        let os = match self {
            BrowserProfile::Windows => EmulationOS::Windows,
            BrowserProfile::Android => EmulationOS::Android,
        };
        EmulationOption::builder()
            .emulation(EMULATED_BROWSER)
            .emulation_os(os)
            .build()
    }
}

pub struct ImpersonateStrategy {
    profile: BrowserProfile,
}

impl ImpersonateStrategy {
    pub fn new(profile: BrowserProfile) -> Self {
        Self { profile }
    }

    fn client(&self) -> Result<Client> {
        Client::builder()
            .emulation(self.profile.emulation())
            .cookie_store(true)
            .build()
            .map_err(|e| ProbeError::transport(format!("failed to build client: {e}")))
    }
}

#[async_trait]
impl FetchStrategy for ImpersonateStrategy {
    fn name(&self) -> &str {
        "tls-profile"
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<RawResponse> {
        let client = self.client()?;
        let headers = emulated_header_map(request.headers())?;
        debug!(profile = ?self.profile, "sending impersonated request");

        let response = client
            .get(request.url())
            .headers(headers)
            .send()
            .await
            .map_err(|e| ProbeError::transport(format!("request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProbeError::transport(format!("failed to read response: {e}")))?;

        Ok(RawResponse::new(status, body.to_vec()))
    }
}

/// rquest sits on `http` 1.x, so its header types differ from reqwest's.
fn emulated_header_map(hs: &HeaderSet) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (k, v) in hs.iter() {
        let invalid = |reason: String| ProbeError::InvalidHeader {
            name: k.to_string(),
            reason,
        };
        let name = HeaderName::from_bytes(k.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let value = HeaderValue::from_str(v).map_err(|e| invalid(e.to_string()))?;
        headers.insert(name, value);
    }
    Ok(headers)
}
