use super::profile::BrowserProfile;
use crate::error::{ProbeError, Result};
use crate::types::HeaderSet;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, REFERER};

/// Convert the shared header set into a reqwest header map.
pub(crate) fn to_header_map(hs: &HeaderSet) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (k, v) in hs.iter() {
        let name = HeaderName::from_bytes(k.as_bytes()).map_err(|e| ProbeError::InvalidHeader {
            name: k.to_string(),
            reason: e.to_string(),
        })?;
        let value = HeaderValue::from_str(v).map_err(|e| ProbeError::InvalidHeader {
            name: k.to_string(),
            reason: e.to_string(),
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Add the profile's browser headers. Headers the caller already set win.
pub(crate) fn merge_profile(headers: &mut HeaderMap, profile: BrowserProfile) {
    for (k, v) in header_pairs_for_profile(profile) {
        let name = HeaderName::from_static(k);
        if !headers.contains_key(&name) {
            headers.insert(name, HeaderValue::from_static(v));
        }
    }
}

/// Set a Referer unless one is already present. Invalid values are skipped.
pub(crate) fn add_referer(headers: &mut HeaderMap, referer: &str) {
    if headers.contains_key(REFERER) {
        return;
    }
    if let Ok(value) = HeaderValue::from_str(referer) {
        headers.insert(REFERER, value);
    }
}

/// Header pairs for the given profile (without User-Agent). Names are lowercase.
fn header_pairs_for_profile(profile: BrowserProfile) -> Vec<(&'static str, &'static str)> {
    match profile {
        BrowserProfile::Windows => vec![
            ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7"),
            ("accept-language", "en-US,en;q=0.9"),
            ("accept-encoding", "gzip, deflate, br"),
            ("upgrade-insecure-requests", "1"),
            ("sec-fetch-dest", "document"),
            ("sec-fetch-mode", "navigate"),
            ("sec-fetch-site", "none"),
            ("sec-fetch-user", "?1"),
            ("sec-ch-ua", "\"Google Chrome\";v=\"131\", \"Chromium\";v=\"131\", \"Not_A Brand\";v=\"24\""),
            ("sec-ch-ua-mobile", "?0"),
            ("sec-ch-ua-platform", "\"Windows\""),
        ],
        BrowserProfile::Android => vec![
            ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7"),
            ("accept-language", "en-US,en;q=0.9"),
            ("accept-encoding", "gzip, deflate, br"),
            ("upgrade-insecure-requests", "1"),
            ("sec-fetch-dest", "document"),
            ("sec-fetch-mode", "navigate"),
            ("sec-fetch-site", "none"),
            ("sec-fetch-user", "?1"),
            ("sec-ch-ua", "\"Not;A=Brand\";v=\"99\", \"Google Chrome\";v=\"139\", \"Chromium\";v=\"139\""),
            ("sec-ch-ua-mobile", "?1"),
            ("sec-ch-ua-platform", "\"Android\""),
        ],
    }
}
