use super::challenge::detect_challenge;
use super::headers::{merge_profile, to_header_map};
use super::*;
use mockito::Matcher;
use reqwest::header::{HeaderMap, HeaderValue};
use crate::error::ProbeError;
use crate::types::HeaderSet;
use std::time::Duration;

fn request_for(url: String) -> FetchRequest {
    let headers = HeaderSet::empty()
        .with("User-Agent", "probe-test")
        .with("Accept", "application/json")
        .with("Accept-Language", "en-US,en;q=0.9");
    FetchRequest::new(url, headers)
}

#[test]
fn header_map_rejects_bad_names() {
    let hs = HeaderSet::empty().with("bad header", "x");
    let err = to_header_map(&hs).unwrap_err();
    assert!(matches!(err, ProbeError::InvalidHeader { .. }));
}

#[test]
fn caller_headers_win_over_profile() {
    let hs = HeaderSet::empty().with("Accept", "application/json");
    let mut headers = to_header_map(&hs).unwrap();
    merge_profile(&mut headers, BrowserProfile::Windows);

    assert_eq!(
        headers.get("accept").and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    assert_eq!(
        headers
            .get("sec-ch-ua-platform")
            .and_then(|v| v.to_str().ok()),
        Some("\"Windows\"")
    );
    assert_eq!(
        headers
            .get("sec-ch-ua-mobile")
            .and_then(|v| v.to_str().ok()),
        Some("?0")
    );
}

#[test]
fn android_profile_is_mobile() {
    let mut headers = to_header_map(&HeaderSet::empty()).unwrap();
    merge_profile(&mut headers, BrowserProfile::Android);
    assert_eq!(
        headers
            .get("sec-ch-ua-mobile")
            .and_then(|v| v.to_str().ok()),
        Some("?1")
    );
}

#[test]
fn registry_has_ten_unique_strategies_in_menu_order() {
    let strategies = default_strategies(&ProbeConfig::default()).unwrap();
    let names: Vec<&str> = strategies.iter().map(|s| s.name()).collect();
    assert_eq!(
        names,
        vec![
            "reqwest",
            "cloudflare-headers",
            "session",
            "tls-profile",
            "http1",
            "pooled",
            "headless-chrome",
            "legacy-browser",
            "blocking",
            "async",
        ]
    );
}

#[tokio::test]
async fn http_strategies_send_shared_headers() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/page")
        .match_header("user-agent", "probe-test")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_body("<html>ok</html>")
        .expect_at_least(1)
        .create_async()
        .await;

    let request = request_for(format!("{}/page", server.url()));
    let strategies = default_strategies(&ProbeConfig::default()).unwrap();

    for strategy in strategies.iter().filter(|s| s.name() != "headless-chrome") {
        let raw = strategy.fetch(&request).await.unwrap();
        assert_eq!(raw.status, Some(200), "{}", strategy.name());
        assert_eq!(raw.body, b"<html>ok</html>".to_vec(), "{}", strategy.name());
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn forbidden_is_returned_raw() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/")
        .with_status(403)
        .with_body("challenge")
        .create_async()
        .await;

    let request = request_for(format!("{}/", server.url()));
    let raw = HttpStrategy::new("reqwest", ClientKind::Plain)
        .fetch(&request)
        .await
        .unwrap();
    assert_eq!(raw.status, Some(403));
}

#[tokio::test]
async fn cloudflare_headers_adds_profile_and_referer() {
    let mut server = mockito::Server::new_async().await;
    let origin = format!("{}/", server.url());
    let mock = server
        .mock("GET", "/recipe")
        .match_header("referer", origin.as_str())
        .match_header("sec-fetch-mode", "navigate")
        .match_header("user-agent", "probe-test")
        .with_status(200)
        .with_body("ok")
        .create_async()
        .await;

    let request = request_for(format!("{}/recipe", server.url()));
    let raw = ChallengeStrategy::new(BrowserProfile::Windows)
        .fetch(&request)
        .await
        .unwrap();

    assert_eq!(raw.status, Some(200));
    mock.assert_async().await;
}

#[tokio::test]
async fn session_keeps_redirect_cookies() {
    let mut server = mockito::Server::new_async().await;
    let _login = server
        .mock("GET", "/start")
        .with_status(302)
        .with_header("location", "/landing")
        .with_header("set-cookie", "sid=abc; Path=/")
        .create_async()
        .await;
    let landing = server
        .mock("GET", "/landing")
        .match_header("cookie", "sid=abc")
        .with_status(200)
        .with_body("welcome")
        .create_async()
        .await;

    let request = request_for(format!("{}/start", server.url()));
    let raw = HttpStrategy::new("session", ClientKind::Session)
        .fetch(&request)
        .await
        .unwrap();

    assert_eq!(raw.status, Some(200));
    assert_eq!(raw.body, b"welcome".to_vec());
    landing.assert_async().await;
}

#[tokio::test]
async fn unreachable_host_is_transport_error() {
    let request = request_for("http://127.0.0.1:1/".to_string());
    let err = BlockingStrategy.fetch(&request).await.unwrap_err();
    assert!(matches!(err, ProbeError::Transport(_)));

    let err = HttpStrategy::new("reqwest", ClientKind::Plain)
        .fetch(&request)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("request failed"));
}

#[tokio::test]
async fn missing_browser_binary_is_transport_error() {
    let browser = HeadlessChrome::new("/nonexistent/chromium", Duration::from_secs(5));
    let err = browser
        .fetch(&request_for("https://example.com".into()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("failed to launch"));
}

#[cfg(unix)]
fn fake_browser(dir: &std::path::Path, script: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("fake-chromium");
    std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[tokio::test]
async fn browser_nonzero_exit_is_error() {
    let tmp = tempfile::tempdir().unwrap();
    let bin = fake_browser(tmp.path(), "echo 'crashed' >&2; exit 3");
    let browser = HeadlessChrome::new(bin, Duration::from_secs(10));

    let err = browser
        .fetch(&request_for("https://example.com/".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, ProbeError::Transport(_)));
    assert!(err.to_string().contains("failed to launch"));
}

#[cfg(unix)]
#[tokio::test]
async fn browser_hang_times_out() {
    let tmp = tempfile::tempdir().unwrap();
    let bin = fake_browser(tmp.path(), "sleep 10");
    let browser = HeadlessChrome::new(bin, Duration::from_millis(200));

    let err = browser
        .fetch(&request_for("https://example.com/".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, ProbeError::Timeout(_)));
}

#[tokio::test]
#[ignore = "needs a Chromium binary in CHROME_BIN"]
async fn real_browser_returns_dom_without_status() {
    let Ok(binary) = std::env::var("CHROME_BIN") else {
        return;
    };
    let mut server = mockito::Server::new_async().await;
    let _page = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html><body><p id=\"marker\">rendered</p></body></html>")
        .create_async()
        .await;

    let browser = HeadlessChrome::new(binary, Duration::from_secs(30));
    let raw = browser
        .fetch(&request_for(format!("{}/", server.url())))
        .await
        .unwrap();

    assert_eq!(raw.status, None);
    assert!(String::from_utf8(raw.body).unwrap().contains("id=\"marker\""));
}

fn cloudflare_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("server", HeaderValue::from_static("cloudflare"));
    headers
}

const INTERSTITIAL: &str = "<html><head><title>Just a moment...</title></head>\
    <body><script src=\"/cdn-cgi/challenge-platform/h/b/orchestrate/chl_page\"></script></body></html>";

#[test]
fn detects_cloudflare_interstitials() {
    assert_eq!(
        detect_challenge(503, &cloudflare_headers(), INTERSTITIAL),
        Some("javascript challenge")
    );

    let mut managed = HeaderMap::new();
    managed.insert("cf-mitigated", HeaderValue::from_static("challenge"));
    assert_eq!(
        detect_challenge(403, &managed, ""),
        Some("managed challenge")
    );
}

#[test]
fn ordinary_responses_are_not_challenges() {
    // plain 403 from an origin without Cloudflare in front
    assert_eq!(detect_challenge(403, &HeaderMap::new(), INTERSTITIAL), None);
    // Cloudflare-served 403 without interstitial markup
    assert_eq!(detect_challenge(403, &cloudflare_headers(), "forbidden"), None);
    // success pages mentioning the markers
    assert_eq!(detect_challenge(200, &cloudflare_headers(), INTERSTITIAL), None);
}

#[tokio::test]
async fn challenge_is_retried_once_with_cookies() {
    let mut server = mockito::Server::new_async().await;
    let challenge = server
        .mock("GET", "/guarded")
        .match_header("cookie", Matcher::Missing)
        .with_status(503)
        .with_header("server", "cloudflare")
        .with_header("set-cookie", "__cf_bm=token; Path=/")
        .with_body(INTERSTITIAL)
        .expect(1)
        .create_async()
        .await;
    let url = format!("{}/guarded", server.url());
    let cleared = server
        .mock("GET", "/guarded")
        .match_header("cookie", "__cf_bm=token")
        .match_header("referer", url.as_str())
        .match_header("sec-fetch-site", "same-origin")
        .with_status(200)
        .with_body("welcome")
        .expect(1)
        .create_async()
        .await;

    let raw = ChallengeStrategy::new(BrowserProfile::Windows)
        .with_delay(Duration::ZERO)
        .fetch(&request_for(url.clone()))
        .await
        .unwrap();

    assert_eq!(raw.status, Some(200));
    assert_eq!(raw.body, b"welcome".to_vec());
    challenge.assert_async().await;
    cleared.assert_async().await;
}

#[tokio::test]
async fn persistent_challenge_is_returned_raw() {
    let mut server = mockito::Server::new_async().await;
    let challenge = server
        .mock("GET", "/")
        .with_status(403)
        .with_header("server", "cloudflare")
        .with_body(INTERSTITIAL)
        .expect(2)
        .create_async()
        .await;

    let raw = ChallengeStrategy::new(BrowserProfile::Windows)
        .with_delay(Duration::ZERO)
        .fetch(&request_for(format!("{}/", server.url())))
        .await
        .unwrap();

    assert_eq!(raw.status, Some(403));
    challenge.assert_async().await;
}

#[tokio::test]
async fn impersonated_client_sends_shared_headers_over_its_own_stack() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .match_header("user-agent", "probe-test")
        .match_header("accept-language", "en-US,en;q=0.9")
        .with_status(200)
        .with_body("ok")
        .create_async()
        .await;

    let raw = ImpersonateStrategy::new(BrowserProfile::Android)
        .fetch(&request_for(format!("{}/", server.url())))
        .await
        .unwrap();

    assert_eq!(raw.status, Some(200));
    mock.assert_async().await;
}
