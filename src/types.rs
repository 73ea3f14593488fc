use crate::error::{ProbeError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use url::Url;

/// Request headers shared by every strategy. Names keep the caller's casing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSet(pub BTreeMap<String, String>);

impl HeaderSet {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, k: &str, v: &str) -> Self {
        self.0.insert(k.to_string(), v.to_string());
        self
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One URL plus the headers every strategy sends. Built once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    url: String,
    headers: HeaderSet,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, headers: HeaderSet) -> Self {
        Self {
            url: url.into(),
            headers,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.headers.get("User-Agent")
    }

    /// Host part of the URL, if it parses. Only used for logging.
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }

    /// `scheme://host[:port]/` of the URL, used as a same-origin Referer.
    pub fn origin(&self) -> Option<String> {
        let origin = Url::parse(&self.url).ok()?.origin();
        origin
            .is_tuple()
            .then(|| format!("{}/", origin.ascii_serialization()))
    }
}

/// What a strategy hands back before any classification happens.
///
/// `status` is `None` for transports that never see an HTTP status (the
/// headless browser).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: Option<u16>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: Some(status),
            body: body.into(),
        }
    }

    pub fn without_status(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: None,
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Success,
    Blocked,
    Failed,
}

impl Verdict {
    /// Label used in the final summary. Blocked attempts read as failures there.
    pub fn summary_label(&self) -> &'static str {
        match self {
            Verdict::Success => "Success",
            Verdict::Blocked | Verdict::Failed => "Failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success)
    }
}

/// Normalized result of one strategy invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub verdict: Verdict,
    pub status_code: Option<u16>,
    pub body: Option<Vec<u8>>,
    pub error_message: Option<String>,
}

impl FetchOutcome {
    pub fn success(status: u16, body: Vec<u8>) -> Self {
        Self {
            verdict: Verdict::Success,
            status_code: Some(status),
            body: Some(body),
            error_message: None,
        }
    }

    pub fn blocked(status: u16) -> Self {
        Self {
            verdict: Verdict::Blocked,
            status_code: Some(status),
            body: None,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Failed,
            status_code: None,
            body: None,
            error_message: Some(message.into()),
        }
    }

    /// Body decoded as UTF-8, invalid sequences replaced.
    pub fn body_text(&self) -> Option<Cow<'_, str>> {
        self.body.as_deref().map(String::from_utf8_lossy)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyResult {
    pub strategy_name: String,
    pub outcome: FetchOutcome,
    /// Only set for `Success`.
    pub elapsed_seconds: Option<f64>,
}

/// Results of one run, in invocation order, keyed by strategy name.
#[derive(Debug, Clone, Default)]
pub struct RunResults {
    entries: Vec<StrategyResult>,
}

impl RunResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, result: StrategyResult) -> Result<()> {
        if self.get(&result.strategy_name).is_some() {
            return Err(ProbeError::DuplicateStrategy(result.strategy_name));
        }
        self.entries.push(result);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&StrategyResult> {
        self.entries.iter().find(|r| r.strategy_name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StrategyResult> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|r| r.outcome.verdict.is_success())
            .count()
    }
}

/// Which strategies a run drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Zero-based index into the registry.
    One(usize),
    All,
}

impl Selection {
    /// Parse a menu answer: `1..=count` picks one strategy, `count + 1` or
    /// `all` picks every strategy.
    pub fn parse(input: &str, count: usize) -> Result<Self> {
        let input = input.trim();
        if input.eq_ignore_ascii_case("all") {
            return Ok(Selection::All);
        }
        let n: usize = input.parse().map_err(|_| {
            ProbeError::InvalidSelection(format!("'{input}' is not a number"))
        })?;
        match n {
            n if n >= 1 && n <= count => Ok(Selection::One(n - 1)),
            n if n == count + 1 => Ok(Selection::All),
            _ => Err(ProbeError::InvalidSelection(format!(
                "please enter a number between 1 and {}",
                count + 1
            ))),
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, Selection::One(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveFormat {
    Json,
    Html,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Json => "json",
            SaveFormat::Html => "html",
        }
    }
}

/// A successful body, formatted and named, ready to be written once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRecord {
    pub strategy_name: String,
    pub sanitized_url_fragment: String,
    pub random_suffix: u16,
    pub format: SaveFormat,
    pub content: String,
}

impl PersistedRecord {
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.{}",
            self.strategy_name,
            self.sanitized_url_fragment,
            self.random_suffix,
            self.format.extension()
        )
    }
}
