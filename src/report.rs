//! Per-strategy trace rendering.

use crate::types::{FetchOutcome, Verdict};
use std::fmt;

/// Lines shown when the full body is not requested.
pub const PREVIEW_LINES: usize = 5;

/// Full body, or its first [`PREVIEW_LINES`] lines.
pub fn preview(body: &str, full_output: bool) -> String {
    if full_output {
        return body.to_string();
    }
    body.lines()
        .take(PREVIEW_LINES)
        .collect::<Vec<_>>()
        .join("\n")
}

/// What the user sees for one strategy. Built from an outcome, never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPreview {
    pub strategy_name: String,
    pub verdict: Verdict,
    pub status_code: Option<u16>,
    pub content: Option<String>,
    pub message: Option<String>,
    pub full_output: bool,
}

pub fn report(strategy_name: &str, outcome: &FetchOutcome, full_output: bool) -> RenderedPreview {
    let content = match outcome.verdict {
        // 403 bodies are never shown, even if a transport kept one around
        Verdict::Blocked => None,
        _ => outcome
            .body_text()
            .map(|text| preview(&text, full_output)),
    };

    RenderedPreview {
        strategy_name: strategy_name.to_string(),
        verdict: outcome.verdict,
        status_code: outcome.status_code,
        content,
        message: outcome.error_message.clone(),
        full_output,
    }
}

impl RenderedPreview {
    fn content_heading(&self) -> &'static str {
        if self.full_output {
            "Content:"
        } else {
            "Content (First 5 Lines):"
        }
    }
}

impl fmt::Display for RenderedPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.strategy_name;
        match (self.verdict, self.status_code) {
            (Verdict::Failed, None) => {
                let msg = self.message.as_deref().unwrap_or("unknown error");
                writeln!(f, "{name} failed: {msg}")
            }
            (Verdict::Blocked, status) => {
                let status = status.unwrap_or(403);
                writeln!(f, "{name}:")?;
                writeln!(f, "Status Code: {status}")?;
                writeln!(
                    f,
                    "Response content not displayed due to status code {status}."
                )
            }
            (verdict, Some(status)) => {
                writeln!(f, "{name}:")?;
                writeln!(f, "Status Code: {status}")?;
                if let Some(content) = &self.content {
                    writeln!(f, "{}\n{content}", self.content_heading())?;
                }
                if verdict == Verdict::Failed {
                    let msg = self.message.as_deref().unwrap_or("not successful");
                    writeln!(f, "Not successful: {msg}")?;
                }
                Ok(())
            }
            (Verdict::Success, None) => {
                writeln!(f, "{name}:")?;
                if let Some(content) = &self.content {
                    writeln!(f, "{}\n{content}", self.content_heading())?;
                }
                Ok(())
            }
        }
    }
}
