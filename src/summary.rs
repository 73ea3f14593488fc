//! Cross-strategy summary.

use crate::types::{RunResults, Selection, StrategyResult};

const ALL_HEADER: &str = "===== Summary of Scraping Methods =====";
const ALL_FOOTER: &str = "=======================================";
const SINGLE_HEADER: &str = "===== Summary =====";
const SINGLE_FOOTER: &str = "===================";

/// `name: Success (Time taken: 0.12 seconds)` or `name: Failed`.
pub fn summary_line(result: &StrategyResult) -> String {
    let mut line = format!(
        "{}: {}",
        result.strategy_name,
        result.outcome.verdict.summary_label()
    );
    if let Some(secs) = result.elapsed_seconds {
        line.push_str(&format!(" (Time taken: {secs:.2} seconds)"));
    }
    line
}

/// One line per result, in insertion order. No banners.
pub fn summarize(results: &RunResults) -> String {
    results
        .iter()
        .map(summary_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// The summary wrapped in the banner for the selection mode.
pub fn summary_block(results: &RunResults, selection: Selection) -> String {
    let (header, footer) = match selection {
        Selection::All => (ALL_HEADER, ALL_FOOTER),
        Selection::One(_) => (SINGLE_HEADER, SINGLE_FOOTER),
    };
    format!("\n{header}\n{}\n{footer}\n", summarize(results))
}
