use crate::classify::classify;
use crate::error::{ProbeError, Result};
use crate::fetch::FetchStrategy;
use crate::history::ActivityLogger;
use crate::persist;
use crate::report::report;
use crate::types::{FetchRequest, RunResults, Selection, StrategyResult};
use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Asked once after a successful single-strategy fetch.
pub trait SaveDecision {
    fn confirm(&mut self, strategy_name: &str, url: &str) -> bool;
}

impl<F> SaveDecision for F
where
    F: FnMut(&str, &str) -> bool,
{
    fn confirm(&mut self, strategy_name: &str, url: &str) -> bool {
        self(strategy_name, url)
    }
}

/// Never saves anything.
pub struct NeverSave;

impl SaveDecision for NeverSave {
    fn confirm(&mut self, _strategy_name: &str, _url: &str) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// `None` picks the mode default: full body for one strategy, a preview
    /// for all of them.
    pub full_output: Option<bool>,
    pub strategy_timeout: Option<Duration>,
    pub data_dir: PathBuf,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            full_output: None,
            strategy_timeout: None,
            data_dir: PathBuf::from(crate::config::DEFAULT_DATA_DIR),
        }
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub results: RunResults,
    pub saved: Option<PathBuf>,
}

/// Drives the selected strategies one after another against one request.
///
/// Each strategy runs exactly once. Whatever it returns (or raises) is
/// classified, rendered to `out` and recorded before the next one starts, so
/// the trace stays in declaration order. Nothing a strategy does aborts the
/// run.
pub struct Orchestrator {
    strategies: Vec<Box<dyn FetchStrategy>>,
    history: Option<ActivityLogger>,
}

impl Orchestrator {
    pub fn new(strategies: Vec<Box<dyn FetchStrategy>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for s in &strategies {
            if !seen.insert(s.name().to_string()) {
                return Err(ProbeError::DuplicateStrategy(s.name().to_string()));
            }
        }
        Ok(Self {
            strategies,
            history: None,
        })
    }

    pub fn with_history(mut self, logger: ActivityLogger) -> Self {
        self.history = Some(logger);
        self
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    fn selected(&self, selection: Selection) -> Result<Vec<&dyn FetchStrategy>> {
        match selection {
            Selection::All => Ok(self.strategies.iter().map(|s| s.as_ref()).collect()),
            Selection::One(idx) => self
                .strategies
                .get(idx)
                .map(|s| vec![s.as_ref()])
                .ok_or_else(|| {
                    ProbeError::InvalidSelection(format!(
                        "strategy {} does not exist ({} registered)",
                        idx + 1,
                        self.strategies.len()
                    ))
                }),
        }
    }

    pub async fn run<W: Write>(
        &self,
        request: &FetchRequest,
        selection: Selection,
        opts: &RunOptions,
        decider: &mut dyn SaveDecision,
        out: &mut W,
    ) -> Result<RunReport> {
        let selected = self.selected(selection)?;
        let full_output = opts.full_output.unwrap_or(selection.is_single());
        let host = request.host();
        let mut report_out = RunReport::default();

        info!(url = request.url(), strategies = selected.len(), "run started");

        for strategy in selected {
            let name = strategy.name();
            emit(out, &format!("--- {name} Method ---\n"));

            let result = self.invoke(strategy, request, opts.strategy_timeout).await;
            let rendered = report(name, &result.outcome, full_output);
            emit(out, &rendered.to_string());
            if let Some(secs) = result.elapsed_seconds {
                emit(out, &format!("Time taken: {secs:.2} seconds\n"));
            }
            emit(out, "\n");

            if selection.is_single() && result.outcome.verdict.is_success() {
                report_out.saved = self.maybe_save(&result, request, opts, decider, out);
            }

            if let Some(logger) = &self.history {
                if let Err(e) = logger.record(host.as_deref(), &result) {
                    warn!(error = %e, "could not write activity log");
                }
            }

            report_out.results.insert(result)?;
        }

        info!(
            succeeded = report_out.results.success_count(),
            total = report_out.results.len(),
            "run finished"
        );
        Ok(report_out)
    }

    /// Run one strategy and turn whatever happened into a result.
    async fn invoke(
        &self,
        strategy: &dyn FetchStrategy,
        request: &FetchRequest,
        timeout: Option<Duration>,
    ) -> StrategyResult {
        let name = strategy.name();
        debug!(strategy = name, "running");

        let started = Instant::now();
        let raw = match timeout {
            Some(limit) => match tokio::time::timeout(limit, strategy.fetch(request)).await {
                Ok(raw) => raw,
                Err(_) => Err(ProbeError::Timeout(limit)),
            },
            None => strategy.fetch(request).await,
        };
        let elapsed = started.elapsed();

        if let Err(e) = &raw {
            debug!(strategy = name, error = %e, "strategy raised");
        }

        let outcome = classify(raw);
        debug!(strategy = name, verdict = ?outcome.verdict, status = ?outcome.status_code, "recorded");

        let elapsed_seconds = outcome
            .verdict
            .is_success()
            .then(|| elapsed.as_secs_f64());

        StrategyResult {
            strategy_name: name.to_string(),
            outcome,
            elapsed_seconds,
        }
    }

    /// Ask, then write. A failed save is reported and otherwise ignored.
    fn maybe_save<W: Write>(
        &self,
        result: &StrategyResult,
        request: &FetchRequest,
        opts: &RunOptions,
        decider: &mut dyn SaveDecision,
        out: &mut W,
    ) -> Option<PathBuf> {
        if !decider.confirm(&result.strategy_name, request.url()) {
            return None;
        }
        let body = result.outcome.body_text()?;
        let record = persist::build_record(&result.strategy_name, request.url(), &body);

        match persist::save(&opts.data_dir, &record) {
            Ok(path) => {
                emit(out, &format!("Saved to {}\n", path.display()));
                Some(path)
            }
            Err(e) => {
                warn!(error = %e, "save failed");
                emit(out, &format!("Failed to save: {e}\n"));
                None
            }
        }
    }
}

fn emit<W: Write>(out: &mut W, text: &str) {
    if let Err(e) = out.write_all(text.as_bytes()) {
        debug!(error = %e, "trace output unavailable");
    }
}
