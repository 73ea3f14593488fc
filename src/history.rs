use crate::error::{ProbeError, Result};
use crate::types::{StrategyResult, Verdict};
use chrono::Utc;
use directories::ProjectDirs;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

const SUCCESS_MARK: &str = "🟢";
const BLOCKED_MARK: &str = "🟠";
const FAILED_MARK: &str = "🔴";

/// Append-only log of every strategy result, one line each.
pub struct ActivityLogger {
    log_path: PathBuf,
}

impl ActivityLogger {
    pub fn new() -> Result<Self> {
        let proj = ProjectDirs::from("io", "scrapeprobe", "scrapeprobe").ok_or_else(|| {
            ProbeError::Config("could not resolve data dir for activity log".into())
        })?;
        let dir = proj.data_local_dir();
        fs::create_dir_all(dir)?;
        Ok(Self::at(dir.join("activity.log")))
    }

    pub fn at(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
        }
    }

    pub fn record(&self, host: Option<&str>, result: &StrategyResult) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        let mark = match result.outcome.verdict {
            Verdict::Success => SUCCESS_MARK,
            Verdict::Blocked => BLOCKED_MARK,
            Verdict::Failed => FAILED_MARK,
        };

        let detail = match (&result.elapsed_seconds, &result.outcome.error_message) {
            (Some(secs), _) => format!("{secs:.2}s"),
            (None, Some(msg)) => msg.replace('\n', " "),
            (None, None) => result
                .outcome
                .status_code
                .map(|s| format!("status {s}"))
                .unwrap_or_default(),
        };

        writeln!(
            file,
            "{} {} {} {} {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            mark,
            result.strategy_name,
            host.unwrap_or("*"),
            detail
        )?;

        Ok(())
    }

    /// Logged lines, newest first.
    pub fn read(&self, errors_only: bool) -> Result<Vec<String>> {
        if !self.log_path.exists() {
            return Ok(vec![]);
        }

        let file = fs::File::open(&self.log_path)?;
        let reader = BufReader::new(file);
        let mut matching_lines = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if errors_only && line.contains(SUCCESS_MARK) {
                continue;
            }
            matching_lines.push(line);
        }

        matching_lines.reverse();
        Ok(matching_lines)
    }
}
