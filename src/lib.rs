//! Fetch one URL through many HTTP client strategies and compare the results.
//!
//! ```no_run
//! use scrapeprobe::fetch::default_strategies;
//! use scrapeprobe::orchestrator::{NeverSave, Orchestrator, RunOptions};
//! use scrapeprobe::{summarize, FetchRequest, ProbeConfig, Selection};
//!
//! # async fn example() -> scrapeprobe::Result<()> {
//! let config = ProbeConfig::default();
//! let orchestrator = Orchestrator::new(default_strategies(&config)?)?;
//! let request = FetchRequest::new("https://example.com", config.request_headers("Mozilla/5.0"));
//!
//! let report = orchestrator
//!     .run(&request, Selection::All, &RunOptions::default(), &mut NeverSave, &mut std::io::sink())
//!     .await?;
//! println!("{}", summarize(&report.results));
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod history;
pub mod orchestrator;
pub mod persist;
pub mod report;
pub mod summary;
pub mod types;


pub use classify::classify;
pub use config::ProbeConfig;
pub use error::{ProbeError, Result};
pub use report::{preview, report, RenderedPreview};
pub use summary::{summarize, summary_block};
pub use types::*;
