use crate::agent::{resolve_user_agent, RandomUserAgent};
use crate::config::ProbeConfig;
use crate::fetch::default_strategies;
use crate::history::ActivityLogger;
use crate::orchestrator::{NeverSave, Orchestrator, RunOptions, SaveDecision};
use crate::summary::summary_block;
use crate::types::{FetchRequest, Selection};
use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser)]
#[command(
    name = "scrapeprobe",
    version,
    about = "Fetch one URL through many HTTP client strategies and compare what gets through"
)]
pub struct Cli {
    /// URL to fetch (prompted for when omitted)
    url: Option<String>,

    /// Strategy number as shown by --list, or "all" (menu when omitted)
    #[arg(short, long)]
    strategy: Option<String>,

    /// Print whole bodies even when running every strategy
    #[arg(long)]
    full: bool,

    /// Whether to save a successful single-strategy result
    #[arg(long, value_enum, default_value_t = SaveMode::Ask)]
    save: SaveMode,

    /// Give up on any single strategy after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Give up on the headless browser after this many seconds
    #[arg(long, value_name = "SECS")]
    browser_timeout: Option<u64>,

    /// Chromium-compatible binary for the headless strategy
    #[arg(long, env = "CHROME_BIN", value_name = "PATH")]
    browser: Option<PathBuf>,

    /// Directory saved results go to
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// JSON config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Do not append results to the activity log
    #[arg(long)]
    no_history: bool,

    /// List strategies and exit
    #[arg(long)]
    list: bool,

    /// Print past results, newest first, and exit
    #[arg(long)]
    history: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SaveMode {
    Ask,
    Yes,
    No,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    run_with_args(cli).await
}

pub async fn run_with_args(cli: Cli) -> Result<()> {
    let config = effective_config(&cli)?;

    if cli.history {
        let logger = ActivityLogger::new()?;
        for line in logger.read(false)? {
            println!("{line}");
        }
        return Ok(());
    }

    let mut orchestrator = Orchestrator::new(default_strategies(&config)?)?;
    if config.history {
        match ActivityLogger::new() {
            Ok(logger) => orchestrator = orchestrator.with_history(logger),
            Err(e) => warn!(error = %e, "activity log disabled"),
        }
    }

    if cli.list {
        print!("{}", menu(&orchestrator));
        return Ok(());
    }

    let url = match cli.url.clone() {
        Some(url) => url,
        None => prompt(
            "Enter the URL to scrape (a VPN is highly recommended if you don't want your IP address banned): ",
        )?,
    };

    let selection = match cli.strategy.as_deref() {
        Some(raw) => Selection::parse(raw, orchestrator.len())?,
        None => {
            print!("{}", menu(&orchestrator));
            prompt_selection(orchestrator.len())?
        }
    };

    let user_agent = resolve_user_agent(&RandomUserAgent::default());
    let request = FetchRequest::new(url, config.request_headers(&user_agent));

    let opts = RunOptions {
        full_output: cli.full.then_some(true),
        strategy_timeout: config.strategy_timeout(),
        data_dir: config.data_dir.clone(),
    };

    match selection {
        Selection::All => println!("\n--- All Methods ---\n"),
        Selection::One(_) => println!(),
    }

    let mut ask = |strategy: &str, _url: &str| {
        let question = format!(
            "Save the {strategy} result to {}/? (y/n): ",
            opts.data_dir.display()
        );
        matches!(
            prompt(&question).map(|a| a.to_ascii_lowercase()).as_deref(),
            Ok("y") | Ok("yes")
        )
    };
    let mut yes = |_: &str, _: &str| true;
    let mut never = NeverSave;
    let decider: &mut dyn SaveDecision = match cli.save {
        SaveMode::Ask => &mut ask,
        SaveMode::Yes => &mut yes,
        SaveMode::No => &mut never,
    };

    let mut stdout = io::stdout();
    let report = orchestrator
        .run(&request, selection, &opts, decider, &mut stdout)
        .await?;

    print!("{}", summary_block(&report.results, selection));
    println!();
    stdout.flush().context("failed to flush stdout")?;
    Ok(())
}

fn effective_config(cli: &Cli) -> Result<ProbeConfig> {
    let mut config = ProbeConfig::load(cli.config.as_deref())?;
    if let Some(secs) = cli.timeout {
        config.strategy_timeout_secs = Some(secs);
    }
    if let Some(secs) = cli.browser_timeout {
        config.browser_timeout_secs = secs;
    }
    if let Some(bin) = &cli.browser {
        config.browser_binary = bin.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if cli.no_history {
        config.history = false;
    }
    Ok(config)
}

fn menu(orchestrator: &Orchestrator) -> String {
    let mut text =
        String::from("\nWhat method would you like to scrape your request URL with?\n");
    for (idx, name) in orchestrator.strategy_names().iter().enumerate() {
        text.push_str(&format!("{}. {}\n", idx + 1, name));
    }
    text.push_str(&format!("{}. All\n\n", orchestrator.len() + 1));
    text
}

fn prompt_selection(count: usize) -> Result<Selection> {
    loop {
        let answer = prompt("Enter the number corresponding to your choice: ")?;
        match Selection::parse(&answer, count) {
            Ok(selection) => return Ok(selection),
            Err(e) => println!("{e}\n"),
        }
    }
}

fn prompt(question: &str) -> Result<String> {
    print!("{question}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        bail!("no input on stdin");
    }
    Ok(line.trim().to_string())
}
