use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analysis::{self, Analysis, DateWindow};
use crate::auth::Token;
use crate::collect::{CollectStats, Collector};
use crate::config::{self, AnalysisConfig, CollectConfig};
use crate::error;
use crate::providers::github::GitHubClient;

#[derive(Parser)]
#[command(name = "ci-job-stats")]
#[command(author, version, about = "CI job latency statistics", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory that relative input and output paths are resolved against
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect workflow runs and their jobs from GitHub Actions into a CSV table
    Collect(CollectArgs),

    /// Compute per-job duration statistics from a collected table
    Analyze(AnalyzeArgs),

    /// Collect, then analyze the freshly written table
    Run {
        #[command(flatten)]
        collect: CollectArgs,

        /// Report file path
        #[arg(long, env = "ANALYSIS_OUTPUT_PATH", default_value = "analysis.csv")]
        report: PathBuf,

        #[command(flatten)]
        window: WindowArgs,
    },
}

#[derive(Args)]
struct CollectArgs {
    /// Repository to collect from (e.g., "owner/name")
    #[arg(short, long, env = "COLLECT_GITHUB_REPO")]
    repo: String,

    /// GitHub API token (optional, required for private repositories)
    #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub API URL
    #[arg(long, default_value = "https://api.github.com")]
    api_url: String,

    /// Maximum number of run pages to fetch
    #[arg(long, env = "COLLECT_MAX_PAGES", default_value_t = 1)]
    max_pages: u32,

    /// Maximum number of runs whose jobs are fetched concurrently
    #[arg(long, env = "COLLECT_MAX_WORKERS", default_value_t = 10)]
    max_workers: usize,

    /// Runs per page
    #[arg(long, default_value_t = config::MAX_PER_PAGE)]
    per_page: u32,

    /// Job table file path
    #[arg(short, long, env = "COLLECT_OUTPUT_PATH", default_value = "runs.csv")]
    output: PathBuf,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Job table file path
    #[arg(short, long, env = "ANALYSIS_INPUT_PATH", default_value = "runs.csv")]
    input: PathBuf,

    /// Report file path
    #[arg(short, long, env = "ANALYSIS_OUTPUT_PATH", default_value = "analysis.csv")]
    output: PathBuf,

    #[command(flatten)]
    window: WindowArgs,
}

#[derive(Args)]
struct WindowArgs {
    /// Only analyze jobs started at or after this RFC 3339 time (needs --end-date)
    #[arg(long, env = "ANALYSIS_START_DATE")]
    start_date: Option<DateTime<Utc>>,

    /// Only analyze jobs started at or before this RFC 3339 time (needs --start-date)
    #[arg(long, env = "ANALYSIS_END_DATE")]
    end_date: Option<DateTime<Utc>>,
}

impl CollectArgs {
    fn to_config(&self) -> CollectConfig {
        CollectConfig {
            repo: self.repo.clone(),
            api_url: self.api_url.clone(),
            token: Token::non_empty(self.token.clone()),
            max_pages: self.max_pages,
            max_workers: self.max_workers,
            per_page: self.per_page,
            output: self.output.clone(),
        }
    }
}

impl WindowArgs {
    fn to_window(&self) -> DateWindow {
        DateWindow::new(self.start_date, self.end_date)
    }
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Collect(args) => {
                collect(args.to_config(), &self.data_dir).await?;
            }
            Commands::Analyze(args) => {
                let config = AnalysisConfig {
                    input: args.input.clone(),
                    output: args.output.clone(),
                    window: args.window.to_window(),
                };
                analyze(&config, &self.data_dir)?;
            }
            Commands::Run {
                collect: args,
                report,
                window,
            } => {
                let collect_config = args.to_config();
                let analysis_config = AnalysisConfig {
                    input: collect_config.output.clone(),
                    output: report.clone(),
                    window: window.to_window(),
                };
                analysis_config.validate()?;

                collect(collect_config, &self.data_dir).await?;
                analyze(&analysis_config, &self.data_dir)?;
            }
        }

        Ok(())
    }
}

fn create_output(path: &Path) -> error::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

async fn collect(config: CollectConfig, data_dir: &Path) -> error::Result<CollectStats> {
    config.validate()?;
    info!("Collecting workflow runs for repository: {}", config.repo);

    let output = config::resolve(data_dir, &config.output);
    let client = GitHubClient::new(&config.api_url, &config.repo, config.per_page, config.token)?;
    let sink = create_output(&output)?;

    let stats = Collector::new(Arc::new(client), config.max_pages, config.max_workers)
        .collect(sink)
        .await?;

    info!("Job table written to: {}", output.display());
    Ok(stats)
}

fn analyze(config: &AnalysisConfig, data_dir: &Path) -> error::Result<Analysis> {
    config.validate()?;

    let input = config::resolve(data_dir, &config.input);
    let output = config::resolve(data_dir, &config.output);
    info!("Analyzing job table: {}", input.display());

    let analysis = analysis::analyze(File::open(&input)?, &config.window)?;
    analysis::write_report(&analysis.rows, create_output(&output)?)?;

    info!(
        "Report with {} jobs written to: {} ({} malformed rows skipped, {} outside window)",
        analysis.rows.len(),
        output.display(),
        analysis.skipped_rows,
        analysis.filtered_rows
    );
    Ok(analysis)
}
