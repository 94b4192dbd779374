mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use harvest_engine::{
    ChromiumDriver, ExportSummary, HarvestConfig, HarvestError, Harvester, PaginationVariant,
};
use harvest_logging::{harvest_error, harvest_info};
use log::LevelFilter;

use crate::logging::LogDestination;

/// Harvest every page of the listing portal into one delimited file.
#[derive(Debug, Parser)]
#[command(name = "listing_harvester", version)]
struct Cli {
    /// Run configuration (.json or .ron).
    #[arg(short, long)]
    config: PathBuf,

    /// Export path; overrides `export.path`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pagination mechanism: url_parameter, index_click or page_size_submit.
    #[arg(long)]
    variant: Option<PaginationVariant>,

    #[arg(long)]
    max_pages: Option<u32>,

    /// Abort the whole run after this many seconds.
    #[arg(long, default_value_t = 1800)]
    timeout_secs: u64,

    #[arg(long, value_enum, default_value_t = LogDestination::Both)]
    log: LogDestination,

    #[arg(long, default_value = "harvest.log")]
    log_file: PathBuf,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,

    /// Show the browser window.
    #[arg(long)]
    headful: bool,
}

impl Cli {
    fn load_config(&self) -> Result<HarvestConfig> {
        let mut config = HarvestConfig::load(&self.config)
            .with_context(|| format!("loading {}", self.config.display()))?;
        if let Some(output) = &self.output {
            config.export.path = output.clone();
        }
        if let Some(variant) = self.variant {
            config.pagination.variant = variant;
        }
        if let Some(max_pages) = self.max_pages {
            config.pagination.max_pages = max_pages;
        }
        if self.headful {
            config.browser.headless = false;
        }
        config.validate().context("validating overrides")?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(cli.log, &cli.log_file, level);

    match run(&cli).await {
        Ok(summary) => {
            harvest_info!(
                "Exported {} rows to {}",
                summary.row_count,
                summary.output_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            harvest_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<ExportSummary> {
    let config = cli.load_config()?;
    harvest_info!(
        "Harvesting {} as {} ({:?} pagination, at most {} pages)",
        config.site.listing_url,
        config.login.username,
        config.pagination.variant,
        config.pagination.max_pages
    );

    let driver = ChromiumDriver::launch(&config.browser, config.timeouts.navigation())
        .await
        .map_err(HarvestError::Driver)?;

    let harvester = Harvester::new(config);
    let mut options = harvester.export_options().clone();
    options.exported_utc = Arc::new(|| chrono::Utc::now().to_rfc3339());
    let harvester = harvester.with_export_options(options);

    let limit = Duration::from_secs(cli.timeout_secs);
    let summary = tokio::time::timeout(limit, harvester.run(Box::new(driver)))
        .await
        .with_context(|| format!("harvest did not finish within {limit:?}"))??;
    Ok(summary)
}
