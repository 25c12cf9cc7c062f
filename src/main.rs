mod cli;

use clap::Parser;
use cli::{Cli, Commands, OutputFormat};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use m0use::{
    config::Config,
    error,
    ns::{NationApi, NsClient, ThrottledTransport},
    recruit::EligibilityScanner,
    utils::{self, normalize_name},
};
use std::{path::PathBuf, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            init_logging("info");
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.log.level);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling outstanding requests");
            interrupt.cancel();
        }
    });

    let result = match build_client(&config) {
        Ok(client) => match cli.command {
            Commands::Scan { region, from, exclude, format, concurrency } => {
                scan_region(&config, client, region, from, exclude, format, concurrency, &cancel).await
            }

            Commands::Members { region } => list_members(&config, client, region, &cancel).await,

            Commands::Check { nation, from } => check_nation(&config, client, &nation, from, &cancel).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("m0use={},warn", level)));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_client(config: &Config) -> error::Result<Arc<NsClient>> {
    let transport = ThrottledTransport::new(
        &config.user_agent,
        config.api.request_rate,
        config.request_timeout(),
    )?;

    Ok(Arc::new(NsClient::new(Arc::new(transport), &config.api.base_url)))
}

#[allow(clippy::too_many_arguments)]
async fn scan_region(
    config: &Config,
    client: Arc<NsClient>,
    region: Option<String>,
    from: Option<String>,
    exclude: Option<PathBuf>,
    format: OutputFormat,
    concurrency: Option<usize>,
    cancel: &CancellationToken,
) -> error::Result<()> {
    let source = region
        .map(|r| normalize_name(&r))
        .unwrap_or_else(|| config.region.clone());
    let target = from
        .map(|r| normalize_name(&r))
        .unwrap_or_else(|| source.clone());

    let excluded = match exclude {
        Some(path) => {
            let names = utils::read_name_list(&path)?;
            info!("Skipping {} cached nations", names.len());
            names
        }
        None => Vec::new(),
    };

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} nations")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let workers = concurrency
        .unwrap_or(config.api.concurrency)
        .min(config.api.request_rate as usize);
    let scanner = EligibilityScanner::new(client.clone())
        .with_concurrency(workers)
        .with_progress(bar);

    let outcome = scanner.scan(&target, &source, &excluded, cancel).await?;

    let snapshot = client.transport().snapshot().await;
    debug!(?snapshot, "Request budget after scan");

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        OutputFormat::Table => {
            if !outcome.eligible.is_empty() {
                println!("\n{}", format!("Nations accepting telegrams from {}:", target).yellow());
                utils::print_table_border(60);
                utils::print_table_row(&["#", "Nation"], &[6, 50]);
                utils::print_table_border(60);
                for (i, nation) in outcome.eligible.iter().enumerate() {
                    utils::print_table_row(&[(i + 1).to_string().as_str(), nation.as_str()], &[6, 50]);
                }
                utils::print_table_border(60);
            }

            if let Some(started_at) = &outcome.started_at {
                println!("Scan started: {}", utils::format_timestamp(started_at));
            }
            outcome.print_summary();
        }
    }

    Ok(())
}

async fn list_members(
    config: &Config,
    client: Arc<NsClient>,
    region: Option<String>,
    cancel: &CancellationToken,
) -> error::Result<()> {
    let region = region
        .map(|r| normalize_name(&r))
        .unwrap_or_else(|| config.region.clone());

    let members = client.region_members(&region, cancel).await?;

    println!("{}", format!("=== Nations in {} ===", region).cyan().bold());
    for member in &members {
        println!("{}", member);
    }
    println!("Total: {}", members.len().to_string().green());

    Ok(())
}

async fn check_nation(
    config: &Config,
    client: Arc<NsClient>,
    nation: &str,
    from: Option<String>,
    cancel: &CancellationToken,
) -> error::Result<()> {
    let from = from
        .map(|r| normalize_name(&r))
        .unwrap_or_else(|| config.region.clone());

    let status = client.eligibility(nation, &from, cancel).await?;

    println!("{}", format!("=== {} ===", status.member).cyan().bold());
    println!("Home region:        {}", status.home_region);
    println!("Lives in {}: {}", from, utils::format_flag(status.resides_in(&from)));
    println!("Accepts telegrams:  {}", utils::format_flag(status.can_receive));

    Ok(())
}
