use std::time::Duration;

use clap::Parser;
use overview_hub::{
    agent::{ReportTarget, Reporter, Thresholds, build_report, sample_host},
    util::{get_api_url, parse_log_level},
};
use regex::Regex;
use tracing::{error, info, instrument, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(about = "Reports this host's CPU, memory and disk usage to an overview hub")]
struct Args {
    /// Ingestion endpoint (default: $OVERVIEW_API_URL or http://localhost:5000/api/components)
    #[arg(long)]
    api_url: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Usage percentage that flags a warning
    #[arg(long, default_value_t = 85.0)]
    threshold_warning: f64,

    /// Usage percentage that flags an error
    #[arg(long, default_value_t = 95.0)]
    threshold_error: f64,

    #[arg(long, default_value = "Monitoring")]
    system_name: String,

    #[arg(long, default_value = "Workstations")]
    project_name: String,

    /// Seconds after which the hub marks this host offline
    #[arg(long)]
    ttl: Option<u64>,

    /// Regex of mount points to skip (repeatable)
    #[arg(long = "ignore-mount")]
    ignore_mounts: Vec<String>,

    /// Report every N seconds instead of once
    #[arg(long)]
    interval: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init(level: LevelFilter) {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_targets(vec![
        ("overview_hub", level),
        ("agent", level),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init(parse_log_level(&args.log_level));
    trace!("started with args: {args:?}");

    let ignore_mounts = args
        .ignore_mounts
        .iter()
        .map(|pattern| Regex::new(pattern))
        .collect::<Result<Vec<_>, _>>()?;

    let url = args.api_url.clone().unwrap_or_else(get_api_url);
    let reporter = Reporter::new(url, Duration::from_secs(args.timeout))?;
    let thresholds = Thresholds {
        warning: args.threshold_warning,
        error: args.threshold_error,
    };
    let target = ReportTarget {
        system_name: args.system_name.clone(),
        project_name: args.project_name.clone(),
        ttl: args.ttl,
    };

    let Some(interval) = args.interval else {
        return report_once(&reporter, &thresholds, &target, &ignore_mounts).await;
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    loop {
        ticker.tick().await;
        if let Err(e) = report_once(&reporter, &thresholds, &target, &ignore_mounts).await {
            error!("{e}");
        }
    }
}

#[instrument(skip_all)]
async fn report_once(
    reporter: &Reporter,
    thresholds: &Thresholds,
    target: &ReportTarget,
    ignore_mounts: &[Regex],
) -> anyhow::Result<()> {
    let patterns = ignore_mounts.to_vec();
    let sample = tokio::task::spawn_blocking(move || sample_host(&patterns)).await?;
    trace!("sampled host: {sample:?}");

    let report = build_report(&sample, thresholds, target);
    let status = reporter.send(&report).await?;
    info!("reported {} ({})", sample.host_name, status);

    Ok(())
}
