use clap::Parser;
use overview_hub::{
    actors::retention::RetentionHandle,
    api::{ApiConfig, ApiState, spawn_api_server},
    config::{Config, read_config_file},
    store::ComponentStore,
    util::parse_log_level,
};
use std::time::Duration;
use tracing::{debug, error, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (JSON); defaults apply when omitted
    #[arg(short)]
    file: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init(level: LevelFilter) {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_targets(vec![
        ("overview_hub", level),
        ("hub", level),
        ("tower_http", level),
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

    let config = match &args.file {
        Some(path) => read_config_file(path)?,
        None => {
            debug!("no config file given, using defaults");
            Config::default()
        }
    };

    let backend = config.storage.open().await?;
    let store = ComponentStore::new(backend, config.store_settings());

    let retention = RetentionHandle::spawn(store.clone(), config.retention_settings());

    let api_config = ApiConfig {
        bind_addr: config.bind,
        enable_cors: config.enable_cors,
        request_timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
    };
    let addr = spawn_api_server(api_config, ApiState::new(store.clone(), retention.clone())).await?;
    info!("hub ready on {}", addr);

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    if let Err(e) = retention.shutdown().await {
        error!("failed to stop retention actor: {e}");
    }
    if let Err(e) = store.close().await {
        error!("failed to close storage: {e}");
    }

    Ok(())
}
