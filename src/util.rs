use tracing::level_filters::LevelFilter;

const OVERVIEW_API_URL: &str = "OVERVIEW_API_URL";

const DEFAULT_API_URL: &str = "http://localhost:5000/api/components";

/// Ingestion endpoint the agent reports to, from `OVERVIEW_API_URL` if set
pub fn get_api_url() -> String {
    std::env::var(OVERVIEW_API_URL)
        .ok()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// Parse a `--log-level` value, falling back to `info`
pub fn parse_log_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::INFO)
}
