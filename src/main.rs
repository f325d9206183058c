use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

use schoolhub::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().collect();
    if schoolhub::config::has_flag(&args, "--help") || schoolhub::config::has_flag(&args, "-h") {
        println!("Usage: schoolhub [--http-port <port>] [--latency <scale>] [--no-latency] [--token-ttl <secs>]");
        println!("Env: SCHOOLHUB_HTTP_PORT, SCHOOLHUB_MOCK_LATENCY, SCHOOLHUB_NO_LATENCY, SCHOOLHUB_TOKEN_TTL_SECS, RUST_LOG");
        return Ok(());
    }
    let cfg = ServerConfig::from_env_and_args(&args);

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "schoolhub",
        "schoolhub mock api starting: RUST_LOG='{}', http_port={}, latency_scale={}, token_ttl_secs={}",
        rust_log, cfg.port, cfg.latency_scale, cfg.token_ttl_secs
    );

    schoolhub::server::run_with_config(&cfg).await
}
