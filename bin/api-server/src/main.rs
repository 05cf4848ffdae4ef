//! API server binary

use std::{net::SocketAddr, time::Duration};

use clap::Parser;
use clickhouse_lib::ClickhouseReader;
use config::Opts;
use dotenvy::dotenv;
use tracing_subscriber::filter::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv().ok();
    let opts = Opts::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let client = ClickhouseReader::new(
        opts.clickhouse.url,
        opts.clickhouse.db,
        opts.clickhouse.username,
        opts.clickhouse.password,
    )?;

    let addr: SocketAddr = format!("{}:{}", opts.api.host, opts.api.port).parse()?;
    server::run(
        addr,
        client,
        opts.api.allowed_origins,
        opts.api.rate_limit_max_requests,
        Duration::from_secs(opts.api.rate_limit_period_secs),
        Duration::from_secs(opts.cache.ttl_secs),
        opts.cache.max_entries,
    )
    .await
}
