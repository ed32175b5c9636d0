mod config;
mod ip;
mod provider;
mod updater;

#[cfg(test)]
mod test_support;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::{error, info};

use crate::config::{Config, ConfigError, DEFAULT_LOG_LEVEL};
use crate::ip::IpResolver;
use crate::provider::aliyun::AliyunDns;
use crate::updater::Updater;

#[derive(Parser, Debug)]
#[command(name = "alidns-ddns")]
#[command(about = "Keep Alibaba Cloud DNS A records pointed at this host's public IP")]
struct Args {
    /// Optional TOML configuration file; environment variables override it
    #[arg(short, long)]
    config: Option<String>,

    /// Re-check every N seconds instead of running once
    #[arg(short, long)]
    interval: Option<u64>,
}

/// `RUST_LOG` takes precedence over the configured level.
fn init_logger(level: &str) {
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
}

/// `Ok(None)` when no subdomains are configured; nothing else gets built then.
fn load_config(path: Option<&str>) -> Result<Option<Config>> {
    let loaded = match path {
        Some(path) => Config::load(path),
        None => Config::from_env().map_err(Into::into),
    };

    match loaded {
        Ok(config) => Ok(Some(config)),
        Err(e) if matches!(e.downcast_ref::<ConfigError>(), Some(ConfigError::NoSubdomains)) => {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Load configuration first (before logger init)
    let Some(config) = load_config(args.config.as_deref())? else {
        init_logger(DEFAULT_LOG_LEVEL);
        error!("{}", ConfigError::NoSubdomains);
        return Ok(());
    };

    init_logger(&config.log_level);

    info!(
        "Managing {} subdomain(s) of {}: {:?}",
        config.subdomains.len(),
        config.domain_name,
        config.subdomains
    );

    let updater = Updater::new(IpResolver::new()?, AliyunDns::new(&config)?);

    loop {
        if let Some(summary) = updater.run(&config.subdomains).await {
            info!(
                "Run finished: {} updated, {} unchanged, {} skipped, {} failed",
                summary.updated, summary.unchanged, summary.skipped, summary.failed
            );
        }

        match args.interval {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => break,
        }
    }

    Ok(())
}
