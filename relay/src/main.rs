// File: relay/src/main.rs
use anyhow::Result;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use relay::constants::defaults;

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("relay=info".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("suppaftp=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    let working_folder = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(defaults::WORKING_FOLDER));

    info!(
        "Starting game server relay in {}",
        working_folder.display()
    );

    if let Err(e) = relay::app::run(&working_folder).await {
        error!("Relay terminated: {}", e);
        return Err(e);
    }

    Ok(())
}
