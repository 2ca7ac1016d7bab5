// Kappa Server
//
// Multi-tenant database server speaking SKL over certificate-authenticated SSH

mod config;
mod lifecycle;
mod logging;

use anyhow::Result;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = match config::ServerConfig::from_file("config.toml") {
        Ok(cfg) => cfg,
        Err(_) => {
            eprintln!("Warning: config.toml not found, using defaults");
            let mut cfg = config::ServerConfig::default();
            cfg.apply_env_overrides()?;
            cfg.validate()?;
            cfg
        }
    };

    // Initialize logging
    logging::init_logging(
        &config.logging.level,
        &config.logging.file_path,
        config.logging.log_to_console,
    )?;

    info!(
        "Starting Kappa Server v{} bind={}",
        env!("CARGO_PKG_VERSION"),
        config.server.bind
    );

    lifecycle::run(config).await
}
