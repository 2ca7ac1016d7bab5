//! Server bootstrap and graceful shutdown.
//!
//! Encapsulates the startup sequence: data directory, metadata store, host
//! key, admin certificate and trusted root, and the SSH server itself. Any
//! failure here is fatal by design.

use crate::config::ServerConfig;
use anyhow::{Context, Result};
use kappa_commons::META_DB;
use kappa_datamodel::System;
use kappa_ssh::{SshServer, SshServerOptions};
use log::info;
use ssh_key::{Certificate, PublicKey};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Builds a configured, admin-seeded SSH server.
pub fn bootstrap(config: &ServerConfig) -> Result<SshServer> {
    // Create data directory
    let data_path = Path::new(&config.storage.data_path);
    fs::create_dir_all(data_path)
        .with_context(|| format!("could not create data directory {:?}", data_path))?;

    // Connect to database
    let db_path = data_path.join(META_DB);
    info!("connecting to database file={}", db_path.display());
    let system = System::open(&db_path).context("could not open metadata database")?;

    // Host key
    info!("reading private key file={}", config.auth.ssh_key);
    let host_key = russh::keys::load_secret_key(&config.auth.ssh_key, None)
        .with_context(|| format!("could not read host key {:?}", config.auth.ssh_key))?;

    // Admin certificate
    info!("reading admin certificate file={}", config.auth.admin_cert);
    let admin_cert = fs::read_to_string(&config.auth.admin_cert)
        .with_context(|| format!("admin certificate could not be read {:?}", config.auth.admin_cert))
        .and_then(|text| {
            Certificate::from_openssh(&text).context("admin certificate could not be parsed")
        })?;

    // Trusted root
    info!("reading root certificate file={}", config.auth.ca_cert);
    let ca_key = fs::read_to_string(&config.auth.ca_cert)
        .with_context(|| format!("root certificate could not be read {:?}", config.auth.ca_cert))
        .and_then(|text| {
            PublicKey::from_openssh(&text).context("root certificate could not be parsed")
        })?;

    let options = SshServerOptions {
        bind: config.server.bind.clone(),
        deadline: Duration::from_secs(config.server.accept_deadline_secs),
        host_key,
        admin_cert,
        ca_key,
        clock_skew: Duration::from_secs(config.auth.clock_skew_secs),
    };

    // Seeds the admin account; failure is fatal.
    SshServer::new(options, system).context("SSH server could not be configured")
}

/// Runs the server until ctrl-c, then shuts it down.
pub async fn run(config: ServerConfig) -> Result<()> {
    let mut server = bootstrap(&config)?;
    server.start().await?;

    info!("ready to serve requests");
    tokio::signal::ctrl_c()
        .await
        .context("could not listen for shutdown signal")?;

    info!("shutting down servers");
    server.stop().await;
    Ok(())
}
