// Configuration module
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// SSH listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Listen address for the SSH server
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Accept timeout granularity in seconds; bounds shutdown latency
    #[serde(default = "default_accept_deadline")]
    pub accept_deadline_secs: u64,
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory holding the metadata database
    #[serde(default = "default_data_path")]
    pub data_path: String,
}

/// Key and certificate material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Private host key the server identifies with
    #[serde(default = "default_ssh_key")]
    pub ssh_key: String,

    /// OpenSSH certificate for the admin account
    #[serde(default = "default_admin_cert")]
    pub admin_cert: String,

    /// Trusted root public key the admin certificate must be signed by
    #[serde(default = "default_ca_cert")]
    pub ca_cert: String,

    /// Clock skew tolerated when validating certificates, in seconds
    #[serde(default = "default_clock_skew")]
    pub clock_skew_secs: u64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_file")]
    pub file_path: String,
    #[serde(default = "default_true")]
    pub log_to_console: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            accept_deadline_secs: default_accept_deadline(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            ssh_key: default_ssh_key(),
            admin_cert: default_admin_cert(),
            ca_cert: default_ca_cert(),
            clock_skew_secs: default_clock_skew(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: default_log_file(),
            log_to_console: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            storage: StorageSettings::default(),
            auth: AuthSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

// Default value functions
fn default_bind() -> String {
    "0.0.0.0:9022".to_string()
}

fn default_accept_deadline() -> u64 {
    1
}

fn default_data_path() -> String {
    "./data".to_string()
}

fn default_ssh_key() -> String {
    "ssh-identity.key".to_string()
}

fn default_admin_cert() -> String {
    "admin-cert.pub".to_string()
}

fn default_ca_cert() -> String {
    "ca.pub".to_string()
}

fn default_clock_skew() -> u64 {
    600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "./logs/kappa.log".to_string()
}

fn default_true() -> bool {
    true
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let mut config: ServerConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - KAPPA_BIND: Override server.bind
    /// - KAPPA_DATA_DIR: Override storage.data_path
    /// - KAPPA_SSH_KEY: Override auth.ssh_key
    /// - KAPPA_ADMIN_CERT: Override auth.admin_cert
    /// - KAPPA_CA_CERT: Override auth.ca_cert
    /// - KAPPA_LOG_LEVEL: Override logging.level
    /// - KAPPA_LOG_FILE: Override logging.file_path
    /// - KAPPA_LOG_TO_CONSOLE: Override logging.log_to_console
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        use std::env;

        if let Ok(bind) = env::var("KAPPA_BIND") {
            self.server.bind = bind;
        }
        if let Ok(path) = env::var("KAPPA_DATA_DIR") {
            self.storage.data_path = path;
        }
        if let Ok(path) = env::var("KAPPA_SSH_KEY") {
            self.auth.ssh_key = path;
        }
        if let Ok(path) = env::var("KAPPA_ADMIN_CERT") {
            self.auth.admin_cert = path;
        }
        if let Ok(path) = env::var("KAPPA_CA_CERT") {
            self.auth.ca_cert = path;
        }
        if let Ok(level) = env::var("KAPPA_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(path) = env::var("KAPPA_LOG_FILE") {
            self.logging.file_path = path;
        }
        if let Ok(val) = env::var("KAPPA_LOG_TO_CONSOLE") {
            self.logging.log_to_console =
                val.to_lowercase() == "true" || val == "1" || val.to_lowercase() == "yes";
        }

        Ok(())
    }

    /// Validate configuration settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.bind.is_empty() {
            return Err(anyhow::anyhow!("SSH bind address cannot be empty"));
        }

        if self.server.accept_deadline_secs == 0 {
            return Err(anyhow::anyhow!("accept_deadline_secs cannot be 0"));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            ));
        }

        Ok(())
    }
}
