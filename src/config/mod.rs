use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of a student session in hours (default: 24)
    #[serde(default = "default_user_session_hours")]
    pub user_session_hours: i64,
    /// Lifetime of an admin session in hours (default: 8)
    #[serde(default = "default_admin_session_hours")]
    pub admin_session_hours: i64,
    /// Minimum accepted password length (default: 6)
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    #[serde(default = "default_user_cookie")]
    pub user_cookie_name: String,
    #[serde(default = "default_admin_cookie")]
    pub admin_cookie_name: String,
    /// Mark session cookies `Secure` (enable behind HTTPS)
    #[serde(default)]
    pub secure_cookies: bool,
    #[serde(default)]
    pub bootstrap: BootstrapAdminConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_session_hours: default_user_session_hours(),
            admin_session_hours: default_admin_session_hours(),
            min_password_length: default_min_password_length(),
            user_cookie_name: default_user_cookie(),
            admin_cookie_name: default_admin_cookie(),
            secure_cookies: false,
            bootstrap: BootstrapAdminConfig::default(),
        }
    }
}

fn default_user_session_hours() -> i64 {
    24
}

fn default_admin_session_hours() -> i64 {
    8
}

fn default_min_password_length() -> usize {
    6
}

fn default_user_cookie() -> String {
    "portal_session".to_string()
}

fn default_admin_cookie() -> String {
    "portal_admin_session".to_string()
}

/// First admin account, created only when no admin exists.
///
/// There is no built-in password: without one, startup skips the bootstrap
/// and the setup endpoint must be used instead.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdminConfig {
    #[serde(default = "default_bootstrap_username")]
    pub username: String,
    #[serde(default = "default_bootstrap_email")]
    pub email: String,
    #[serde(default = "default_bootstrap_full_name")]
    pub full_name: String,
    pub password: Option<String>,
}

impl Default for BootstrapAdminConfig {
    fn default() -> Self {
        Self {
            username: default_bootstrap_username(),
            email: default_bootstrap_email(),
            full_name: default_bootstrap_full_name(),
            password: None,
        }
    }
}

fn default_bootstrap_username() -> String {
    "admin".to_string()
}

fn default_bootstrap_email() -> String {
    "admin@portal.local".to_string()
}

fn default_bootstrap_full_name() -> String {
    "System Administrator".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionsConfig {
    /// Seconds between sweeps of expired session rows (0 disables the sweeper)
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Requests per window for general API endpoints
    #[serde(default = "default_api_requests")]
    pub api_requests_per_window: u32,
    /// Requests per window for login, registration and setup
    #[serde(default = "default_auth_requests")]
    pub auth_requests_per_window: u32,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    /// Seconds between purges of stale limiter entries
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_requests_per_window: default_api_requests(),
            auth_requests_per_window: default_auth_requests(),
            window_seconds: default_window_seconds(),
            cleanup_interval: default_cleanup_interval(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_api_requests() -> u32 {
    120
}

fn default_auth_requests() -> u32 {
    20
}

fn default_window_seconds() -> u64 {
    60
}

fn default_cleanup_interval() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Price of one course's assignment set
    #[serde(default = "default_fee_per_course")]
    pub fee_per_course: f64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            fee_per_course: default_fee_per_course(),
        }
    }
}

fn default_fee_per_course() -> f64 {
    10.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.auth.user_session_hours, 24);
        assert_eq!(config.auth.admin_session_hours, 8);
        assert_eq!(config.auth.min_password_length, 6);
        assert!(config.auth.bootstrap.password.is_none());
        assert_eq!(config.auth.user_cookie_name, "portal_session");
        assert_eq!(config.auth.admin_cookie_name, "portal_admin_session");
        assert!(config.rate_limit.enabled);
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8080

            [auth]
            admin_session_hours = 2

            [auth.bootstrap]
            username = "root"
            password = "first-run-secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.admin_session_hours, 2);
        assert_eq!(config.auth.user_session_hours, 24);
        assert_eq!(config.auth.bootstrap.username, "root");
        assert_eq!(config.auth.bootstrap.email, "admin@portal.local");
        assert_eq!(
            config.auth.bootstrap.password.as_deref(),
            Some("first-run-secret")
        );
        assert_eq!(config.catalog.fee_per_course, 10.0);
    }
}
