//! Command-line interface parsing for the HostPilot dashboard
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! a validated `StartupConfig`. Every flag can also come from the environment
//! (or a `.env` file loaded before parsing).

use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::api::DEFAULT_BASE_URL;
use crate::refresh::RefreshConfig;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The API URL could not be parsed or is not http(s)
    #[error("Invalid API URL: '{0}'. Expected something like http://localhost:5000")]
    InvalidApiUrl(String),

    /// The log filter could not be parsed
    #[error("Invalid log level: '{0}'. Try one of: error, warn, info, debug, trace")]
    InvalidLogLevel(String),
}

/// HostPilot dashboard - live property management overview in the terminal
#[derive(Parser, Debug)]
#[command(name = "hostpilot")]
#[command(about = "HostPilot property management dashboard")]
#[command(version)]
pub struct Cli {
    /// Base URL of the HostPilot API
    #[arg(long, env = "HOSTPILOT_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Session cookie value to authenticate with
    #[arg(long, env = "HOSTPILOT_SESSION", hide_env_values = true)]
    pub session: Option<String>,

    /// Seconds between background revalidations of each panel (0 disables)
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub refetch_interval: u64,

    /// Seconds between sweeps of expired cache entries (0 disables)
    #[arg(long, value_name = "SECS", default_value_t = 300)]
    pub sweep_interval: u64,

    /// Where to write logs (defaults to the user cache directory)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log filter, e.g. "info" or "hostpilot=debug"
    #[arg(long, env = "HOSTPILOT_LOG", default_value = "info")]
    pub log_level: String,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Base URL requests are issued against
    pub api_url: String,
    /// Session cookie, if any
    pub session: Option<String>,
    /// Background revalidation period per panel
    pub refetch_interval: Option<Duration>,
    /// Background sweep settings
    pub refresh: RefreshConfig,
    /// Explicit log file path
    pub log_file: Option<PathBuf>,
    /// Validated log filter directive
    pub log_level: String,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            session: None,
            refetch_interval: Some(Duration::from_secs(60)),
            refresh: RefreshConfig::default(),
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

/// Checks that `s` is an absolute http(s) URL
pub fn parse_api_url(s: &str) -> Result<String, CliError> {
    let url = Url::parse(s).map_err(|_| CliError::InvalidApiUrl(s.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(s.trim_end_matches('/').to_string()),
        _ => Err(CliError::InvalidApiUrl(s.to_string())),
    }
}

/// Checks that `s` is a valid tracing filter directive
pub fn parse_log_level(s: &str) -> Result<String, CliError> {
    EnvFilter::try_new(s)
        .map(|_| s.to_string())
        .map_err(|_| CliError::InvalidLogLevel(s.to_string()))
}

fn seconds(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with validated settings
    /// * `Err(CliError)` if the URL or log filter is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let api_url = parse_api_url(&cli.api_url)?;
        let log_level = parse_log_level(&cli.log_level)?;

        let refresh = match seconds(cli.sweep_interval) {
            Some(sweep_interval) => RefreshConfig {
                sweep_interval,
                enabled: true,
            },
            None => RefreshConfig {
                enabled: false,
                ..RefreshConfig::default()
            },
        };

        Ok(StartupConfig {
            api_url,
            session: cli.session.clone().filter(|s| !s.is_empty()),
            refetch_interval: seconds(cli.refetch_interval),
            refresh,
            log_file: cli.log_file.clone(),
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_url_accepts_http_and_strips_slash() {
        assert_eq!(
            parse_api_url("http://localhost:5000/").unwrap(),
            "http://localhost:5000"
        );
        assert_eq!(
            parse_api_url("https://app.hostpilot.pro").unwrap(),
            "https://app.hostpilot.pro"
        );
    }

    #[test]
    fn test_parse_api_url_rejects_garbage_and_other_schemes() {
        let err = parse_api_url("not a url").unwrap_err();
        assert!(err.to_string().contains("Invalid API URL"));
        assert!(parse_api_url("ftp://example.com").is_err());
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug").unwrap(), "debug");
        assert!(parse_log_level("hostpilot=trace,warn").is_ok());
        assert!(parse_log_level("hostpilot=loudest").is_err());
    }

    #[test]
    fn test_startup_config_default() {
        let config = StartupConfig::default();
        assert_eq!(config.api_url, DEFAULT_BASE_URL);
        assert_eq!(config.refetch_interval, Some(Duration::from_secs(60)));
        assert!(config.refresh.enabled);
    }

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["hostpilot", "--api-url", "http://localhost:5000"]);
        let config = StartupConfig::from_cli(&cli).unwrap();

        assert_eq!(config.api_url, "http://localhost:5000");
        assert_eq!(config.refetch_interval, Some(Duration::from_secs(60)));
        assert_eq!(config.refresh.sweep_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_zero_intervals_disable_background_work() {
        let cli = Cli::parse_from([
            "hostpilot",
            "--api-url",
            "http://localhost:5000",
            "--refetch-interval",
            "0",
            "--sweep-interval",
            "0",
        ]);
        let config = StartupConfig::from_cli(&cli).unwrap();

        assert!(config.refetch_interval.is_none());
        assert!(!config.refresh.enabled);
    }

    #[test]
    fn test_empty_session_is_ignored() {
        let cli = Cli::parse_from([
            "hostpilot",
            "--api-url",
            "http://localhost:5000",
            "--session",
            "",
        ]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert!(config.session.is_none());
    }

    #[test]
    fn test_startup_config_from_cli_invalid_url() {
        let cli = Cli::parse_from(["hostpilot", "--api-url", "localhost"]);
        assert!(StartupConfig::from_cli(&cli).is_err());
    }
}
