//! Integration tests for CLI argument handling
//!
//! Invalid arguments must be rejected before the terminal is taken over, so
//! these run the real binary and inspect its exit status and stderr.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_hostpilot"))
        .args(args)
        .env_remove("HOSTPILOT_API_URL")
        .env_remove("HOSTPILOT_SESSION")
        .env_remove("HOSTPILOT_LOG")
        .output()
        .expect("Failed to execute hostpilot")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hostpilot"), "Help should mention hostpilot");
    assert!(stdout.contains("api-url"), "Help should mention --api-url flag");
    assert!(
        stdout.contains("refetch-interval"),
        "Help should mention --refetch-interval flag"
    );
}

#[test]
fn test_version_flag_exits_successfully() {
    let output = run_cli(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_invalid_api_url_prints_error_and_exits() {
    let output = run_cli(&["--api-url", "not-a-url"]);
    assert!(!output.status.success(), "Expected invalid URL to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid API URL"),
        "Should print error message about the URL: {}",
        stderr
    );
}

#[test]
fn test_invalid_log_level_prints_error_and_exits() {
    let output = run_cli(&["--log-level", "hostpilot=loudest"]);
    assert!(!output.status.success(), "Expected invalid filter to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid log level"),
        "Should print error message about the log level: {}",
        stderr
    );
}

#[test]
fn test_non_numeric_interval_is_rejected_by_clap() {
    let output = run_cli(&["--refetch-interval", "soon"]);
    assert!(!output.status.success());
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use hostpilot::cli::{Cli, StartupConfig};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_cli_explicit_flags() {
        let cli = Cli::parse_from([
            "hostpilot",
            "--api-url",
            "https://app.hostpilot.pro/",
            "--session",
            "s%3Aabc",
            "--refetch-interval",
            "30",
            "--log-file",
            "/tmp/hostpilot-test.log",
            "--log-level",
            "hostpilot=debug",
        ]);
        let config = StartupConfig::from_cli(&cli).unwrap();

        assert_eq!(config.api_url, "https://app.hostpilot.pro");
        assert_eq!(config.session.as_deref(), Some("s%3Aabc"));
        assert_eq!(config.refetch_interval, Some(Duration::from_secs(30)));
        assert_eq!(
            config.log_file,
            Some(PathBuf::from("/tmp/hostpilot-test.log"))
        );
        assert_eq!(config.log_level, "hostpilot=debug");
    }

    #[test]
    fn test_startup_config_rejects_non_http_scheme() {
        let cli = Cli::parse_from(["hostpilot", "--api-url", "file:///etc/passwd"]);
        let err = StartupConfig::from_cli(&cli).unwrap_err();
        assert!(err.to_string().contains("Invalid API URL"));
    }

    #[test]
    fn test_sweep_interval_flag() {
        let cli = Cli::parse_from([
            "hostpilot",
            "--api-url",
            "http://localhost:5000",
            "--sweep-interval",
            "45",
        ]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert!(config.refresh.enabled);
        assert_eq!(config.refresh.sweep_interval, Duration::from_secs(45));
    }
}
