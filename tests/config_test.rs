use clap::Parser;
use std::time::Duration;

use klaviyo_health_scanner::config::*;

#[test]
fn test_default_timings() {
    assert_eq!(SCAN_TICK_INTERVAL_MS, 2000);
    assert_eq!(REDIRECT_DELAY_MS, 3000);
    assert_eq!(URL_CHECK_DELAY_MS, 1000);
    assert_eq!(MAX_TICK_INCREMENT, 15);
}

#[test]
fn test_handoff_and_artifact_constants() {
    assert_eq!(HANDOFF_STORAGE_KEY, "klaviyo-scan-config");
    assert_eq!(REPORT_FILE_PREFIX, "klaviyo-diagnostic-report-");
    assert_eq!(REPORT_MEDIA_TYPE, "application/pdf");
}

#[test]
fn test_cli_defaults() {
    let args = CliArgs::parse_from(["klaviyo-health-scanner"]);
    let config = ScannerConfig::from_args(args);

    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.listen_addr(), "127.0.0.1:9880");
    assert_eq!(config.timings.scan_tick, Duration::from_millis(2000));
    assert_eq!(config.timings.report_tick, Duration::from_millis(500));
    assert_eq!(config.max_increment, 15);
    assert_eq!(config.session_ttl, Some(Duration::from_secs(SESSION_TTL_SECS)));
}

#[test]
fn test_cli_overrides() {
    let args = CliArgs::parse_from([
        "klaviyo-health-scanner",
        "--port",
        "8080",
        "--bind",
        "0.0.0.0",
        "--tick-interval-ms",
        "50",
        "--max-increment",
        "40",
        "--redirect-delay-ms",
        "0",
    ]);
    let config = ScannerConfig::from_args(args);

    assert_eq!(config.listen_addr(), "0.0.0.0:8080");
    assert_eq!(config.timings.scan_tick, Duration::from_millis(50));
    assert_eq!(config.timings.redirect_delay, Duration::ZERO);
    assert_eq!(config.max_increment, 40);
}

#[test]
fn test_zero_values_are_clamped() {
    let args = CliArgs::parse_from([
        "klaviyo-health-scanner",
        "--tick-interval-ms",
        "0",
        "--max-increment",
        "0",
    ]);
    let config = ScannerConfig::from_args(args);

    assert_eq!(config.timings.scan_tick, Duration::from_millis(1));
    assert_eq!(config.max_increment, MIN_TICK_INCREMENT);
}

#[test]
fn test_zero_ttl_disables_session_expiry() {
    let args = CliArgs::parse_from(["klaviyo-health-scanner", "--session-ttl-secs", "0"]);
    assert!(ScannerConfig::from_args(args).session_ttl.is_none());

    let args = CliArgs::parse_from(["klaviyo-health-scanner", "--session-ttl-secs", "90"]);
    assert_eq!(
        ScannerConfig::from_args(args).session_ttl,
        Some(Duration::from_secs(90))
    );
}
