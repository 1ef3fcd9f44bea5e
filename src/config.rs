use clap::Parser;
use std::time::Duration;

/// Klaviyo Health Scanner: simulated Shopify/Klaviyo integration diagnostics.
#[derive(Parser, Debug, Clone)]
#[command(name = "klaviyo-health-scanner")]
pub struct CliArgs {
    /// HTTP port
    #[arg(long = "port", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Listen address
    #[arg(long = "bind", default_value = DEFAULT_BIND)]
    pub bind: String,

    /// Scan progress tick period in milliseconds
    #[arg(long = "tick-interval-ms", default_value_t = SCAN_TICK_INTERVAL_MS)]
    pub tick_interval_ms: u64,

    /// Upper bound of the random per-tick stage increment (percent points)
    #[arg(long = "max-increment", default_value_t = MAX_TICK_INCREMENT)]
    pub max_increment: u8,

    /// Delay between scan completion and the switch to the results screen
    #[arg(long = "redirect-delay-ms", default_value_t = REDIRECT_DELAY_MS)]
    pub redirect_delay_ms: u64,

    /// Simulated store reachability round trip in milliseconds
    #[arg(long = "url-check-delay-ms", default_value_t = URL_CHECK_DELAY_MS)]
    pub url_check_delay_ms: u64,

    /// Report generation tick period in milliseconds
    #[arg(long = "report-tick-interval-ms", default_value_t = REPORT_TICK_INTERVAL_MS)]
    pub report_tick_interval_ms: u64,

    /// Drop sessions idle for this many seconds (0 keeps them forever)
    #[arg(long = "session-ttl-secs", default_value_t = SESSION_TTL_SECS)]
    pub session_ttl_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub port: u16,
    pub bind: String,
    pub timings: Timings,
    pub max_increment: u8,
    pub session_ttl: Option<Duration>,
}

/// Every timer the simulation uses, in one place so tests can shrink them.
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    pub scan_tick: Duration,
    pub report_tick: Duration,
    pub redirect_delay: Duration,
    pub url_check_delay: Duration,
}

// Server defaults
pub const DEFAULT_PORT: u16 = 9880;
pub const DEFAULT_BIND: &str = "127.0.0.1";

// Progress engine constants
pub const SCAN_TICK_INTERVAL_MS: u64 = 2000;
pub const REPORT_TICK_INTERVAL_MS: u64 = 500;
pub const MAX_TICK_INCREMENT: u8 = 15;
pub const MIN_TICK_INCREMENT: u8 = 1;
pub const STAGE_SEED_PERCENT: u8 = 5;
pub const SCAN_INITIAL_ESTIMATE_SECS: u64 = 180;
pub const REPORT_INITIAL_ESTIMATE_SECS: u64 = 35;
pub const RUN_EVENT_CHANNEL_SIZE: usize = 64;

// Navigation timers
pub const REDIRECT_DELAY_MS: u64 = 3000;
pub const URL_CHECK_DELAY_MS: u64 = 1000;

// Setup screen
pub const SECONDS_PER_TEST_ESTIMATE: f64 = 150.0; // 2.5 minutes
pub const HANDOFF_STORAGE_KEY: &str = "klaviyo-scan-config";

// Store URL check: any URL containing one of these is treated as unreachable.
pub const UNREACHABLE_STORE_MARKERS: &[&str] = &["invalid", "test-fail"];

// Report
pub const REPORT_FILE_PREFIX: &str = "klaviyo-diagnostic-report-";
pub const REPORT_MEDIA_TYPE: &str = "application/pdf";

// Sessions
pub const SESSION_TTL_SECS: u64 = 3600;
pub const SESSION_SWEEP_MIN_INTERVAL_SECS: u64 = 1;

// Activity log
pub const LOG_BUFFER_SIZE: usize = 500;

impl ScannerConfig {
    pub fn from_args(args: CliArgs) -> Self {
        ScannerConfig {
            port: args.port,
            bind: args.bind,
            timings: Timings {
                scan_tick: Duration::from_millis(args.tick_interval_ms.max(1)),
                report_tick: Duration::from_millis(args.report_tick_interval_ms.max(1)),
                redirect_delay: Duration::from_millis(args.redirect_delay_ms),
                url_check_delay: Duration::from_millis(args.url_check_delay_ms),
            },
            max_increment: args.max_increment.max(MIN_TICK_INCREMENT),
            session_ttl: (args.session_ttl_secs > 0)
                .then(|| Duration::from_secs(args.session_ttl_secs)),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            scan_tick: Duration::from_millis(SCAN_TICK_INTERVAL_MS),
            report_tick: Duration::from_millis(REPORT_TICK_INTERVAL_MS),
            redirect_delay: Duration::from_millis(REDIRECT_DELAY_MS),
            url_check_delay: Duration::from_millis(URL_CHECK_DELAY_MS),
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            timings: Timings::default(),
            max_increment: MAX_TICK_INCREMENT,
            session_ttl: Some(Duration::from_secs(SESSION_TTL_SECS)),
        }
    }
}
