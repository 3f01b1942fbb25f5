use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use rust_decimal::Decimal;

use crate::printing::{RouteOptions, RoutingMode};

/// Default per-glass deposit (Pfand) when nothing is stored yet
pub const DEFAULT_DEPOSIT_PER_GLASS: Decimal = Decimal::from_parts(200, 0, 0, false, 2);

/// Venue lines printed at the top of customer receipts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueInfo {
    pub name: String,
    pub subtitle: String,
}

impl Default for VenueInfo {
    fn default() -> Self {
        Self {
            name: "Festkasse".into(),
            subtitle: String::new(),
        }
    }
}

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | Database and log directory |
/// | HTTP_PORT | 3444 | HTTP API port |
/// | PRINT_RELAY_URL | (unset) | Base URL of the print relay, printing to relay queues is off without it |
/// | PRINT_TIMEOUT_MS | 4000 | Timeout of a single print job |
/// | ROUTING_MODE | role | `role` or `category` |
/// | PRINT_UNPAID_RECEIPTS | false | Category routing: customer receipt for orders deferred to a tab |
/// | TIMEZONE | Europe/Berlin | Time zone for receipts, ToGo numbers and daily summaries |
/// | DEFAULT_DEPOSIT | 2,00 | Deposit per glass until one is stored |
/// | VENUE_NAME | Festkasse | First receipt header line |
/// | VENUE_SUBTITLE | (empty) | Second receipt header line |
/// | LOG_LEVEL | info | trace, debug, info, warn, error |
/// | LOG_DIR | (unset) | Daily rolling log files, only if the directory exists |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/srv/kasse PRINT_RELAY_URL=http://192.168.188.200:3444/api cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub http_port: u16,
    pub print_relay_url: Option<String>,
    pub print_timeout_ms: u64,
    pub routing_mode: RoutingMode,
    pub print_unpaid_receipts: bool,
    pub timezone: Tz,
    pub default_deposit: Decimal,
    pub venue: VenueInfo,
    pub log_level: String,
    pub log_dir: Option<String>,
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to their defaults.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_parse("HTTP_PORT").unwrap_or(3444),
            print_relay_url: env_non_empty("PRINT_RELAY_URL"),
            print_timeout_ms: env_parse("PRINT_TIMEOUT_MS").unwrap_or(4000),
            routing_mode: env_parse("ROUTING_MODE").unwrap_or_default(),
            print_unpaid_receipts: env_parse("PRINT_UNPAID_RECEIPTS").unwrap_or(false),
            timezone: env_parse("TIMEZONE").unwrap_or(chrono_tz::Europe::Berlin),
            default_deposit: env_non_empty("DEFAULT_DEPOSIT")
                .and_then(|v| shared::money::parse_amount(&v))
                .filter(|d| !d.is_sign_negative())
                .unwrap_or(DEFAULT_DEPOSIT_PER_GLASS),
            venue: VenueInfo {
                name: env_non_empty("VENUE_NAME").unwrap_or_else(|| VenueInfo::default().name),
                subtitle: std::env::var("VENUE_SUBTITLE").unwrap_or_default(),
            },
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: env_non_empty("LOG_DIR"),
        }
    }

    /// Override the values tests care about
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir)
            .join("database")
            .join("kasse.redb")
    }

    pub fn print_timeout(&self) -> Duration {
        Duration::from_millis(self.print_timeout_ms)
    }

    pub fn route_options(&self) -> RouteOptions {
        RouteOptions {
            customer_receipt_for_unpaid: self.print_unpaid_receipts,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: "./data".into(),
            http_port: 3444,
            print_relay_url: None,
            print_timeout_ms: 4000,
            routing_mode: RoutingMode::default(),
            print_unpaid_receipts: false,
            timezone: chrono_tz::Europe::Berlin,
            default_deposit: DEFAULT_DEPOSIT_PER_GLASS,
            venue: VenueInfo::default(),
            log_level: "info".into(),
            log_dir: None,
        }
    }
}
