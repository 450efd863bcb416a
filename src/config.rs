//! Configuration loading and management.
//!
//! Configuration is loaded from multiple sources with the following
//! precedence (highest to lowest):
//!
//! 1. Command-line arguments
//! 2. `.query-sentinel.toml` in current directory
//! 3. `~/.config/query-sentinel/config.toml`
//! 4. Default values
//!
//! # Configuration File Format
//!
//! ```toml
//! [thresholds]
//! full_scan_critical_rows = 10000
//! deep_loop_warn_depth = 4
//! quadratic_loop_threshold = 10000
//! stale_stats_drift = 10.0
//! limit_ineffective_ratio = 1000
//!
//! [rules]
//! disabled = ["weedout"]
//!
//! [profiler]
//! slow_query_ms = 500.0
//! n_plus_one_threshold = 5
//! driver_timeout_ms = 5000
//! ```

use std::{env, fs, path::PathBuf};

use serde::Deserialize;

use crate::error::{AppResult, config_error};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub rules:      RulesConfig,
    #[serde(default)]
    pub profiler:   ProfilerConfig
}

/// Rule thresholds.
///
/// Every rule takes its thresholds at construction, so tests can inject
/// custom values without touching global state.
#[derive(Debug, Clone, Deserialize)]
pub struct Thresholds {
    /// Rows examined at which a full table scan escalates to critical
    #[serde(default = "default_full_scan_critical_rows")]
    pub full_scan_critical_rows: u64,
    /// Nested-loop depth that triggers a warning (critical two levels above)
    #[serde(default = "default_deep_loop_warn_depth")]
    pub deep_loop_warn_depth: u32,
    /// Loop count at which quadratic complexity becomes critical
    #[serde(default = "default_quadratic_loop_threshold")]
    pub quadratic_loop_threshold: u64,
    /// Actual/estimated row drift factor that flags stale statistics
    #[serde(default = "default_stale_stats_drift")]
    pub stale_stats_drift: f64,
    /// Examined-to-returned ratio that flags an ineffective LIMIT
    #[serde(default = "default_limit_ineffective_ratio")]
    pub limit_ineffective_ratio: u64
}

fn default_full_scan_critical_rows() -> u64 {
    10_000
}

fn default_deep_loop_warn_depth() -> u32 {
    4
}

fn default_quadratic_loop_threshold() -> u64 {
    10_000
}

fn default_stale_stats_drift() -> f64 {
    10.0
}

fn default_limit_ineffective_ratio() -> u64 {
    1000
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            full_scan_critical_rows:  default_full_scan_critical_rows(),
            deep_loop_warn_depth:     default_deep_loop_warn_depth(),
            quadratic_loop_threshold: default_quadratic_loop_threshold(),
            stale_stats_drift:        default_stale_stats_drift(),
            limit_ineffective_ratio:  default_limit_ineffective_ratio()
        }
    }
}

/// Rules configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RulesConfig {
    /// Disabled rule categories (stable slugs, e.g. "weedout")
    #[serde(default)]
    pub disabled: Vec<String>
}

/// Profiler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProfilerConfig {
    /// Elapsed milliseconds above which a capture counts as slow
    #[serde(default = "default_slow_query_ms")]
    pub slow_query_ms: f64,
    /// Identical normalized queries in one batch that flag an N+1 pattern
    #[serde(default = "default_n_plus_one_threshold")]
    pub n_plus_one_threshold: usize,
    /// Milliseconds to wait for the driver's EXPLAIN before giving up
    #[serde(default = "default_driver_timeout_ms")]
    pub driver_timeout_ms: u64,
    /// Global logging threshold for the capture hook, 0 logs everything
    #[serde(default)]
    pub global_log_threshold_ms: f64
}

fn default_slow_query_ms() -> f64 {
    500.0
}

fn default_n_plus_one_threshold() -> usize {
    5
}

fn default_driver_timeout_ms() -> u64 {
    5000
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            slow_query_ms:           default_slow_query_ms(),
            n_plus_one_threshold:    default_n_plus_one_threshold(),
            driver_timeout_ms:       default_driver_timeout_ms(),
            global_log_threshold_ms: 0.0
        }
    }
}

impl Config {
    /// Load configuration from files
    ///
    /// Priority (highest to lowest):
    /// 1. Config file in current directory (.query-sentinel.toml)
    /// 2. Config file in home directory (~/.config/query-sentinel/config.toml)
    /// 3. Default values
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(home) = env::var_os("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("query-sentinel")
                .join("config.toml");

            if home_config.exists() {
                let content = fs::read_to_string(&home_config)
                    .map_err(|e| config_error(format!("Failed to read config file: {}", e)))?;
                config = toml::from_str(&content)
                    .map_err(|e| config_error(format!("Invalid config file: {}", e)))?;
            }
        }

        let local_config = PathBuf::from(".query-sentinel.toml");
        if local_config.exists() {
            let content = fs::read_to_string(&local_config)
                .map_err(|e| config_error(format!("Failed to read config file: {}", e)))?;
            config = toml::from_str(&content)
                .map_err(|e| config_error(format!("Invalid config file: {}", e)))?;
        }

        Ok(config)
    }
}
