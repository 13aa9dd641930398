//! Runtime settings built from a [`ConfigPort`], validated up front.

use crate::domain::error::StockDataError;
use crate::domain::indicator::IndicatorSettings;
use crate::domain::style::{is_known_style, DEFAULT_STYLE};
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) stockscope/0.1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CHART_WIDTH: u32 = 900;
pub const DEFAULT_CHART_HEIGHT: u32 = 450;
const MIN_CHART_SIDE: i64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderSource {
    Yahoo,
    Csv,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub source: ProviderSource,
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub csv_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSettings {
    pub default_style: String,
    pub output_dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub indicators: IndicatorSettings,
    pub provider: ProviderSettings,
    pub chart: ChartSettings,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            source: ProviderSource::Yahoo,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            csv_dir: PathBuf::from("data"),
        }
    }
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            default_style: DEFAULT_STYLE.to_string(),
            output_dir: PathBuf::from("."),
            width: DEFAULT_CHART_WIDTH,
            height: DEFAULT_CHART_HEIGHT,
        }
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> StockDataError {
    StockDataError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Whole-number value for `key`, or `default` when the key is absent.
fn int_value(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, StockDataError> {
    match config.get_trimmed(section, key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| {
            invalid(
                section,
                key,
                format!("{} must be a whole number, got '{}'", key, raw),
            )
        }),
    }
}

fn positive_window(
    config: &dyn ConfigPort,
    key: &str,
    default: usize,
) -> Result<usize, StockDataError> {
    let value = int_value(config, "indicators", key, default as i64)?;
    if value <= 0 {
        return Err(invalid("indicators", key, format!("{} must be positive", key)));
    }
    Ok(value as usize)
}

fn chart_side(config: &dyn ConfigPort, key: &str, default: u32) -> Result<u32, StockDataError> {
    let value = int_value(config, "chart", key, default as i64)?;
    if !(MIN_CHART_SIDE..=10_000).contains(&value) {
        return Err(invalid(
            "chart",
            key,
            format!("{} must be between {} and 10000", key, MIN_CHART_SIDE),
        ));
    }
    Ok(value as u32)
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StockDataError> {
        let defaults = Settings::default();

        let indicators = IndicatorSettings {
            ma_window: positive_window(config, "ma_window", defaults.indicators.ma_window)?,
            rsi_window: positive_window(config, "rsi_window", defaults.indicators.rsi_window)?,
            macd_short: positive_window(config, "macd_short", defaults.indicators.macd_short)?,
            macd_long: positive_window(config, "macd_long", defaults.indicators.macd_long)?,
            macd_signal: positive_window(config, "macd_signal", defaults.indicators.macd_signal)?,
        };
        if indicators.macd_short >= indicators.macd_long {
            return Err(invalid(
                "indicators",
                "macd_short",
                "macd_short must be smaller than macd_long",
            ));
        }

        let source = match config
            .get_trimmed("provider", "source")
            .map(|s| s.to_lowercase())
            .as_deref()
        {
            None | Some("yahoo") => ProviderSource::Yahoo,
            Some("csv") => ProviderSource::Csv,
            Some(other) => {
                return Err(invalid(
                    "provider",
                    "source",
                    format!("unknown source '{}' (expected yahoo or csv)", other),
                ));
            }
        };

        let timeout = int_value(
            config,
            "provider",
            "timeout_secs",
            defaults.provider.timeout_secs as i64,
        )?;
        if timeout <= 0 {
            return Err(invalid(
                "provider",
                "timeout_secs",
                "timeout_secs must be positive",
            ));
        }

        let provider = ProviderSettings {
            source,
            base_url: config
                .get_trimmed("provider", "base_url")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.provider.base_url),
            timeout_secs: timeout as u64,
            user_agent: config
                .get_trimmed("provider", "user_agent")
                .unwrap_or(defaults.provider.user_agent),
            csv_dir: config
                .get_trimmed("provider", "csv_dir")
                .map(PathBuf::from)
                .unwrap_or(defaults.provider.csv_dir),
        };

        let default_style = config
            .get_trimmed("chart", "default_style")
            .unwrap_or(defaults.chart.default_style);
        if !is_known_style(&default_style) {
            return Err(invalid(
                "chart",
                "default_style",
                format!("unknown style '{}'", default_style),
            ));
        }

        let chart = ChartSettings {
            default_style,
            output_dir: config
                .get_trimmed("chart", "output_dir")
                .map(PathBuf::from)
                .unwrap_or(defaults.chart.output_dir),
            width: chart_side(config, "width", defaults.chart.width)?,
            height: chart_side(config, "height", defaults.chart.height)?,
        };

        Ok(Settings {
            indicators,
            provider,
            chart,
        })
    }
}
