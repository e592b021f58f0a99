use anyhow::{Context, Result, bail};
use log::debug;
use std::env;
use std::time::Duration;

pub const WARMUP_MS_VAR: &str = "PULSE_WARMUP_MS";
pub const SAMPLE_INTERVAL_MS_VAR: &str = "PULSE_SAMPLE_INTERVAL_MS";
pub const DISPLAY_INTERVAL_MS_VAR: &str = "PULSE_DISPLAY_INTERVAL_MS";
pub const AVAILABLE_VAR: &str = "PULSE_HEALTH_SERVICES_AVAILABLE";

/// Timing and availability settings for the simulated health services.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseConfig {
    /// Delay between PREPARING and ACTIVE, standing in for sensor warm-up.
    pub warmup: Duration,
    /// Period of the caller's metrics sampling tick.
    pub sample_interval: Duration,
    /// Period of the caller's on-screen clock.
    pub display_interval: Duration,
    pub available: bool,
}

impl Default for ExerciseConfig {
    fn default() -> Self {
        Self {
            warmup: Duration::from_millis(1000),
            sample_interval: Duration::from_millis(2000),
            display_interval: Duration::from_millis(1000),
            available: true,
        }
    }
}

impl ExerciseConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, starting from the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(warmup) = read_millis(&lookup, WARMUP_MS_VAR)? {
            config.warmup = warmup;
        }
        if let Some(interval) = read_millis(&lookup, SAMPLE_INTERVAL_MS_VAR)? {
            if interval.is_zero() {
                bail!("{} must be greater than zero", SAMPLE_INTERVAL_MS_VAR);
            }
            config.sample_interval = interval;
        }
        if let Some(interval) = read_millis(&lookup, DISPLAY_INTERVAL_MS_VAR)? {
            if interval.is_zero() {
                bail!("{} must be greater than zero", DISPLAY_INTERVAL_MS_VAR);
            }
            config.display_interval = interval;
        }
        if let Some(raw) = lookup(AVAILABLE_VAR) {
            config.available = parse_flag(&raw)
                .with_context(|| format!("{} must be a boolean, got {:?}", AVAILABLE_VAR, raw))?;
        }

        debug!("Loaded exercise config: {:?}", config);
        Ok(config)
    }
}

fn read_millis<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let ms = raw
        .trim()
        .parse::<u64>()
        .with_context(|| format!("{} must be a whole number of milliseconds, got {:?}", key, raw))?;
    Ok(Some(Duration::from_millis(ms)))
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("unrecognised flag value {:?}", other),
    }
}
