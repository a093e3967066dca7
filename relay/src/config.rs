//! Relay configuration parsed from environment variables.
//!
//! Every setting has a default, so an empty environment yields a working
//! relay. A variable that is present but unparsable is an error rather than
//! a silent fallback.

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_STROKE_TTL_SECS: u64 = 30 * 60;
pub const DEFAULT_ROOM_IDLE_GRACE_SECS: u64 = 10 * 60;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_CLIENT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub port: u16,
    /// Strokes whose `timestamp` is older than this are purged on ingest.
    pub stroke_ttl: Duration,
    /// Empty rooms idle for this long are removed by the sweeper.
    pub room_idle_grace: Duration,
    pub sweep_interval: Duration,
    /// Per-connection queue for peer broadcasts.
    pub client_queue_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            stroke_ttl: Duration::from_secs(DEFAULT_STROKE_TTL_SECS),
            room_idle_grace: Duration::from_secs(DEFAULT_ROOM_IDLE_GRACE_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            client_queue_capacity: DEFAULT_CLIENT_QUEUE_CAPACITY,
        }
    }
}

impl RelayConfig {
    /// Build config from the process environment.
    ///
    /// - `PORT` (3000)
    /// - `STROKE_TTL_SECS` (1800)
    /// - `ROOM_IDLE_GRACE_SECS` (600)
    /// - `SWEEP_INTERVAL_SECS` (60)
    /// - `CLIENT_QUEUE_CAPACITY` (256)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set but unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a value is present but unparsable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = env_parse(&lookup, "PORT", DEFAULT_PORT)?;
        let stroke_ttl_secs = env_parse(&lookup, "STROKE_TTL_SECS", DEFAULT_STROKE_TTL_SECS)?;
        let grace_secs = env_parse(&lookup, "ROOM_IDLE_GRACE_SECS", DEFAULT_ROOM_IDLE_GRACE_SECS)?;
        let sweep_secs = env_parse(&lookup, "SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?;
        let client_queue_capacity = env_parse(&lookup, "CLIENT_QUEUE_CAPACITY", DEFAULT_CLIENT_QUEUE_CAPACITY)?;

        if sweep_secs == 0 {
            return Err(ConfigError::Invalid { var: "SWEEP_INTERVAL_SECS", value: "0".to_owned() });
        }
        if client_queue_capacity == 0 {
            return Err(ConfigError::Invalid { var: "CLIENT_QUEUE_CAPACITY", value: "0".to_owned() });
        }

        Ok(Self {
            port,
            stroke_ttl: Duration::from_secs(stroke_ttl_secs),
            room_idle_grace: Duration::from_secs(grace_secs),
            sweep_interval: Duration::from_secs(sweep_secs),
            client_queue_capacity,
        })
    }

    /// Stroke TTL in milliseconds, for comparison against stroke timestamps.
    #[must_use]
    pub fn stroke_ttl_ms(&self) -> i64 {
        i64::try_from(self.stroke_ttl.as_millis()).unwrap_or(i64::MAX)
    }

    #[must_use]
    pub fn room_idle_grace_ms(&self) -> i64 {
        i64::try_from(self.room_idle_grace.as_millis()).unwrap_or(i64::MAX)
    }
}

fn env_parse<T>(lookup: &impl Fn(&str) -> Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
