use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// How long a booking session may sit idle before it expires.
    #[serde(default = "default_session_window")]
    pub session_window_seconds: u64,

    /// Grace period for bookings confirmed with a pending payment.
    #[serde(default = "default_payment_window")]
    pub payment_window_seconds: u64,

    /// Cadence of the background expiry sweep.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

fn default_session_window() -> u64 {
    900 // 15 minutes
}

fn default_payment_window() -> u64 {
    1800 // 30 minutes
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            session_window_seconds: default_session_window(),
            payment_window_seconds: default_payment_window(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of CINE)
            // Eg.. `CINE__SERVER__PORT=8081` would set the server port
            .add_source(config::Environment::with_prefix("CINE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_rules_defaults() {
        let rules = BusinessRules::default();
        assert_eq!(rules.session_window_seconds, 900);
        assert_eq!(rules.payment_window_seconds, 1800);
        assert_eq!(rules.sweep_interval_seconds, 60);
    }
}
