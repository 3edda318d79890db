//! Config module contains the initial static parameters for the app.
use std::env;

use config_crate::{Config as RawConfig, ConfigError, Environment, File};

/// Basic settings - database and cpu pool
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: Database,
    pub cpu_pool: CpuPool,
}

/// Database settings
#[derive(Debug, Deserialize, Clone)]
pub struct Database {
    pub url: String,
}

/// Cpu pool settings
#[derive(Debug, Deserialize, Clone)]
pub struct CpuPool {
    pub thread_count: usize,
}

impl Config {
    /// Creates config from base.toml, which are overwritten by `RUN_MODE`
    /// environment config file and `DISCOUNTS_` prefixed env variables.
    pub fn new() -> Result<Self, ConfigError> {
        let env_name = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        let mut s = RawConfig::new();
        s.merge(File::with_name("config/base"))?;
        s.merge(File::with_name(&format!("config/{}", env_name)).required(false))?;
        s.merge(Environment::with_prefix("DISCOUNTS"))?;
        s.try_into()
    }
}
