use std::str::FromStr;

use config::{Config, File};
use log::LevelFilter;
use serde::Deserialize;

use crate::error::PeekError;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub eth: EthCfg,
    pub log: Option<LogCfg>,
}

#[derive(Debug, Deserialize)]
pub struct EthCfg {
    /// Authentication/project identifier for the endpoint provider.
    pub project_id: String,
    /// Full endpoint URL, ws(s):// or http(s)://.
    pub rpc_url: String,
}

#[derive(Debug, Deserialize)]
pub struct LogCfg {
    pub level: String,
}

impl AppConfig {
    /// Loads and validates the configuration file. Both `eth.project_id` and
    /// `eth.rpc_url` are required; a missing setting fails here, before any
    /// network activity.
    pub fn new(config_path: &str) -> Result<Self, PeekError> {
        let config = Config::builder()
            .add_source(File::with_name(config_path))
            .build()?;
        let app_config: AppConfig = config.try_deserialize()?;
        Ok(app_config)
    }

    pub fn init_log(&self) -> Result<LevelFilter, PeekError> {
        let level = self
            .log
            .as_ref()
            .map(|log| log.level.as_str())
            .unwrap_or("info");
        let filter = LevelFilter::from_str(level).map_err(|_| {
            PeekError::Configuration(config::ConfigError::Message(format!(
                "invalid log level: {level}"
            )))
        })?;
        let _ = env_logger::builder().filter_level(filter).try_init();
        Ok(filter)
    }
}
