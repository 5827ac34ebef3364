// Settings loaded with the 'config' crate: defaults, then an optional
// config.toml, then MOTOR_METRICS__* environment variables.

use std::time::Duration;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_address: String,
    // Listing search endpoint: GET ?make&model&zip&radius&rows
    pub search_url: String,
    // Model lookup endpoint: GET ?make
    pub models_url: String,
    pub page_size: u32,
    pub request_timeout_secs: u64,
    pub models_cache_ttl_secs: u64,
    pub models_cache_size: usize,
    pub max_sessions: usize,
    pub makes_file: Option<String>,
    pub proxy_url: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let builder = Self::defaults(Config::builder())?
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("MOTOR_METRICS").separator("__"));

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(builder
            .set_default("server_address", "127.0.0.1:3000")?
            .set_default("search_url", "http://localhost:8080/api/search")?
            .set_default("models_url", "http://localhost:8080/api/models")?
            .set_default("page_size", 50)?
            .set_default("request_timeout_secs", 10)?
            .set_default("models_cache_ttl_secs", 3600)?
            .set_default("models_cache_size", 256)?
            .set_default("max_sessions", 1024)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    // Settings pointing at a given listing service, for tests and tools
    pub fn for_service(base_url: &str) -> Self {
        Settings {
            server_address: "127.0.0.1:0".to_string(),
            search_url: format!("{}/api/search", base_url),
            models_url: format!("{}/api/models", base_url),
            page_size: 50,
            request_timeout_secs: 10,
            models_cache_ttl_secs: 3600,
            models_cache_size: 256,
            max_sessions: 1024,
            makes_file: None,
            proxy_url: None,
        }
    }
}
