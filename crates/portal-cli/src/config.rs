use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use portal_client::{CacheConfig, ClientConfig, ClientStrategy};
use serde::{Deserialize, Serialize};

use crate::cli::OutputFormat;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ProfileConfig {
    pub server: Option<String>,
    pub format: Option<String>,
    pub strategy: Option<String>,
    pub cache_ttl_secs: Option<u64>,
}

pub type ConfigFile = HashMap<String, ProfileConfig>;

pub const CONFIG_KEYS: &str = "server, format, strategy, cache_ttl_secs";

fn config_path() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(portal_client::credentials::STATE_DIR);
    fs::create_dir_all(&dir)?;
    Ok(dir.join("config.toml"))
}

pub fn load_all_from(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).with_context(|| format!("Invalid config file: {}", path.display()))
}

pub fn save_all_to(path: &Path, all: &ConfigFile) -> Result<()> {
    let content = toml::to_string_pretty(all)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    let mut all = load_all_from(&config_path()?)?;
    Ok(all.remove(profile).unwrap_or_default())
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    let path = config_path()?;
    let mut all = load_all_from(&path)?;
    all.insert(profile.to_string(), config.clone());
    save_all_to(&path, &all)
}

impl ProfileConfig {
    /// Applies `key = value`, validating the value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "server" => {
                url::Url::parse(value).with_context(|| format!("Invalid server URL: {value}"))?;
                self.server = Some(value.to_string());
            }
            "format" => {
                <OutputFormat as clap::ValueEnum>::from_str(value, true)
                    .map_err(|e| anyhow::anyhow!(e))?;
                self.format = Some(value.to_string());
            }
            "strategy" => {
                value
                    .parse::<ClientStrategy>()
                    .map_err(|e| anyhow::anyhow!(e))?;
                self.strategy = Some(value.to_string());
            }
            "cache_ttl_secs" => {
                let ttl = value
                    .parse::<u64>()
                    .with_context(|| format!("cache_ttl_secs must be a number of seconds, got {value}"))?;
                self.cache_ttl_secs = Some(ttl);
            }
            other => anyhow::bail!("Unknown config key: {other}. Valid keys: {CONFIG_KEYS}"),
        }
        Ok(())
    }

    pub fn output_format(&self) -> OutputFormat {
        self.format
            .as_deref()
            .and_then(|f| <OutputFormat as clap::ValueEnum>::from_str(f, true).ok())
            .unwrap_or_default()
    }
}

/// Builds the client configuration.
///
/// Precedence: `--server` flag / `PORTAL_API_URL` env, then the profile, then
/// the built-in default. `--no-cache` forces the plain strategy.
pub fn client_config(
    cli_server: &Option<String>,
    profile: &ProfileConfig,
    no_cache: bool,
) -> Result<ClientConfig> {
    let mut config = ClientConfig::default();

    if let Some(server) = cli_server.as_ref().or(profile.server.as_ref()) {
        config.base_url = server.clone();
    }

    if let Some(strategy) = &profile.strategy {
        config.strategy = strategy.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    }
    if no_cache {
        config.strategy = ClientStrategy::Plain;
    }

    if let Some(ttl_secs) = profile.cache_ttl_secs {
        config.cache = CacheConfig {
            ttl_secs,
            ..config.cache
        };
    }

    Ok(config)
}
