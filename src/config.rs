use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_REGION_ID: &str = "cn-hangzhou";
pub const DEFAULT_ENDPOINT: &str = "https://alidns.aliyuncs.com/";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone)]
pub struct Config {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub region_id: String,
    pub domain_name: String,
    pub subdomains: Vec<String>,
    pub endpoint: String,
    pub log_level: String,
}

/// Same keys as the environment, all optional; environment values win.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    access_key_id: Option<String>,
    access_key_secret: Option<String>,
    region_id: Option<String>,
    domain_name: Option<String>,
    #[serde(default)]
    subdomains: Vec<String>,
    endpoint: Option<String>,
    log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Checked before anything else, so it wins over missing credentials.
    #[error("SUBDOMAINS is not set; provide a comma separated list of subdomains")]
    NoSubdomains,

    #[error("{0} is not set or empty")]
    Missing(&'static str),
}

impl Config {
    /// Build the configuration from process environment variables only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(FileConfig::default(), env_lookup)
    }

    /// Read a TOML file and layer the process environment on top of it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let file: FileConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(Self::resolve(file, env_lookup)?)
    }

    fn resolve<F>(file: FileConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, fallback: Option<String>| {
            lookup(key)
                .or(fallback)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let subdomains: Vec<String> = match lookup("SUBDOMAINS") {
            Some(list) => parse_subdomains(&list),
            None => file
                .subdomains
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };
        if subdomains.is_empty() {
            return Err(ConfigError::NoSubdomains);
        }

        let access_key_id = pick("ALIYUN_ACCESS_KEY_ID", file.access_key_id)
            .ok_or(ConfigError::Missing("ALIYUN_ACCESS_KEY_ID"))?;
        let access_key_secret = pick("ALIYUN_ACCESS_KEY_SECRET", file.access_key_secret)
            .ok_or(ConfigError::Missing("ALIYUN_ACCESS_KEY_SECRET"))?;
        let domain_name = pick("DOMAIN_NAME", file.domain_name)
            .ok_or(ConfigError::Missing("DOMAIN_NAME"))?;

        Ok(Self {
            access_key_id,
            access_key_secret,
            region_id: pick("ALIYUN_REGION_ID", file.region_id)
                .unwrap_or_else(|| DEFAULT_REGION_ID.to_string()),
            domain_name,
            subdomains,
            endpoint: pick("ALIDNS_ENDPOINT", file.endpoint)
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            log_level: pick("LOG_LEVEL", file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}

fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Split a comma separated list, dropping blank entries.
pub fn parse_subdomains(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
