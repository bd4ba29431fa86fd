use std::fs;

use camino::Utf8PathBuf;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::DexError;

pub const CONFIG_FILE_NAME: &str = "dexproxy.json";
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RESULTS: usize = 50;
pub const DEFAULT_INDEX_LIMIT: u32 = 1500;
pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub upstream: Option<UpstreamSection>,
    #[serde(default)]
    pub search: Option<SearchSection>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpstreamSection {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SearchSection {
    #[serde(default)]
    pub max_results: Option<usize>,
    #[serde(default)]
    pub index_limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    pub max_results: usize,
    pub index_limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub upstream: UpstreamSettings,
    pub search: SearchSettings,
    pub language: String,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            upstream: UpstreamSettings {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                user_agent: format!("dexproxy/{}", env!("CARGO_PKG_VERSION")),
            },
            search: SearchSettings {
                max_results: DEFAULT_MAX_RESULTS,
                index_limit: DEFAULT_INDEX_LIMIT,
            },
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Explicit path first, then `./dexproxy.json`, then the per-user config
    /// directory. Without any file the built-in defaults apply.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, DexError> {
        let config_path = match path {
            Some(path) => Some(Utf8PathBuf::from(path)),
            None => Self::discover(),
        };

        let Some(config_path) = config_path else {
            tracing::debug!("no config file found, using defaults");
            return Self::resolve_config(Config::default());
        };

        let content = fs::read_to_string(config_path.as_std_path())
            .map_err(|_| DexError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| DexError::ConfigParse(err.to_string()))?;
        tracing::debug!(path = %config_path, "loaded config");

        Self::resolve_config(config)
    }

    fn discover() -> Option<Utf8PathBuf> {
        let local = Utf8PathBuf::from(CONFIG_FILE_NAME);
        if local.as_std_path().exists() {
            return Some(local);
        }
        ProjectDirs::from("", "", "dexproxy")
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(dirs.config_dir().join(CONFIG_FILE_NAME)).ok()
            })
            .filter(|path| path.as_std_path().exists())
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, DexError> {
        let schema_version = config.schema_version.unwrap_or(1);
        let upstream = config.upstream.unwrap_or_default();
        let search = config.search.unwrap_or_default();

        let base_url = upstream
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(DexError::ConfigParse(format!(
                "upstream.base_url must be an http(s) URL: {base_url}"
            )));
        }

        let max_results = search.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        if max_results == 0 || max_results > DEFAULT_MAX_RESULTS {
            return Err(DexError::ConfigParse(format!(
                "search.max_results must be between 1 and {DEFAULT_MAX_RESULTS}"
            )));
        }

        Ok(ResolvedConfig {
            schema_version,
            upstream: UpstreamSettings {
                base_url,
                timeout_secs: upstream.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
                user_agent: upstream
                    .user_agent
                    .unwrap_or_else(|| format!("dexproxy/{}", env!("CARGO_PKG_VERSION"))),
            },
            search: SearchSettings {
                max_results,
                index_limit: search.index_limit.unwrap_or(DEFAULT_INDEX_LIMIT),
            },
            language: config
                .language
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        })
    }
}
