use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub cache: CacheConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub wikidata: WikidataConfig,
    #[serde(default)]
    pub curation: CurationConfig,
    #[serde(default)]
    pub checks: ChecksConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
}

fn default_include_globs() -> Vec<String> {
    vec!["*.md".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub root: PathBuf,
}

impl CacheConfig {
    /// Directory holding one `{id}_contributors.json` snapshot per record.
    pub fn contributors_dir(&self) -> PathBuf {
        self.root.join("contributors")
    }

    /// Directory holding one `{login}.json` profile per GitHub user.
    pub fn users_dir(&self) -> PathBuf {
        self.root.join("github").join("user")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GithubConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_calls_per_hour")]
    pub calls_per_hour: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            token_env: default_token_env(),
            api_url: default_api_url(),
            calls_per_hour: default_calls_per_hour(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GithubConfig {
    /// Token from the config file, falling back to the configured env var.
    pub fn resolve_token(&self) -> Option<String> {
        self.token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var(&self.token_env).ok())
            .filter(|t| !t.trim().is_empty())
    }
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}
fn default_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_calls_per_hour() -> u32 {
    5_000
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct WikidataConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WikidataConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://query.wikidata.org/sparql".to_string()
}
fn default_user_agent() -> String {
    "obofoundry/1.0 (https://obofoundry.org)".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CurationConfig {
    /// TOML file with the exclusion list and override table.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChecksConfig {
    #[serde(default)]
    pub schema_path: Option<PathBuf>,
    #[serde(default = "default_prefix_exempt")]
    pub preferred_prefix_exempt: Vec<String>,
    #[serde(default = "default_grandfathered")]
    pub grandfathered_publications: Vec<GrandfatheredPublication>,
    #[serde(default = "default_purl_config_url")]
    pub purl_config_url: String,
    /// Records whose OBO Graph is too large to fetch routinely.
    #[serde(default = "default_obograph_skip")]
    pub obograph_skip: Vec<String>,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            schema_path: None,
            preferred_prefix_exempt: default_prefix_exempt(),
            grandfathered_publications: default_grandfathered(),
            purl_config_url: default_purl_config_url(),
            obograph_skip: default_obograph_skip(),
        }
    }
}

/// A record allowed to cite publications under a non-standard URL prefix.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct GrandfatheredPublication {
    pub record: String,
    pub prefix: String,
}

fn default_prefix_exempt() -> Vec<String> {
    vec!["dpo".to_string()]
}
fn default_grandfathered() -> Vec<GrandfatheredPublication> {
    vec![GrandfatheredPublication {
        record: "agro".to_string(),
        prefix: "http://ceur-ws.org/".to_string(),
    }]
}
fn default_obograph_skip() -> Vec<String> {
    vec!["ncbitaxon".to_string()]
}
fn default_purl_config_url() -> String {
    "https://raw.githubusercontent.com/OBOFoundry/purl.obolibrary.org/master/config".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.store.include_globs.is_empty() {
        anyhow::bail!("store.include_globs must not be empty");
    }

    if config.github.calls_per_hour == 0 {
        anyhow::bail!("github.calls_per_hour must be > 0");
    }
    if config.github.timeout_secs == 0 || config.wikidata.timeout_secs == 0 {
        anyhow::bail!("timeout_secs must be > 0");
    }

    for (key, url) in [
        ("github.api_url", &config.github.api_url),
        ("wikidata.endpoint", &config.wikidata.endpoint),
        ("checks.purl_config_url", &config.checks.purl_config_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("{} must be an http(s) URL, got '{}'", key, url);
        }
    }

    Ok(())
}
