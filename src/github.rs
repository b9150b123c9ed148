//! GitHub REST API client.
//!
//! Every request carries a bearer token and counts against an hourly call
//! budget. Requests beyond the budget wait for the token bucket to refill
//! rather than fail. Callers that go through a [`KeyedCache`] first never
//! touch the budget on a hit.
//!
//! # Configuration
//!
//! ```toml
//! [github]
//! token_env = "GITHUB_TOKEN"     # or: token = "ghp_..."
//! api_url = "https://api.github.com"
//! calls_per_hour = 5000
//! ```
//!
//! [`KeyedCache`]: crate::cache::KeyedCache

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::GithubConfig;
use crate::error::{Error, Result};
use crate::models::RepoContributor;

/// Contributors returned per repository. There is no pagination beyond this
/// first page, so repositories with more contributors are truncated.
pub const CONTRIBUTORS_PER_PAGE: u32 = 100;

/// Read access to a code-hosting platform.
///
/// [`GithubClient`] is the production implementation; tests substitute
/// in-memory fakes.
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// First page (up to [`CONTRIBUTORS_PER_PAGE`]) of a repository's contributors.
    async fn contributors(&self, owner: &str, name: &str) -> Result<Vec<RepoContributor>>;

    /// Public profile of a user.
    async fn user(&self, login: &str) -> Result<serde_json::Value>;

    /// Repository metadata (license, default branch, ...).
    async fn repository(&self, owner: &str, name: &str) -> Result<serde_json::Value>;
}

pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    limiter: DefaultDirectRateLimiter,
}

impl GithubClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when no token is configured, before any
    /// request is attempted.
    pub fn from_config(config: &GithubConfig) -> Result<Self> {
        let token = config.resolve_token().ok_or_else(|| {
            Error::Configuration(format!(
                "GitHub token missing: set github.token or the {} environment variable",
                config.token_env
            ))
        })?;
        let budget = NonZeroU32::new(config.calls_per_hour).ok_or_else(|| {
            Error::Configuration("github.calls_per_hour must be > 0".to_string())
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("obo-curation/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token,
            limiter: RateLimiter::direct(Quota::per_hour(budget)),
        })
    }

    /// Wait until the hourly budget allows one more call.
    async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.acquire().await;

        let url = format!("{}{}", self.api_url, path);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::transport(
                url,
                format!("GitHub API error {}: {}", status, body.trim()),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| Error::transport(url, format!("invalid JSON from GitHub: {}", e)))
    }
}

#[async_trait]
impl CodeHost for GithubClient {
    async fn contributors(&self, owner: &str, name: &str) -> Result<Vec<RepoContributor>> {
        self.get_json(&format!(
            "/repos/{}/{}/contributors?per_page={}",
            owner, name, CONTRIBUTORS_PER_PAGE
        ))
        .await
    }

    async fn user(&self, login: &str) -> Result<serde_json::Value> {
        self.get_json(&format!("/users/{}", login)).await
    }

    async fn repository(&self, owner: &str, name: &str) -> Result<serde_json::Value> {
        self.get_json(&format!("/repos/{}/{}", owner, name)).await
    }
}

/// A [`GithubClient`] built on the first request.
///
/// Runs answered entirely from the cache never need a token; a missing token
/// surfaces as [`Error::Configuration`] on the first cache miss.
pub struct LazyGithub {
    config: GithubConfig,
    client: OnceCell<GithubClient>,
}

impl LazyGithub {
    pub fn new(config: &GithubConfig) -> Self {
        Self {
            config: config.clone(),
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&GithubClient> {
        self.client
            .get_or_try_init(|| async { GithubClient::from_config(&self.config) })
            .await
    }
}

#[async_trait]
impl CodeHost for LazyGithub {
    async fn contributors(&self, owner: &str, name: &str) -> Result<Vec<RepoContributor>> {
        self.client().await?.contributors(owner, name).await
    }

    async fn user(&self, login: &str) -> Result<serde_json::Value> {
        self.client().await?.user(login).await
    }

    async fn repository(&self, owner: &str, name: &str) -> Result<serde_json::Value> {
        self.client().await?.repository(owner, name).await
    }
}
