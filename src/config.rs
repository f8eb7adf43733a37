use clap::Parser;
use std::time::Duration;
use url::Url;

/// Pending bracket matches for in-progress Challonge tournaments
#[derive(Parser, Debug, Clone)]
#[command(name = "pending-matches", version, about)]
pub struct Config {
    /// Challonge API key, sent verbatim in the Authorization header
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Challonge API base URL
    #[arg(
        long,
        env = "CHALLONGE_API_URL",
        default_value = "https://api.challonge.com/v2.1"
    )]
    pub challonge_api_url: String,

    /// HTTP listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// Timeout for each individual upstream request, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "20")]
    pub request_timeout_secs: u64,

    /// Age after which a cached tournament list is refetched, in seconds
    #[arg(long, env = "CACHE_UPDATE_SECS", default_value = "300")]
    pub cache_update_secs: u64,

    /// Interval after which the whole cache is wiped, in seconds
    #[arg(long, env = "CACHE_CLEAR_SECS", default_value = "86400")]
    pub cache_clear_secs: u64,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("API_KEY must not be empty");
        }
        let url = Url::parse(&self.challonge_api_url)
            .map_err(|e| anyhow::anyhow!("CHALLONGE_API_URL is not a valid URL: {}", e))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("CHALLONGE_API_URL must be an http(s) URL");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be positive");
        }
        if self.cache_update_secs == 0 {
            anyhow::bail!("cache_update_secs must be positive");
        }
        if self.cache_clear_secs < self.cache_update_secs {
            anyhow::bail!("cache_clear_secs must be at least cache_update_secs");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn update_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_update_secs)
    }

    pub fn clear_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_clear_secs)
    }
}
