use std::env;
use std::time::Duration;

use anyhow::{bail, Result};
use reqwest::Url;

use crate::error::GenerationError;

pub const DEFAULT_API_BASE: &str = "https://api.stability.ai";
pub const DEFAULT_ENGINE_ID: &str = "stable-diffusion-xl-1024-v1-0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection settings for the Stability image-to-image endpoint.
#[derive(Clone)]
pub struct StabilityConfig {
    api_base: String,
    engine_id: String,
    api_key: String,
    timeout: Duration,
}

impl StabilityConfig {
    pub fn new(api_key: impl AsRef<str>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            engine_id: DEFAULT_ENGINE_ID.to_string(),
            api_key: api_key.as_ref().trim().to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Reads `STABILITY_API_KEY` (required), `STABILITY_API_BASE`,
    /// `STABILITY_ENGINE_ID` and `DECOR_REQUEST_TIMEOUT_S`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(non_empty_env, None)
    }

    /// Like `from_env`, but an unset key becomes `fallback_key`. Every other
    /// variable is still validated.
    pub fn from_env_or_key(fallback_key: &str) -> Result<Self> {
        Self::from_lookup(non_empty_env, Some(fallback_key))
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        fallback_key: Option<&str>,
    ) -> Result<Self> {
        let api_key = match (lookup("STABILITY_API_KEY"), fallback_key) {
            (Some(key), _) => key,
            (None, Some(fallback)) => fallback.to_string(),
            (None, None) => bail!("STABILITY_API_KEY not set"),
        };
        let mut config = Self::new(api_key);
        if let Some(api_base) = lookup("STABILITY_API_BASE") {
            config = config.with_api_base(api_base);
        }
        if let Some(engine_id) = lookup("STABILITY_ENGINE_ID") {
            config = config.with_engine_id(engine_id);
        }
        if let Some(raw) = lookup("DECOR_REQUEST_TIMEOUT_S") {
            config = config.with_timeout(parse_timeout(&raw)?);
        }
        Ok(config)
    }

    pub fn with_api_base(mut self, api_base: impl AsRef<str>) -> Self {
        self.api_base = api_base.as_ref().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_engine_id(mut self, engine_id: impl AsRef<str>) -> Self {
        self.engine_id = engine_id.as_ref().trim().to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn engine_id(&self) -> &str {
        &self.engine_id
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn endpoint(&self) -> Result<Url, GenerationError> {
        if self.engine_id.is_empty() || self.engine_id.contains('/') {
            return Err(GenerationError::InvalidUrl(format!(
                "engine id '{}' is not a single path segment",
                self.engine_id
            )));
        }
        let raw = format!(
            "{}/v1/generation/{}/image-to-image",
            self.api_base, self.engine_id
        );
        let url = Url::parse(&raw).map_err(|err| GenerationError::InvalidUrl(format!("{raw}: {err}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(GenerationError::InvalidUrl(format!(
                "{raw}: unsupported scheme '{}'",
                url.scheme()
            )));
        }
        Ok(url)
    }
}

impl std::fmt::Debug for StabilityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StabilityConfig")
            .field("api_base", &self.api_base)
            .field("engine_id", &self.engine_id)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    let seconds: f64 = raw
        .parse()
        .map_err(|_| anyhow::anyhow!("DECOR_REQUEST_TIMEOUT_S must be a number: {raw}"))?;
    if seconds.is_nan() || seconds <= 0.0 {
        bail!("DECOR_REQUEST_TIMEOUT_S must be positive: {raw}");
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|err| anyhow::anyhow!("DECOR_REQUEST_TIMEOUT_S out of range: {raw} ({err})"))
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
