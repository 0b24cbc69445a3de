use std::env;
use std::fmt::Display;
use std::str::FromStr;

use tracing::{info, warn};

use crate::autocomplete::AutocompleteConfig;

pub const BASE_URL_VAR: &str = "VIAGGI_API_BASE_URL";
pub const TIMEOUT_VAR: &str = "VIAGGI_TIMEOUT";
pub const PROXY_VAR: &str = "VIAGGI_PROXY";

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub proxy: Option<String>,
    pub autocomplete: AutocompleteConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            proxy: None,
            autocomplete: AutocompleteConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: try_load(BASE_URL_VAR, DEFAULT_BASE_URL.to_string()),
            timeout_secs: try_load(TIMEOUT_VAR, DEFAULT_TIMEOUT_SECS),
            proxy: env::var(PROXY_VAR).ok().filter(|p| !p.is_empty()),
            autocomplete: AutocompleteConfig::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        self
    }

    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        if let Some(secs) = timeout_secs {
            self.timeout_secs = secs;
        }
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        if proxy.is_some() {
            self.proxy = proxy;
        }
        self
    }

    /// `base_url` joined with `path`, tolerating a trailing slash on either side.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}
