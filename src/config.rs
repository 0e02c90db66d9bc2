//! Client configuration resolved from the environment.

use std::path::PathBuf;

use crate::api::DEFAULT_ERROR_PLACEHOLDER;

/// Backend base URL used when `CLINIC_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

pub const API_URL_ENV: &str = "CLINIC_API_URL";
pub const CACHE_DIR_ENV: &str = "CLINIC_CACHE_DIR";
pub const USER_AGENT_ENV: &str = "CLINIC_USER_AGENT";
pub const ERROR_PLACEHOLDER_ENV: &str = "CLINIC_ERROR_PLACEHOLDER";
pub const TIMEOUT_ENV: &str = "CLINIC_TIMEOUT_SECS";

const DEFAULT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Settings for [`ApiClient`](crate::api::ApiClient) and the credential store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Prefix joined with every request path.
    pub base_url: String,
    /// Directory holding `credentials.json`. `None` means `~/.clinic`.
    pub cache_dir: Option<PathBuf>,
    pub user_agent: String,
    /// Message used for failed responses without a usable body.
    pub error_placeholder: String,
    /// Client-wide request timeout. No timeout when `None`.
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            cache_dir: None,
            user_agent: default_user_agent(),
            error_placeholder: DEFAULT_ERROR_PLACEHOLDER.to_string(),
            timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout_secs = non_empty(TIMEOUT_ENV).and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(0) => None,
            Ok(secs) => Some(secs),
            Err(_) => {
                tracing::warn!("Ignoring invalid {}: {}", TIMEOUT_ENV, raw);
                None
            }
        });

        Self {
            base_url: non_empty(API_URL_ENV).unwrap_or(defaults.base_url),
            cache_dir: non_empty(CACHE_DIR_ENV).map(PathBuf::from),
            user_agent: non_empty(USER_AGENT_ENV).unwrap_or(defaults.user_agent),
            // An explicitly empty placeholder is meaningful: it selects `HTTP <status>`.
            error_placeholder: lookup(ERROR_PLACEHOLDER_ENV).unwrap_or(defaults.error_placeholder),
            timeout_secs,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }
}

fn default_user_agent() -> String {
    format!("clinic-client/{}", DEFAULT_VERSION)
}
