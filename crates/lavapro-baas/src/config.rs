//! Backend connection configuration.
//!
//! Loaded from the `SUPABASE_URL` and `SUPABASE_ANON_KEY` environment
//! variables. Missing values are a configuration error, never a default.

use std::env;
use std::time::Duration;
use url::Url;

use crate::error::{BaasError, BaasResult};

/// Environment variable holding the project URL.
pub const URL_VAR: &str = "SUPABASE_URL";
/// Environment variable holding the public (anon) API key.
pub const ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Hosted backend configuration.
#[derive(Debug, Clone)]
pub struct BaasConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co/`
    pub url: Url,

    /// Public API key sent as `apikey` on every request
    pub anon_key: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl BaasConfig {
    /// Builds a config, validating the URL.
    pub fn new(url: &str, anon_key: &str) -> BaasResult<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(BaasError::Config(format!("{} is not set", URL_VAR)));
        }
        let anon_key = anon_key.trim();
        if anon_key.is_empty() {
            return Err(BaasError::Config(format!("{} is not set", ANON_KEY_VAR)));
        }

        let mut url = Url::parse(url)
            .map_err(|e| BaasError::Config(format!("{} is not a valid URL: {}", URL_VAR, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(BaasError::Config(format!(
                "{} must use http or https, got '{}'",
                URL_VAR,
                url.scheme()
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(BaasConfig {
            url,
            anon_key: anon_key.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Loads configuration from the process environment.
    pub fn from_env() -> BaasResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> BaasResult<Self> {
        let url = lookup(URL_VAR)
            .ok_or_else(|| BaasError::Config(format!("{} is not set", URL_VAR)))?;
        let anon_key = lookup(ANON_KEY_VAR)
            .ok_or_else(|| BaasError::Config(format!("{} is not set", ANON_KEY_VAR)))?;
        Self::new(&url, &anon_key)
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL of an auth endpoint, e.g. `auth_url("token")`.
    pub fn auth_url(&self, endpoint: &str) -> BaasResult<Url> {
        self.join(&format!("auth/v1/{}", endpoint))
    }

    /// URL of a table endpoint, e.g. `rest_url("orders")`.
    pub fn rest_url(&self, table: &str) -> BaasResult<Url> {
        self.join(&format!("rest/v1/{}", table))
    }

    fn join(&self, path: &str) -> BaasResult<Url> {
        self.url
            .join(path)
            .map_err(|e| BaasError::Config(format!("cannot build URL for {}: {}", path, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_variables_are_config_errors() {
        let err = BaasConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains(URL_VAR));

        let err = BaasConfig::from_lookup(lookup(&[(URL_VAR, "https://x.supabase.co")])).unwrap_err();
        assert!(err.to_string().contains(ANON_KEY_VAR));

        let err = BaasConfig::from_lookup(lookup(&[(URL_VAR, "  "), (ANON_KEY_VAR, "k")])).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_invalid_url() {
        assert!(BaasConfig::new("not a url", "key").unwrap_err().is_config_error());
        assert!(BaasConfig::new("ftp://x.supabase.co", "key").unwrap_err().is_config_error());
    }

    #[test]
    fn test_endpoint_urls() {
        let config = BaasConfig::new("https://abc.supabase.co", "anon").unwrap();
        assert_eq!(
            config.auth_url("token").unwrap().as_str(),
            "https://abc.supabase.co/auth/v1/token"
        );
        assert_eq!(
            config.rest_url("orders").unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/orders"
        );

        let prefixed = BaasConfig::new("http://localhost:54321/project", "anon").unwrap();
        assert_eq!(
            prefixed.rest_url("services").unwrap().as_str(),
            "http://localhost:54321/project/rest/v1/services"
        );
    }
}
