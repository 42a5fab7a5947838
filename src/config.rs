//! Static description of one CI host, typically loaded from the orchestrator's TOML config.
//!
//! ```toml
//! name = "ci-main"
//! address = "https://ci.example.com/"
//! username = "deployer"
//! token = "..."
//! csrf = true
//! timeout_secs = 20
//! ```

use crate::{
    Auth, CiService, Error, HttpCiClient, HttpCiClientBuilder, RetryPolicy,
    client::blocking_client::DEFAULT_JOB_TREE_DEPTH,
};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Logical name the orchestrator refers to this host by.
    pub name: String,
    /// Base URL; a path prefix such as `/jenkins` is kept.
    pub address: String,
    #[serde(default)]
    pub username: Option<String>,
    /// Password or API token.
    #[serde(default, alias = "password")]
    pub token: Option<String>,
    /// Fetch a crumb before every mutating call.
    #[serde(default)]
    pub csrf: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_job_tree_depth")]
    pub job_tree_depth: usize,
    #[serde(default)]
    pub retry: RetrySettings,
}

/// Serializable subset of [`RetryPolicy`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_job_tree_depth() -> usize {
    DEFAULT_JOB_TREE_DEPTH
}

fn default_max_attempts() -> usize {
    2
}

fn default_base_delay_ms() -> u64 {
    200
}

impl HostConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(text).map_err(|err| Error::InvalidConfig {
            message: "invalid host configuration".into(),
            source: Some(Box::new(err)),
        })?;
        if config.name.trim().is_empty() {
            return Err(Error::InvalidConfig {
                message: "host name must not be empty".into(),
                source: None,
            });
        }
        Ok(config)
    }

    #[must_use]
    pub fn auth(&self) -> Option<Auth> {
        match (&self.username, &self.token) {
            (Some(user), Some(token)) => Some(Auth::basic(user, token)),
            (None, Some(token)) => Some(Auth::bearer(token)),
            _ => None,
        }
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.base_delay_ms),
        )
    }

    pub fn client_builder(&self) -> Result<HttpCiClientBuilder, Error> {
        let mut builder = HttpCiClient::builder(&self.address)?
            .timeout(Duration::from_secs(self.timeout_secs))
            .job_tree_depth(self.job_tree_depth);
        if let Some(auth) = self.auth() {
            builder = builder.auth(auth);
        }
        Ok(builder)
    }

    pub fn into_service(self) -> Result<CiService<HttpCiClient>, Error> {
        let client = self.client_builder()?.build()?;
        Ok(CiService::new(client)
            .csrf(self.csrf)
            .retry_policy(self.retry_policy()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_host() {
        let config = HostConfig::from_toml_str(
            r#"
            name = "ci-main"
            address = "https://ci.example.com/jenkins"
            "#,
        )
        .unwrap();
        assert!(!config.csrf);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.retry.max_attempts, 2);
        assert!(config.auth().is_none());
    }

    #[test]
    fn password_is_an_alias_for_token() {
        let config = HostConfig::from_toml_str(
            r#"
            name = "ci-main"
            address = "https://ci.example.com"
            username = "deployer"
            password = "hunter2"
            csrf = true

            [retry]
            max_attempts = 3
            "#,
        )
        .unwrap();
        assert!(config.csrf);
        assert!(matches!(config.auth(), Some(Auth::Basic { .. })));
        assert_eq!(config.retry_policy().max_attempts, 3);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = HostConfig::from_toml_str("name = \"x\"\naddress = \"https://a\"\nbogus = 1\n")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn builds_a_service() {
        let config = HostConfig::from_toml_str(
            "name = \"x\"\naddress = \"https://ci.example.com\"\ncsrf = true\n",
        )
        .unwrap();
        let service = config.into_service().unwrap();
        assert!(service.csrf_enabled());
        assert_eq!(service.client().base_url().as_str(), "https://ci.example.com/");
    }
}
