//! Connection settings for a central server.
//!
//! Settings come from a JSON profile (`~/.config/oo-client/profiles/<name>.json`)
//! and can be overridden field by field.

use crate::error::{Error, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Central URL, e.g. `https://oo.example.com:8443`.
    pub url: String,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_verify_tls() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl ConnectionConfig {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            api_version: default_api_version(),
            verify_tls: default_verify_tls(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Central URL without a trailing slash.
    pub fn central_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// `{central}/oo/rest/{version}`
    pub fn rest_url(&self) -> String {
        format!("{}/oo/rest/{}", self.central_url(), self.api_version)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.url.trim().is_empty() {
            missing.push("url".to_string());
        }
        if self.username.is_empty() {
            missing.push("username".to_string());
        }
        if self.password.is_empty() {
            missing.push("password".to_string());
        }
        if !missing.is_empty() {
            return Err(Error::validation_missing_argument(missing));
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(Error::config_invalid_value(
                "url",
                Some(self.url.clone()),
                "URL must start with http:// or https://",
            ));
        }
        if self.api_version.trim().is_empty() {
            return Err(Error::config_invalid_value(
                "apiVersion",
                None,
                "API version must not be empty",
            ));
        }
        Ok(())
    }
}

/// Partial settings as stored in a profile file; every field optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_version: Option<String>,
    pub verify_tls: Option<bool>,
    pub request_timeout_secs: Option<u64>,
}

impl Profile {
    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: Profile) -> Profile {
        Profile {
            url: other.url.or(self.url),
            username: other.username.or(self.username),
            password: other.password.or(self.password),
            api_version: other.api_version.or(self.api_version),
            verify_tls: other.verify_tls.or(self.verify_tls),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
        }
    }

    pub fn into_connection(self) -> Result<ConnectionConfig> {
        let config = ConnectionConfig {
            url: self.url.unwrap_or_default(),
            username: self.username.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
            api_version: self.api_version.unwrap_or_else(default_api_version),
            verify_tls: self.verify_tls.unwrap_or_else(default_verify_tls),
            request_timeout_secs: self
                .request_timeout_secs
                .unwrap_or_else(default_request_timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }
}

pub fn load_profile_file(path: &Path) -> Result<Profile> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;
    serde_json::from_str(&content)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))
}

/// Load a named profile from the profiles directory.
pub fn load_profile(name: &str) -> Result<Profile> {
    let path = paths::profile(name)?;
    if !path.exists() {
        return Err(Error::config_missing_key(
            format!("profile.{}", name),
            Some(path.display().to_string()),
        )
        .with_hint(format!(
            "Create {} with url, username and password",
            path.display()
        )));
    }
    load_profile_file(&path)
}
