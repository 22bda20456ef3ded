//! Client options and the host-facing JSON configuration.
//!
//! # Design
//! `ClientOptions` is what a `SlideClient` is built from. `SlideConfig` and
//! `PlatformConfig` mirror the JSON a home-automation host hands over
//! (camelCase keys, millisecond durations) and are converted into options
//! here so the client itself never sees raw config.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::SlideClient;
use crate::transport::UreqTransport;

pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 15000;
pub const DEFAULT_USERNAME: &str = "user";

/// Username and secret for digest auth. Only exists when both are known.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub secret: String,
}

impl Credentials {
    /// `None` unless both parts are present and non-empty. Half a credential
    /// disables auth rather than failing.
    pub fn from_parts(username: Option<String>, secret: Option<String>) -> Option<Self> {
        match (username, secret) {
            (Some(username), Some(secret)) if !username.is_empty() && !secret.is_empty() => {
                Some(Self { username, secret })
            }
            _ => None,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Constructor parameters for `SlideClient`.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Bound for each transport attempt.
    pub timeout: Duration,
    pub username: Option<String>,
    pub secret: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            username: None,
            secret: None,
        }
    }
}

impl ClientOptions {
    pub fn credentials(&self) -> Option<Credentials> {
        Credentials::from_parts(self.username.clone(), self.secret.clone())
    }
}

/// One device entry of the host configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideConfig {
    pub name: String,
    pub host: String,
    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout: u64,
    #[serde(default = "default_username")]
    pub username: String,
    /// Device code printed on the Slide; used as the digest secret.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<u64>,
}

impl SlideConfig {
    pub fn options(&self) -> ClientOptions {
        // Without a code the username is meaningless; drop both.
        let secret = self.code.clone().filter(|c| !c.is_empty());
        ClientOptions {
            timeout: Duration::from_millis(self.timeout),
            username: secret.as_ref().map(|_| self.username.clone()),
            secret,
        }
    }

    pub fn client(&self) -> SlideClient<UreqTransport> {
        SlideClient::new(&self.host, self.options())
    }
}

/// Top-level host configuration: a list of devices plus shared defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfig {
    /// Raw entries; invalid ones are skipped by `devices()`.
    #[serde(default)]
    pub slides: Vec<serde_json::Value>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval: u64,
}

impl PlatformConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Valid device entries. Entries without a name or host are logged and
    /// skipped.
    pub fn devices(&self) -> Vec<SlideConfig> {
        if self.slides.is_empty() {
            warn!("no slides configured");
            return Vec::new();
        }

        self.slides
            .iter()
            .filter_map(|entry| match serde_json::from_value::<SlideConfig>(entry.clone()) {
                Ok(cfg) if !cfg.name.is_empty() && !cfg.host.is_empty() => Some(cfg),
                Ok(_) => {
                    warn!(%entry, "slide missing name or host, skipping");
                    None
                }
                Err(e) => {
                    warn!(%entry, error = %e, "invalid slide entry, skipping");
                    None
                }
            })
            .collect()
    }

    /// Poll interval for `device`, falling back to the platform default.
    pub fn poll_interval_for(&self, device: &SlideConfig) -> Duration {
        Duration::from_millis(device.poll_interval.unwrap_or(self.poll_interval))
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_need_both_parts() {
        assert!(Credentials::from_parts(Some("user".into()), Some("code".into())).is_some());
        assert!(Credentials::from_parts(Some("user".into()), None).is_none());
        assert!(Credentials::from_parts(None, Some("code".into())).is_none());
        assert!(Credentials::from_parts(Some(String::new()), Some("code".into())).is_none());
        assert!(Credentials::from_parts(None, None).is_none());
    }

    #[test]
    fn credentials_debug_hides_secret() {
        let c = Credentials::from_parts(Some("user".into()), Some("rWU7G45S".into())).unwrap();
        let shown = format!("{c:?}");
        assert!(shown.contains("user"));
        assert!(!shown.contains("rWU7G45S"));
    }

    #[test]
    fn slide_config_defaults() {
        let cfg: SlideConfig =
            serde_json::from_str(r#"{"name":"Living room","host":"192.168.4.96"}"#).unwrap();
        assert_eq!(cfg.timeout, 5000);
        assert_eq!(cfg.username, "user");
        assert!(cfg.code.is_none());
        assert!(cfg.options().credentials().is_none());
    }

    #[test]
    fn code_enables_auth_with_default_username() {
        let cfg: SlideConfig = serde_json::from_str(
            r#"{"name":"Bedroom","host":"10.0.0.5","code":"rWU7G45S","timeout":2500,"pollInterval":1000}"#,
        )
        .unwrap();
        let opts = cfg.options();
        assert_eq!(opts.timeout, Duration::from_millis(2500));
        let creds = opts.credentials().unwrap();
        assert_eq!(creds.username, "user");
        assert_eq!(creds.secret, "rWU7G45S");
        assert_eq!(cfg.poll_interval, Some(1000));
    }

    #[test]
    fn platform_skips_incomplete_entries() {
        let platform = PlatformConfig::from_json(
            r#"{
                "pollInterval": 30000,
                "slides": [
                    {"name":"A","host":"10.0.0.1"},
                    {"name":"no host"},
                    {"host":"10.0.0.3"},
                    {"name":"","host":"10.0.0.4"},
                    {"name":"B","host":"10.0.0.2","pollInterval":5000}
                ]
            }"#,
        )
        .unwrap();
        let devices = platform.devices();
        let names: Vec<&str> = devices.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(platform.poll_interval_for(&devices[0]), Duration::from_millis(30000));
        assert_eq!(platform.poll_interval_for(&devices[1]), Duration::from_millis(5000));
    }

    #[test]
    fn platform_defaults_when_empty() {
        let platform = PlatformConfig::from_json("{}").unwrap();
        assert_eq!(platform.poll_interval, 15000);
        assert!(platform.devices().is_empty());
    }
}
