//! Client configuration.
//!
//! Loaded from environment variables with defaults. TURN credentials are
//! redacted in Debug output.

use crate::media::MediaConstraints;
use crate::negotiation::GlarePolicy;
use crate::transport::TransportConfig;
use huddle_core::IceServerConfig;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default rendezvous endpoint.
pub const DEFAULT_SIGNALING_URL: &str = "ws://localhost:5256/meetingHub";

/// Default time a negotiation may sit between offer and answer.
pub const DEFAULT_NEGOTIATION_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

#[derive(Clone)]
pub struct ClientConfig {
    /// WebSocket URL of the rendezvous server.
    pub signaling_url: String,

    /// STUN/TURN servers for every peer connection.
    pub transport: TransportConfig,

    /// Which local tracks to capture.
    pub media: MediaConstraints,

    /// Tie-break used when both sides send an offer at once.
    pub glare_policy: GlarePolicy,

    /// `None` disables the stalled negotiation sweep.
    pub negotiation_timeout: Option<Duration>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ice_servers: Vec<String> = self
            .transport
            .ice_servers
            .iter()
            .map(|server| {
                if server.has_credentials() {
                    format!("{} [REDACTED]", server.urls.join(","))
                } else {
                    server.urls.join(",")
                }
            })
            .collect();

        f.debug_struct("ClientConfig")
            .field("signaling_url", &self.signaling_url)
            .field("ice_servers", &ice_servers)
            .field("media", &self.media)
            .field("glare_policy", &self.glare_policy)
            .field("negotiation_timeout", &self.negotiation_timeout)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            signaling_url: DEFAULT_SIGNALING_URL.to_owned(),
            transport: TransportConfig::default(),
            media: MediaConstraints::default(),
            glare_policy: GlarePolicy::default(),
            negotiation_timeout: Some(Duration::from_secs(DEFAULT_NEGOTIATION_TIMEOUT_SECONDS)),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let signaling_url = vars
            .get("HUDDLE_SIGNALING_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_SIGNALING_URL.to_owned());
        if !signaling_url.starts_with("ws://") && !signaling_url.starts_with("wss://") {
            return Err(ConfigError::InvalidValue(format!(
                "HUDDLE_SIGNALING_URL must be a ws:// or wss:// url, got {signaling_url}"
            )));
        }

        let mut transport = match vars.get("HUDDLE_STUN_URLS") {
            Some(urls) => {
                let urls: Vec<String> = urls
                    .split(',')
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(str::to_owned)
                    .collect();
                if urls.is_empty() {
                    TransportConfig { ice_servers: vec![] }
                } else {
                    TransportConfig {
                        ice_servers: vec![IceServerConfig::stun(urls)],
                    }
                }
            }
            None => TransportConfig::default(),
        };

        if let Some(turn_url) = vars.get("HUDDLE_TURN_URL") {
            let username = vars.get("HUDDLE_TURN_USERNAME").ok_or_else(|| {
                ConfigError::MissingEnvVar("HUDDLE_TURN_USERNAME".to_owned())
            })?;
            let credential = vars.get("HUDDLE_TURN_CREDENTIAL").ok_or_else(|| {
                ConfigError::MissingEnvVar("HUDDLE_TURN_CREDENTIAL".to_owned())
            })?;
            transport
                .ice_servers
                .push(IceServerConfig::turn(turn_url, username, credential));
        }

        let negotiation_timeout = match vars.get("HUDDLE_NEGOTIATION_TIMEOUT_SECONDS") {
            Some(raw) => {
                let seconds: u64 = raw.parse().map_err(|e| {
                    ConfigError::InvalidValue(format!(
                        "HUDDLE_NEGOTIATION_TIMEOUT_SECONDS must be a number: {e}"
                    ))
                })?;
                (seconds > 0).then(|| Duration::from_secs(seconds))
            }
            None => Some(Duration::from_secs(DEFAULT_NEGOTIATION_TIMEOUT_SECONDS)),
        };

        let glare_policy = match vars.get("HUDDLE_GLARE_POLICY") {
            Some(raw) => raw.parse().map_err(ConfigError::InvalidValue)?,
            None => GlarePolicy::default(),
        };

        let media = MediaConstraints {
            audio: parse_bool(vars, "HUDDLE_CAPTURE_AUDIO", true)?,
            video: parse_bool(vars, "HUDDLE_CAPTURE_VIDEO", true)?,
        };

        Ok(Self {
            signaling_url,
            transport,
            media,
            glare_policy,
            negotiation_timeout,
        })
    }
}

fn parse_bool(
    vars: &HashMap<String, String>,
    key: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    match vars.get(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => Err(ConfigError::InvalidValue(format!(
            "{key} must be a boolean, got {v}"
        ))),
    }
}
