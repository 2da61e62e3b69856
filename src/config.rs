//! Immutable client configuration.

use data_encoding::BASE64;
use serde::Deserialize;
use zeroize::Zeroize;

use crate::error::ConfigError;

/// Default YubiCloud validation endpoints.
pub const DEFAULT_SERVERS: [&str; 5] = [
    "api.yubico.com/wsapi/2.0/verify",
    "api2.yubico.com/wsapi/2.0/verify",
    "api3.yubico.com/wsapi/2.0/verify",
    "api4.yubico.com/wsapi/2.0/verify",
    "api5.yubico.com/wsapi/2.0/verify",
];

/// Configuration consumed by [`Validator::new`](crate::Validator::new).
///
/// All fields are immutable for the lifetime of the validator. The struct
/// deserializes with `serde`, so a host application can embed it in its own
/// configuration file; required fields are validated at construction, not
/// at deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Client id issued by the validation service. Required.
    pub client_id: String,
    /// Shared API secret, base64-encoded. Required.
    pub secret_key: String,
    /// Use `https://` for validation requests.
    pub https: bool,
    /// Verify server TLS certificates.
    pub verify_certs: bool,
    /// Validation server endpoints, scheme-less.
    pub servers: Vec<String>,
    /// User-agent header sent with every request.
    pub user_agent: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        ValidatorConfig {
            client_id: String::new(),
            secret_key: String::new(),
            https: true,
            verify_certs: true,
            servers: DEFAULT_SERVERS.iter().map(|s| s.to_string()).collect(),
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ValidatorConfig {
    /// Config with the given credentials and the default server list.
    pub fn new(client_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        ValidatorConfig {
            client_id: client_id.into(),
            secret_key: secret_key.into(),
            ..Self::default()
        }
    }

    /// Replace the server list.
    pub fn with_servers(mut self, servers: Vec<String>) -> Self {
        self.servers = servers;
        self
    }

    /// Switch between `https://` and `http://` request URLs.
    pub fn with_https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }
}

/// Base64-decoded shared secret; wiped from memory on drop.
pub(crate) struct SecretKey(Vec<u8>);

impl SecretKey {
    pub(crate) fn decode(base64: &str) -> Result<Self, ConfigError> {
        if base64.is_empty() {
            return Err(ConfigError::MissingSecretKey);
        }
        Ok(SecretKey(BASE64.decode(base64.as_bytes())?))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
