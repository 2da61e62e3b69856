//! Validation request construction and signing.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use data_encoding::{BASE64, HEXLOWER};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// How many servers must have synced before a server answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncLevel {
    /// Percentage of servers, 0-100.
    Percent(u8),
    Fast,
    Secure,
}

impl fmt::Display for SyncLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncLevel::Percent(p) => write!(f, "{p}"),
            SyncLevel::Fast => f.write_str("fast"),
            SyncLevel::Secure => f.write_str("secure"),
        }
    }
}

/// Per-call options for [`Validator::verify_with`](crate::Validator::verify_with).
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Ask servers to echo timestamp and session counters in the response.
    pub timestamp: bool,
    /// Wait for every server to answer instead of racing to the first verdict.
    pub wait_for_all: bool,
    /// Desired sync level, forwarded as the `sl` parameter.
    pub sync_level: Option<SyncLevel>,
    /// Maximum wait for responses; also forwarded to the servers as the
    /// `timeout` parameter, but always applied at the transport layer since
    /// a validation server cannot be trusted to honor the hint.
    pub timeout: Option<Duration>,
}

/// A signed validation request ready for dispatch.
///
/// The parameter map is kept alongside the serialized query so responses
/// can later be cross-checked against what was actually sent.
#[derive(Debug, Clone)]
pub struct VerifyRequest {
    params: BTreeMap<String, String>,
    query: String,
}

impl VerifyRequest {
    /// Build and sign a request for `otp`.
    ///
    /// Parameters are serialized in lexicographic key order. When `key` is
    /// non-empty, an HMAC-SHA1 signature over that canonical string is
    /// appended as `h`; the signature itself is never part of the signed
    /// content.
    pub fn new(client_id: &str, otp: &str, key: &[u8], options: &VerifyOptions) -> Self {
        let mut params = BTreeMap::new();
        params.insert("id".to_owned(), client_id.to_owned());
        params.insert("otp".to_owned(), otp.to_owned());
        params.insert("nonce".to_owned(), generate_nonce());

        if options.timestamp {
            params.insert("timestamp".to_owned(), "1".to_owned());
        }
        if let Some(sl) = options.sync_level {
            params.insert("sl".to_owned(), sl.to_string());
        }
        if let Some(timeout) = options.timeout {
            params.insert("timeout".to_owned(), timeout.as_secs().to_string());
        }

        // BTreeMap iteration order is the canonical (lexicographic) order.
        let canonical = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let query = if key.is_empty() {
            canonical
        } else {
            let signature = escape_plus(&sign(key, &canonical));
            format!("{canonical}&h={signature}")
        };

        Self { params, query }
    }

    /// The canonical query string, including the `h` signature when signed.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// A parameter as it was sent, by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// The OTP this request asks to validate.
    pub fn otp(&self) -> &str {
        self.param("otp").unwrap_or_default()
    }

    /// The per-request nonce.
    pub fn nonce(&self) -> &str {
        self.param("nonce").unwrap_or_default()
    }
}

/// HMAC-SHA1 over `message`, base64-encoded.
pub(crate) fn sign(key: &[u8], message: &str) -> String {
    let mut mac = HmacSha1::new_from_slice(key).expect("hmac accepts keys of any length");
    mac.update(message.as_bytes());
    BASE64.encode(&mac.finalize().into_bytes())
}

/// Escape `+` so the signature survives URL transmission intact.
fn escape_plus(signature: &str) -> String {
    signature.replace('+', "%2B")
}

/// 16 bytes from the OS CSPRNG, hex-encoded. Unique per call.
fn generate_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    HEXLOWER.encode(&bytes)
}
