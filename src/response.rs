//! Server response parsing and authentication.

use std::collections::BTreeMap;

use subtle::ConstantTimeEq;

use crate::request::{self, VerifyRequest};

/// Response fields covered by the signature, in lexicographic order.
const SIGNED_FIELDS: [&str; 9] = [
    "nonce",
    "otp",
    "sessioncounter",
    "sessionuse",
    "sl",
    "status",
    "t",
    "timeout",
    "timestamp",
];

/// Length of the device public identity within an OTP.
const IDENTITY_LEN: usize = 12;

/// Key/value fields parsed from a raw server response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    fields: BTreeMap<String, String>,
}

impl ParsedResponse {
    /// Parse a newline-delimited `key=value` body (`\r\n` or `\n`).
    ///
    /// Values may themselves contain `=` (base64 signatures do), so each
    /// line splits on the first `=` only.
    pub fn parse(body: &str) -> Self {
        let mut fields = BTreeMap::new();
        for line in body.trim().lines() {
            if let Some((key, value)) = line.split_once('=') {
                fields.insert(key.to_owned(), value.trim_end().to_owned());
            }
        }
        ParsedResponse { fields }
    }

    /// A response field by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The server's status code, when present.
    pub fn status(&self) -> Option<&str> {
        self.field("status")
    }

    /// The device public identity: the first 12 chars of the echoed OTP.
    pub fn identity(&self) -> Option<&str> {
        self.field("otp")
            .map(|otp| otp.get(..IDENTITY_LEN).unwrap_or(otp))
    }

    /// Whether this response is an authentic answer to `sent`.
    ///
    /// The echoed `otp` and `nonce` must match the sent values exactly,
    /// defending against cross-talk and response injection. When `key` is
    /// non-empty the server signature over the canonical field set must
    /// verify as well; when it is empty the status is trusted directly.
    pub fn authenticates(&self, sent: &VerifyRequest, key: &[u8]) -> bool {
        if self.field("otp") != Some(sent.otp()) || self.field("nonce") != Some(sent.nonce()) {
            return false;
        }
        if key.is_empty() {
            return true;
        }
        let Some(signature) = self.field("h") else {
            return false;
        };
        let expected = request::sign(key, &self.signed_payload());
        expected.as_bytes().ct_eq(signature.as_bytes()).into()
    }

    /// Canonical `key=value&...` string over the signed fields present.
    fn signed_payload(&self) -> String {
        SIGNED_FIELDS
            .iter()
            .filter_map(|&name| self.fields.get(name).map(|value| format!("{name}={value}")))
            .collect::<Vec<_>>()
            .join("&")
    }
}
