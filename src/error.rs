//! Error types for OTP validation.

use thiserror::Error;

/// Errors raised while constructing a [`Validator`](crate::Validator).
///
/// These are fatal configuration problems, never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Client id is missing or empty.
    #[error("client id is missing or empty")]
    MissingClientId,

    /// Shared secret key is missing or empty.
    #[error("secret key is missing or empty")]
    MissingSecretKey,

    /// Shared secret key is not valid base64.
    #[error("secret key is not valid base64: {0}")]
    InvalidSecretKey(#[from] data_encoding::DecodeError),

    /// HTTPS was requested but the crate was built without the `tls` feature.
    #[error("https requested without TLS support")]
    TlsUnsupported,

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors returned by a single verification call.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The token does not match either supported keyboard alphabet.
    #[error("could not parse OTP token")]
    BadOtp,

    /// A server gave a verified answer: the OTP was already used once.
    #[error("OTP was replayed")]
    ReplayedOtp,

    /// A server gave a verified answer with the given non-OK status.
    #[error("validation rejected: {0}")]
    Rejected(String),

    /// No server produced a verified authoritative answer.
    #[error("no valid answer from any validation server")]
    NoValidAnswer,
}

/// Result type alias for verification calls.
pub type Result<T> = std::result::Result<T, VerifyError>;
