//! Yubico OTP validation against a federation of redundant servers.
//!
//! This crate provides functionality for:
//! - Parsing raw OTP tokens (modhex and Dvorak keyboard encodings)
//! - Building and HMAC-SHA1-signing validation requests
//! - Dispatching requests concurrently to every configured server and
//!   racing to the first authoritative verdict
//! - Cryptographically verifying a server's answer before trusting it
//!
//! # Protocol
//!
//! Each call sends `GET <scheme>://<server>?id=..&nonce=..&otp=..[&h=..]`
//! with query keys in lexicographic order and an HMAC-SHA1 signature over
//! them. Servers answer with newline-delimited `key=value` lines carrying
//! a `status` and their own signature. Only a response whose echoed OTP
//! and nonce match what was sent, and whose signature verifies, may settle
//! the call.
//!
//! # Example
//!
//! ```no_run
//! use yubico_validator::{Validator, ValidatorConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ValidatorConfig::new("87", "bXkgYXBpIHNlY3JldA==");
//! let validator = Validator::new(config)?;
//!
//! // Ok(()) only for a verified status=OK answer; a replayed OTP, a
//! // rejection and an unanswered call are distinct error kinds.
//! validator.verify("ccccccbcgujhingjrdejhgfnuetrgigvejhhgbkugded").await?;
//! # Ok(())
//! # }
//! ```
//!
//! The validator is stateless across calls apart from the last-query and
//! last-response diagnostics.

mod client;
mod config;
mod error;
mod otp;
mod outcome;
mod pool;
mod request;
mod response;

// Public re-exports
pub use client::Validator;
pub use config::{DEFAULT_SERVERS, ValidatorConfig};
pub use error::{ConfigError, Result, VerifyError};
pub use otp::{DEFAULT_DELIMITER, ParsedOtp};
pub use outcome::Outcome;
pub use pool::ServerPool;
pub use request::{SyncLevel, VerifyOptions, VerifyRequest};
pub use response::ParsedResponse;
