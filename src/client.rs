//! Concurrent validation client.

use std::sync::Mutex;

use log::{debug, warn};
use tokio::task::JoinSet;

use crate::config::{SecretKey, ValidatorConfig};
use crate::error::{ConfigError, Result};
use crate::otp::ParsedOtp;
use crate::outcome::Outcome;
use crate::pool::ServerPool;
use crate::request::{VerifyOptions, VerifyRequest};
use crate::response::ParsedResponse;

/// OTP validation client for a federation of redundant servers.
///
/// Holds immutable configuration and a shared HTTP client; every
/// [`verify`](Validator::verify) call is self-contained. The last-query and
/// last-response diagnostics are written once per call, so do not read them
/// while a call on the same instance is still in flight.
pub struct Validator {
    config: ValidatorConfig,
    key: SecretKey,
    http: reqwest::Client,
    last_query: Mutex<Option<String>>,
    last_response: Mutex<Option<String>>,
}

impl Validator {
    /// Build a validator from configuration.
    ///
    /// Fails fast on a missing client id, a missing or undecodable secret,
    /// or an `https` configuration when the crate was built without TLS.
    pub fn new(config: ValidatorConfig) -> std::result::Result<Self, ConfigError> {
        if config.client_id.is_empty() {
            return Err(ConfigError::MissingClientId);
        }
        let key = SecretKey::decode(&config.secret_key)?;

        if config.https && cfg!(not(feature = "tls")) {
            return Err(ConfigError::TlsUnsupported);
        }

        let builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        #[cfg(feature = "tls")]
        let builder = if config.verify_certs {
            builder
        } else {
            builder.danger_accept_invalid_certs(true)
        };
        let http = builder.build()?;

        Ok(Validator {
            config,
            key,
            http,
            last_query: Mutex::new(None),
            last_response: Mutex::new(None),
        })
    }

    /// Verify a token with default options.
    ///
    /// Succeeds only for a verified `OK` answer. A replayed OTP, a verified
    /// rejection, a parse failure and an unanswered call are each distinct
    /// error kinds.
    pub async fn verify(&self, token: &str) -> Result<()> {
        self.verify_with(token, &VerifyOptions::default()).await
    }

    /// Verify a token with explicit options.
    pub async fn verify_with(&self, token: &str, options: &VerifyOptions) -> Result<()> {
        let parsed = ParsedOtp::parse(token)?;
        let request = VerifyRequest::new(
            &self.config.client_id,
            &parsed.otp,
            self.key.as_bytes(),
            options,
        );
        self.dispatch(&request, options).await.into_result()
    }

    /// The full set of URLs queried by the most recent call, space-joined.
    pub fn last_query(&self) -> Option<String> {
        self.last_query.lock().expect("last query poisoned").clone()
    }

    /// The raw response text retained by the most recent call. In
    /// wait-for-all mode this is every successful body, each tagged with
    /// its source URL.
    pub fn last_response(&self) -> Option<String> {
        self.last_response
            .lock()
            .expect("last response poisoned")
            .clone()
    }

    /// Issue one request per configured endpoint and resolve an outcome.
    ///
    /// Race mode returns on the first verified answer and aborts the other
    /// requests; wait-for-all lets every request finish first. Transport
    /// failures and unauthenticated responses never end the race, they are
    /// logged and skipped.
    async fn dispatch(&self, request: &VerifyRequest, options: &VerifyOptions) -> Outcome {
        let scheme = if self.config.https { "https" } else { "http" };

        let mut pool = ServerPool::new(self.config.servers.clone());
        pool.reset();

        let mut tasks: JoinSet<(String, reqwest::Result<String>)> = JoinSet::new();
        let mut urls = Vec::new();
        while let Some(endpoint) = pool.next_endpoint() {
            let url = format!("{scheme}://{endpoint}?{}", request.query());
            let mut http_request = self.http.get(&url);
            if let Some(timeout) = options.timeout {
                http_request = http_request.timeout(timeout);
            }
            urls.push(url.clone());
            tasks.spawn(async move {
                let result = match http_request
                    .send()
                    .await
                    .and_then(|response| response.error_for_status())
                {
                    Ok(response) => response.text().await,
                    Err(err) => Err(err),
                };
                (url, result)
            });
        }

        *self.last_query.lock().expect("last query poisoned") = Some(urls.join(" "));
        *self.last_response.lock().expect("last response poisoned") = None;

        let outcome = match options.timeout {
            Some(limit) => tokio::time::timeout(limit, self.drain(&mut tasks, request, options))
                .await
                .unwrap_or(Outcome::NoAnswer),
            None => self.drain(&mut tasks, request, options).await,
        };

        // Cancel anything still in flight; a request that completes after
        // this point is discarded, not acted upon.
        tasks.abort_all();
        outcome
    }

    async fn drain(
        &self,
        tasks: &mut JoinSet<(String, reqwest::Result<String>)>,
        request: &VerifyRequest,
        options: &VerifyOptions,
    ) -> Outcome {
        // First verified OK/REPLAYED_OTP across all servers, and the first
        // verified rejection as the fallback verdict.
        let mut verdict: Option<Outcome> = None;
        let mut rejection: Option<Outcome> = None;

        while let Some(joined) = tasks.join_next().await {
            let (url, result) = match joined {
                Ok(completed) => completed,
                Err(err) => {
                    debug!("request task failed: {err}");
                    continue;
                }
            };
            let body = match result {
                Ok(body) => body,
                Err(err) => {
                    debug!("validation request to {url} failed: {err}");
                    continue;
                }
            };

            if options.wait_for_all {
                self.append_response(&format!("URL={url}\n{body}\n"));
            }

            let response = ParsedResponse::parse(&body);
            let Some(status) = response.status() else {
                debug!("response from {url} has no status, ignoring");
                continue;
            };
            if !response.authenticates(request, self.key.as_bytes()) {
                warn!("response from {url} failed authentication, ignoring");
                continue;
            }

            let outcome = Outcome::from_status(status);
            if !options.wait_for_all {
                // Any verified answer is terminal in race mode.
                self.set_response(body);
                return outcome;
            }
            if outcome.is_authoritative() {
                verdict.get_or_insert(outcome);
            } else {
                rejection.get_or_insert(outcome);
            }
        }

        verdict.or(rejection).unwrap_or(Outcome::NoAnswer)
    }

    fn set_response(&self, body: String) {
        *self.last_response.lock().expect("last response poisoned") = Some(body);
    }

    fn append_response(&self, chunk: &str) {
        let mut guard = self.last_response.lock().expect("last response poisoned");
        guard.get_or_insert_with(String::new).push_str(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_client_id() {
        let config = ValidatorConfig::new("", "c2VjcmV0");
        assert!(matches!(
            Validator::new(config),
            Err(ConfigError::MissingClientId)
        ));
    }

    #[test]
    fn rejects_missing_secret_key() {
        let config = ValidatorConfig::new("87", "");
        assert!(matches!(
            Validator::new(config),
            Err(ConfigError::MissingSecretKey)
        ));
    }

    #[test]
    fn rejects_malformed_secret_key() {
        let config = ValidatorConfig::new("87", "!!not base64!!");
        assert!(matches!(
            Validator::new(config),
            Err(ConfigError::InvalidSecretKey(_))
        ));
    }

    #[test]
    fn builds_with_valid_config() {
        let config = ValidatorConfig::new("87", "c2VjcmV0").with_https(false);
        assert!(Validator::new(config).is_ok());
    }

    #[cfg(feature = "tls")]
    #[test]
    fn builds_with_https_when_tls_enabled() {
        let config = ValidatorConfig::new("87", "c2VjcmV0");
        assert!(Validator::new(config).is_ok());
    }

    #[cfg(not(feature = "tls"))]
    #[test]
    fn https_without_tls_support_fails_fast() {
        let config = ValidatorConfig::new("87", "c2VjcmV0");
        assert!(matches!(
            Validator::new(config),
            Err(ConfigError::TlsUnsupported)
        ));
    }
}
