//! Retrying request executor.

use std::time::Duration;

use url::Url;

use crate::{
    Clock, Exchange, ExchangeError, Failure, LogSink, Request, Response, RetryPolicy,
    TransportError,
};

/// Smallest per-attempt timeout a [`Transport`] runs with. It is also the
/// shortest wait between retries after connection and HTTP errors.
pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Settings shared by every request a [`Transport`] executes.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Scheme and host the request paths are resolved against.
    pub base_url: String,
    /// Per-attempt timeout, also the wait after connection and HTTP errors.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub log: LogSink,
}

impl TransportOptions {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(60),
            retry: RetryPolicy::Unbounded,
            log: LogSink::disabled(),
        }
    }
}

/// Executes requests against a single host, retrying transient failures.
///
/// Each attempt is written to the log sink: the URL being fetched, then the
/// status code or the failure. Successful bodies are returned with HTML
/// entities decoded.
pub struct Transport<E, C> {
    exchange: E,
    clock: C,
    options: TransportOptions,
}

impl<E: Exchange, C: Clock> Transport<E, C> {
    /// Timeouts below [`MIN_TIMEOUT`] are raised to it.
    pub fn new(exchange: E, clock: C, mut options: TransportOptions) -> Self {
        if options.timeout < MIN_TIMEOUT {
            tracing::warn!(
                requested = ?options.timeout,
                "Timeout below {:?}, using the minimum",
                MIN_TIMEOUT
            );
            options.timeout = MIN_TIMEOUT;
        }
        Self {
            exchange,
            clock,
            options,
        }
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    fn log(&self, message: &str) {
        self.options.log.record(self.clock.now(), message);
    }

    fn resolve(&self, request: &Request) -> Result<Url, TransportError> {
        let raw = format!("{}{}", self.options.base_url, request.path);
        let mut url = Url::parse(&raw).map_err(|source| TransportError::InvalidUrl {
            url: raw.clone(),
            source,
        })?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }

    /// Sends `request` until it succeeds or the retry policy gives up.
    pub async fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        let url = self.resolve(request)?;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match request.form_summary() {
                Some(form) => self.log(&format!("Downloading: {} {}", url, form)),
                None => self.log(&format!("Downloading: {}", url)),
            }
            tracing::debug!(method = %request.method, url = %url, attempt, "sending request");

            let failure = match self
                .exchange
                .send(&url, request, self.options.timeout)
                .await
            {
                Ok(raw) => {
                    self.log(&format!("Status code: {}", raw.status));
                    if raw.is_success() {
                        let body = html_escape::decode_html_entities(&raw.body).into_owned();
                        if request.xhr {
                            self.log(&body);
                        }
                        return Ok(Response {
                            status: raw.status,
                            body,
                            cookies: raw.cookies,
                        });
                    }
                    self.log("HTTPError");
                    Failure::Status(raw.status)
                }
                Err(ExchangeError::Timeout) => {
                    self.log("Read timed out");
                    Failure::Timeout
                }
                Err(ExchangeError::Connection(message)) => {
                    self.log("Connection aborted");
                    Failure::Connection(message)
                }
                Err(ExchangeError::Fatal(message)) => {
                    tracing::error!(url = %url, "Request could not be sent: {}", message);
                    return Err(TransportError::Request {
                        url: url.to_string(),
                        message,
                    });
                }
            };

            match self
                .options
                .retry
                .next_delay(attempt, &failure, self.options.timeout)
            {
                Some(delay) => {
                    tracing::warn!(
                        url = %url,
                        attempt,
                        "{}, retrying in {:.1}s",
                        failure,
                        delay.as_secs_f64()
                    );
                    if !delay.is_zero() {
                        self.clock.sleep(delay).await;
                    }
                }
                None => {
                    tracing::error!(url = %url, attempts = attempt, "Giving up: {}", failure);
                    return Err(TransportError::Exhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        last: failure.to_string(),
                    });
                }
            }
        }
    }
}
