//! Runtime configuration, read from the environment or built in code.

use std::fmt;
use std::time::Duration;

use relfinder_api::{LogSink, RetryPolicy, TransportOptions, MIN_TIMEOUT};

use crate::Error;

pub const DEFAULT_BASE_URL: &str = "https://www.23andme.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Account credentials, fixed for the lifetime of a session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub base_url: String,
    pub credentials: Credentials,
    /// Per-request timeout and the wait after connection or HTTP errors.
    pub timeout: Duration,
    /// Write every attempt to the log sink.
    pub verbose: bool,
    pub retry: RetryPolicy,
}

impl SessionConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials,
            timeout: DEFAULT_TIMEOUT,
            verbose: false,
            retry: RetryPolicy::Unbounded,
        }
    }

    /// Reads `RELFINDER_*` variables from the process environment, after
    /// loading a `.env` file from the working directory if there is one.
    pub fn from_env() -> Result<Self, Error> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(Error::Config(format!("failed to read .env: {}", e)));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; `from_env` with a pluggable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::Config(format!("{} is not set", key)))
        };
        let credentials = Credentials::new(
            required("RELFINDER_USERNAME")?,
            required("RELFINDER_PASSWORD")?,
        );

        let mut config = Self::new(credentials);
        if let Some(base_url) = lookup("RELFINDER_BASE_URL").filter(|v| !v.is_empty()) {
            config.base_url = base_url;
        }
        config.timeout = Duration::from_secs(parse_u64(&lookup, "RELFINDER_TIMEOUT_SECS", 60)?);
        config.verbose = lookup("RELFINDER_VERBOSE")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        let max_attempts = parse_u64(&lookup, "RELFINDER_RETRY_MAX", 0)?;
        if max_attempts > 0 {
            config.retry = RetryPolicy::Bounded {
                max_attempts: u32::try_from(max_attempts)
                    .map_err(|_| Error::Config("RELFINDER_RETRY_MAX is too large".into()))?,
                base_delay: Duration::from_millis(parse_u64(
                    &lookup,
                    "RELFINDER_RETRY_BASE_MS",
                    2000,
                )?),
                max_delay: Duration::from_millis(parse_u64(
                    &lookup,
                    "RELFINDER_RETRY_MAX_MS",
                    30000,
                )?),
            };
        }
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the transport cannot honour.
    pub fn validate(&self) -> Result<(), Error> {
        if self.timeout < MIN_TIMEOUT {
            return Err(Error::Config(format!(
                "timeout must be at least {}s, got {:?}",
                MIN_TIMEOUT.as_secs(),
                self.timeout
            )));
        }
        Ok(())
    }

    /// Transport settings for this config. Verbose runs write to `sink`;
    /// otherwise nothing is logged.
    pub fn transport_options(&self, sink: LogSink) -> TransportOptions {
        let mut options = TransportOptions::new(&self.base_url);
        options.timeout = self.timeout;
        options.retry = self.retry.clone();
        options.log = if self.verbose { sink } else { LogSink::disabled() };
        options
    }
}

fn parse_u64<F>(lookup: &F, key: &str, default: u64) -> Result<u64, Error>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} must be a whole number, got {:?}", key, raw))),
        None => Ok(default),
    }
}
