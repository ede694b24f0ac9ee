//! Error types for the transport layer.

/// Why a single HTTP attempt did not produce a response.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// The server did not answer within the request timeout.
    #[error("read timed out")]
    Timeout,
    /// The connection could not be established or was dropped (refused, reset, DNS).
    #[error("connection aborted: {0}")]
    Connection(String),
    /// The request itself could not be built; retrying will not help.
    #[error("request could not be sent: {0}")]
    Fatal(String),
}

/// Errors surfaced by [`crate::Transport`].
///
/// Transient failures never show up here under the unbounded retry policy;
/// they are absorbed by the retry loop.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// The base URL and request path did not form a valid URL.
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// The underlying HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
    /// The request was rejected before reaching the network.
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
    /// A bounded retry policy gave up.
    #[error("giving up on {url} after {attempts} attempts (last failure: {last})")]
    Exhausted {
        url: String,
        attempts: u32,
        last: String,
    },
}
