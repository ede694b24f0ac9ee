//! Error type for the session and endpoint layers.

use relfinder_api::TransportError;

/// Errors surfaced to callers of [`crate::Client`].
///
/// Transient network failures and session expiry never appear here; the
/// transport and session absorb them.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// A required anchor was missing from an otherwise successful page.
    #[error("{page}: {anchor} not found, the page layout may have changed")]
    StructuralExtraction {
        page: &'static str,
        anchor: &'static str,
    },
    /// Sign-in answered but did not hand out the expected cookies.
    #[error("login response is missing cookies: {}", .missing.join(", "))]
    Authentication { missing: Vec<&'static str> },
    /// An anchor was found but what it delimits could not be decoded.
    #[error("{page}: malformed {what}: {reason}")]
    MalformedData {
        page: &'static str,
        what: &'static str,
        reason: String,
    },
    /// The replay after a fresh login was rejected as well.
    #[error("session rejected again after re-login on {path}")]
    SessionRejected { path: String },
    #[error("invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn malformed(page: &'static str, what: &'static str, reason: impl ToString) -> Self {
        Self::MalformedData {
            page,
            what,
            reason: reason.to_string(),
        }
    }
}
