//! Session-aware client for the relative-finder pages of a genetic testing
//! service that has no public API.
//!
//! Layers, leaf first:
//! - [`relfinder_api`]: retrying HTTP transport
//! - [`session`]: login, cookie handling and silent re-authentication
//! - [`decode`]: extraction of JSON and HTML fragments from page bodies
//! - [`client`]: one typed operation per page or endpoint

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod session;
pub mod types;

pub use relfinder_api;
pub use relfinder_api::{LogSink, RetryPolicy};

pub use client::{profile_pairs, Client, PairwiseSweep};
pub use config::{Credentials, SessionConfig};
pub use error::Error;
pub use session::{Session, SessionCookies};
pub use types::{
    AccountMetadata, Gender, InheritanceView, MatchRecord, PairwiseSegmentRecord, ProfilePair,
    ProfileRecord,
};
